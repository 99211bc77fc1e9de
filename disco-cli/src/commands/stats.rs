use crate::output::{OutputFormat, OutputFormatter};
use crate::utils::build_driver;
use disco_core::{Config, Result};
use serde::Serialize;
use tabled::Tabled;

#[derive(Tabled, Serialize)]
struct StatRow {
    #[tabled(rename = "Property")]
    property: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn execute(config: Config, format: OutputFormat) -> Result<()> {
    let driver = build_driver(config)?;
    let stats = driver.get_volume_stats(true).await;

    match format {
        OutputFormat::Table => {
            let rows = vec![
                StatRow {
                    property: "Backend",
                    value: stats.volume_backend_name.clone(),
                },
                StatRow {
                    property: "Protocol",
                    value: stats.storage_protocol.clone(),
                },
                StatRow {
                    property: "Driver version",
                    value: stats.driver_version.clone(),
                },
                StatRow {
                    property: "Vendor",
                    value: stats.vendor_name.clone(),
                },
                StatRow {
                    property: "Total capacity (GB)",
                    value: stats.total_capacity_gb.to_string(),
                },
                StatRow {
                    property: "Free capacity (GB)",
                    value: stats.free_capacity_gb.to_string(),
                },
                StatRow {
                    property: "Reserved (%)",
                    value: stats.reserved_percentage.to_string(),
                },
                StatRow {
                    property: "Updated",
                    value: stats.updated_at.to_rfc3339(),
                },
            ];
            println!("{}", format.format_table(rows));
        }
        _ => println!("{}", format.format(&stats)),
    }

    Ok(())
}
