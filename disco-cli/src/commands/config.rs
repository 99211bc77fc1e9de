use crate::commands::ConfigAction;
use crate::output::{OutputFormat, OutputFormatter, print_info, print_success, print_warning};
use disco_core::{Config, DiscoError, OperationKind, Result};
use std::path::PathBuf;

pub async fn execute(
    action: ConfigAction,
    config: Config,
    config_path: PathBuf,
    format: OutputFormat,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print_info(&format!("Configuration from {}", config_path.display()));
            match format {
                OutputFormat::Json => println!("{}", format.format(&config)),
                _ => println!("{}", OutputFormat::Yaml.format(&config)),
            }
        }
        ConfigAction::Init { rest_ip, force } => {
            if config_path.exists() && !force {
                return Err(DiscoError::ConfigError(format!(
                    "{} already exists, use --force to overwrite",
                    config_path.display()
                )));
            }

            let mut fresh = Config::default();
            fresh.client.rest_ip = rest_ip;
            fresh.save_to(&config_path)?;

            print_success(&format!("Wrote {}", config_path.display()));
        }
        ConfigAction::Check => {
            config.validate()?;

            let interval = config.monitor.poll_interval();
            for kind in OperationKind::ALL {
                if interval >= config.monitor.timeout_for(kind) {
                    print_warning(&format!(
                        "retry_interval is not shorter than the {kind} timeout"
                    ));
                }
            }

            print_success(&format!("{} is valid", config_path.display()));
        }
    }

    Ok(())
}
