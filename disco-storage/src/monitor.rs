use crate::DiscoClient;
use disco_core::{DiscoError, OperationKind, OperationParams, Reply, Result, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Polls DISCO until a pending snapshot, restore or clone reaches a terminal
/// status, or until its timeout runs out.
///
/// Each call to [`monitor`](Self::monitor) owns its own polling state, so one
/// monitor can serve any number of concurrent operations.
pub struct OperationMonitor {
    client: Arc<dyn DiscoClient>,
    poll_interval: Duration,
}

impl OperationMonitor {
    pub fn new(client: Arc<dyn DiscoClient>, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Waits for the operation identified by `params` and returns the detail
    /// reply that reported success.
    pub async fn monitor(
        &self,
        kind: OperationKind,
        params: &OperationParams,
        timeout: Duration,
    ) -> Result<Reply> {
        MonitorState::new(kind, params, timeout, self.poll_interval)
            .run(self.client.as_ref(), None)
            .await
    }

    /// Same as [`monitor`](Self::monitor) for a kind given by its wire name.
    pub async fn monitor_named(
        &self,
        kind: &str,
        params: &OperationParams,
        timeout: Duration,
    ) -> Result<Reply> {
        let kind = kind.parse::<OperationKind>().inspect_err(|e| error!("{e}"))?;
        self.monitor(kind, params, timeout).await
    }

    /// Like [`monitor`](Self::monitor), but gives up early once `token` fires.
    pub async fn monitor_until_cancelled(
        &self,
        kind: OperationKind,
        params: &OperationParams,
        timeout: Duration,
        token: &CancellationToken,
    ) -> Result<Reply> {
        MonitorState::new(kind, params, timeout, self.poll_interval)
            .run(self.client.as_ref(), Some(token))
            .await
    }
}

/// Free-standing form of [`OperationMonitor::monitor`] with an explicit interval.
pub async fn monitor_operation(
    client: &dyn DiscoClient,
    kind: OperationKind,
    params: &OperationParams,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Reply> {
    MonitorState::new(kind, params, timeout, poll_interval)
        .run(client, None)
        .await
}

enum Poll {
    Done(Reply),
    Pending,
}

struct MonitorState<'a> {
    kind: OperationKind,
    params: &'a OperationParams,
    started: Instant,
    timeout: Duration,
    poll_interval: Duration,
    polls: u32,
}

impl<'a> MonitorState<'a> {
    fn new(
        kind: OperationKind,
        params: &'a OperationParams,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            kind,
            params,
            started: Instant::now(),
            timeout,
            poll_interval,
            polls: 0,
        }
    }

    async fn run(
        mut self,
        client: &dyn DiscoClient,
        cancel: Option<&CancellationToken>,
    ) -> Result<Reply> {
        self.check_params()?;

        if self.poll_interval.is_zero() {
            return Err(DiscoError::ConfigError(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        if self.poll_interval >= self.timeout {
            warn!(
                "Poll interval {:?} is not shorter than the {} timeout {:?}; at most one poll fits the budget",
                self.poll_interval, self.kind, self.timeout
            );
        }

        info!(
            "Monitoring {} every {:?} for up to {:?}",
            self.kind, self.poll_interval, self.timeout
        );

        // First tick lands one interval after entry, not immediately.
        let first_tick = self.started.checked_add(self.poll_interval).ok_or_else(|| {
            DiscoError::ConfigError(format!(
                "poll interval {:?} is too large",
                self.poll_interval
            ))
        })?;
        let mut ticker = interval_at(first_tick, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            self.wait_for_tick(&mut ticker, cancel).await?;

            self.polls += 1;
            let reply = client.query_detail(self.kind, self.params).await?;
            debug!("{} poll #{} reply: {:?}", self.kind, self.polls, reply);

            match self.interpret(reply)? {
                Poll::Done(reply) => {
                    info!(
                        "{} finished after {} polls in {:?}",
                        self.kind,
                        self.polls,
                        self.started.elapsed()
                    );
                    return Ok(reply);
                }
                Poll::Pending => {
                    // Checked only here, so a late success still counts.
                    let elapsed = self.started.elapsed();
                    if elapsed > self.timeout {
                        error!("Timeout while calling {} after {:?}", self.kind, elapsed);
                        return Err(DiscoError::OperationTimedOut {
                            kind: self.kind,
                            elapsed,
                            timeout: self.timeout,
                        });
                    }
                }
            }
        }
    }

    fn check_params(&self) -> Result<()> {
        for name in self.kind.required_params() {
            if self.params.get(name).is_none() {
                error!("Missing parameter {} for {}", name, self.kind);
                return Err(DiscoError::MissingParameter {
                    kind: self.kind,
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn wait_for_tick(
        &self,
        ticker: &mut Interval,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        let Some(token) = cancel else {
            ticker.tick().await;
            return Ok(());
        };

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                let elapsed = self.started.elapsed();
                warn!("Monitoring of {} cancelled after {:?}", self.kind, elapsed);
                Err(DiscoError::Cancelled {
                    kind: self.kind,
                    elapsed,
                })
            }
            _ = ticker.tick() => Ok(()),
        }
    }

    fn interpret(&self, reply: Reply) -> Result<Poll> {
        if !reply.is_accepted() {
            error!(
                "Error while getting {} details, returned code: {}",
                self.kind, reply.status
            );
            return Err(DiscoError::OperationQueryFailed {
                kind: self.kind,
                status: reply.status,
            });
        }

        if reply.payload.is_empty() {
            error!("{} query returned no result payload", self.kind);
            return Err(DiscoError::InvalidReply {
                operation: self.kind.to_string(),
                reason: "reply carries no result payload".to_string(),
            });
        }

        let field = self.kind.status_field();
        let code = field.extract(&reply).ok_or_else(|| {
            error!("{} reply has no readable status: {:?}", self.kind, reply);
            DiscoError::InvalidReply {
                operation: self.kind.to_string(),
                reason: format!("no status code at {field:?}"),
            }
        })?;

        match StatusCode::from_code(code) {
            Some(StatusCode::Success) => Ok(Poll::Done(reply)),
            Some(StatusCode::Failure) => {
                error!("{} reported failure: {:?}", self.kind, reply);
                Err(DiscoError::OperationFailed {
                    kind: self.kind,
                    payload: reply.payload_value(),
                })
            }
            Some(StatusCode::Ongoing) => Ok(Poll::Pending),
            None => {
                warn!(
                    "{} reported unrecognised status {}, treating as ongoing",
                    self.kind, code
                );
                Ok(Poll::Pending)
            }
        }
    }
}
