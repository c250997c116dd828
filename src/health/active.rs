//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every registered service
//! - Keep registry status fresh between forwarded requests

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::discovery::ServiceRegistry;
use crate::health::checker::HealthChecker;

pub struct HealthMonitor {
    registry: Arc<ServiceRegistry>,
    checker: HealthChecker,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(registry: Arc<ServiceRegistry>, checker: HealthChecker, interval: Duration) -> Self {
        Self {
            registry,
            checker,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Health monitor starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.checker.check_all(&self.registry).await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
