//! Interval scheduler driving the report cycle
//!
//! Ticks are sequential: a slow tick delays the next one instead of
//! overlapping it.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::report_cycle::{CycleStatus, ReportCycle};

pub struct Scheduler {
    cycle: Arc<ReportCycle>,
    interval: Duration,
}

impl Scheduler {
    pub fn new(cycle: Arc<ReportCycle>, interval: Duration) -> Self {
        Self { cycle, interval }
    }

    /// Run until a shutdown signal arrives. The first tick fires immediately.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Scheduler started, {} cycle every {}s",
            self.cycle.period(),
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let outcome = self.cycle.run_tick(Utc::now()).await;
                    match outcome.status {
                        CycleStatus::Completed | CycleStatus::Disabled => {}
                        CycleStatus::PartialFailure => {
                            warn!("Report cycle degraded: {:?}", outcome.errors)
                        }
                        CycleStatus::Failed => {
                            error!("Report cycle failed: {:?}", outcome.errors)
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryObjectStore, ObjectStore, PlaceholderFeed};
    use crate::agents::{Governor, ObserverAgent, StructuralVerifier};
    use crate::persistence::ReportStore;
    use crate::supervisor::NotificationDispatcher;

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let store = Arc::new(InMemoryObjectStore::new());
        let governor = Arc::new(Governor::new(
            Vec::new(),
            store.clone(),
            Arc::new(StructuralVerifier::default()),
        ));
        let observer = Arc::new(ObserverAgent::new(
            Arc::new(PlaceholderFeed),
            chrono::Duration::hours(4),
            Duration::from_millis(100),
        ));
        let cycle = Arc::new(ReportCycle::new(
            true,
            "4h",
            governor,
            observer,
            ReportStore::new(store.clone()),
            Arc::new(NotificationDispatcher::new(Duration::from_millis(100))),
        ));
        let scheduler = Scheduler::new(cycle, Duration::from_secs(3600));

        let (tx, rx) = broadcast::channel(1);
        let handle = tokio::spawn(async move { scheduler.run(rx).await });
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        // The immediate first tick persisted a report.
        assert!(store.get("reports/latest.json").await.unwrap().is_some());
    }
}
