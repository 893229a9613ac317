use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::metrics::Metrics;
use crate::process::CpuTimes;
use crate::registry::TrackerRegistry;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Periodically turns cumulative CPU counters of every tracked process into
/// utilization samples.
pub struct Sampler {
    registry: Arc<TrackerRegistry>,
    metrics: Metrics,
    interval: Duration,
}

impl Sampler {
    pub fn new(registry: Arc<TrackerRegistry>, metrics: Metrics, interval: Duration) -> Self {
        Self {
            registry,
            metrics,
            interval,
        }
    }

    /// Runs one sampling pass over every tracker, holding the registry lock
    /// for the whole pass. Returns the number of trackers visited.
    pub fn tick(&self, now: DateTime<Utc>) -> usize {
        let visited = self.registry.for_each(|name, tracker| {
            let times = tracker.handle().cpu_times().unwrap_or_else(|e| {
                debug!(process = name, pid = tracker.pid(), "cpu query failed: {}", e);
                CpuTimes::default()
            });
            if let Some(percent) = tracker.observe(times, now) {
                trace!(process = name, percent, "sample");
                self.metrics.record_sample(name, percent);
            }
        });
        self.metrics.set_tracked(visited);
        visited
    }

    /// Ticks until `cancel` fires.
    ///
    /// The sleep between ticks is fixed; a slow tick delays the next one.
    pub async fn run(self, cancel: CancellationToken) {
        info!(interval = ?self.interval, "sampler started");
        loop {
            self.tick(Utc::now());
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!("sampler stopped");
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
