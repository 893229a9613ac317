use chrono::{DateTime, Utc};

use crate::process::{CpuTimes, ProcessHandle};
use crate::report::{CpuSample, StopReport};
use crate::stats::CpuStats;

/// Sampling state for one tracked process.
///
/// `usage` and `details` always have the same length: every accepted
/// observation appends to both.
pub struct Tracker {
    handle: Box<dyn ProcessHandle>,
    usage: Vec<f64>,
    details: Vec<CpuSample>,
    prev: CpuTimes,
    prev_sample_at: DateTime<Utc>,
    first_sample: bool,
}

impl Tracker {
    pub fn new(handle: Box<dyn ProcessHandle>, now: DateTime<Utc>) -> Self {
        Self {
            handle,
            usage: Vec::new(),
            details: Vec::new(),
            prev: CpuTimes::default(),
            prev_sample_at: now,
            first_sample: true,
        }
    }

    pub fn handle(&self) -> &dyn ProcessHandle {
        self.handle.as_ref()
    }

    pub fn pid(&self) -> u32 {
        self.handle.pid()
    }

    /// Combined CPU percentage per completed interval.
    pub fn usage(&self) -> &[f64] {
        &self.usage
    }

    pub fn details(&self) -> &[CpuSample] {
        &self.details
    }

    pub fn is_first_sample(&self) -> bool {
        self.first_sample
    }

    /// Records the counters observed at `now` and returns the combined
    /// utilization for the interval since the previous observation.
    ///
    /// Nothing is emitted for the first observation after creation, nor when
    /// no time has passed since the previous one. Negative deltas (counter
    /// reset, PID reuse, a failed query reported as zero) are kept as-is.
    pub fn observe(&mut self, times: CpuTimes, now: DateTime<Utc>) -> Option<f64> {
        let elapsed = (now - self.prev_sample_at)
            .num_microseconds()
            .map(|us| us as f64 / 1_000_000.0)
            .unwrap_or(0.0);

        let mut sample = None;
        if elapsed > 0.0 && !self.first_sample {
            let user_cpu = (times.user - self.prev.user) / elapsed * 100.0;
            let system_cpu = (times.system - self.prev.system) / elapsed * 100.0;
            let combined = user_cpu + system_cpu;
            self.usage.push(combined);
            self.details.push(CpuSample {
                timestamp: now,
                user_cpu,
                system_cpu,
            });
            sample = Some(combined);
        }

        self.first_sample = false;
        self.prev = times;
        self.prev_sample_at = now;
        sample
    }

    pub fn stats(&self) -> CpuStats {
        CpuStats::compute(&self.usage)
    }

    /// Consumes the tracker, draining its series into a final report.
    pub fn into_report(self, name: &str) -> StopReport {
        let stats = self.stats();
        StopReport::new(name, stats, self.details)
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("pid", &self.handle.pid())
            .field("samples", &self.usage.len())
            .field("prev", &self.prev)
            .field("prev_sample_at", &self.prev_sample_at)
            .field("first_sample", &self.first_sample)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{QueryError, TerminateError};
    use chrono::Duration;

    struct Idle;

    impl ProcessHandle for Idle {
        fn pid(&self) -> u32 {
            1
        }

        fn cpu_times(&self) -> Result<CpuTimes, QueryError> {
            Ok(CpuTimes::default())
        }

        fn terminate(&self) -> Result<(), TerminateError> {
            Ok(())
        }
    }

    fn tracker_at(now: DateTime<Utc>) -> Tracker {
        Tracker::new(Box::new(Idle), now)
    }

    #[test]
    fn first_observation_sets_baseline_only() {
        let t0 = Utc::now();
        let mut tracker = tracker_at(t0);

        let sample = tracker.observe(CpuTimes::new(10.0, 5.0), t0 + Duration::hours(1));

        assert_eq!(sample, None);
        assert!(tracker.usage().is_empty());
        assert!(tracker.details().is_empty());
        assert!(!tracker.is_first_sample());
    }

    #[test]
    fn delta_is_percent_of_one_cpu_second() {
        let t0 = Utc::now();
        let mut tracker = tracker_at(t0);
        tracker.observe(CpuTimes::new(10.0, 5.0), t0 + Duration::seconds(1));

        let sample = tracker.observe(CpuTimes::new(12.0, 6.0), t0 + Duration::seconds(2));

        assert_eq!(sample, Some(300.0));
        assert_eq!(tracker.usage(), &[300.0]);
        let detail = &tracker.details()[0];
        assert_eq!(detail.user_cpu, 200.0);
        assert_eq!(detail.system_cpu, 100.0);
        assert_eq!(detail.timestamp, t0 + Duration::seconds(2));
    }

    #[test]
    fn zero_or_negative_elapsed_drops_sample_but_updates_baseline() {
        let t0 = Utc::now();
        let mut tracker = tracker_at(t0);
        tracker.observe(CpuTimes::new(1.0, 1.0), t0 + Duration::seconds(1));

        assert_eq!(tracker.observe(CpuTimes::new(2.0, 2.0), t0 + Duration::seconds(1)), None);
        assert_eq!(tracker.observe(CpuTimes::new(3.0, 3.0), t0), None);
        assert!(tracker.usage().is_empty());

        // baseline moved to (3, 3) at t0
        let sample = tracker.observe(CpuTimes::new(3.5, 3.0), t0 + Duration::seconds(2));
        assert_eq!(sample, Some(25.0));
    }

    #[test]
    fn negative_delta_passes_through() {
        let t0 = Utc::now();
        let mut tracker = tracker_at(t0);
        tracker.observe(CpuTimes::new(4.0, 2.0), t0 + Duration::seconds(1));

        let sample = tracker.observe(CpuTimes::default(), t0 + Duration::seconds(2));

        assert_eq!(sample, Some(-600.0));
        assert_eq!(tracker.usage().len(), tracker.details().len());
    }

    #[test]
    fn report_of_untouched_tracker_is_empty() {
        let report = tracker_at(Utc::now()).into_report("idle");
        assert_eq!(report.message, "Stopped process idle");
        assert_eq!(report.median_cpu, 0.0);
        assert_eq!(report.p95_cpu, 0.0);
        assert_eq!(report.p99_cpu, 0.0);
        assert!(report.cpu_details.is_empty());
    }
}
