use prometheus::{Encoder, GaugeVec, IntCounter, IntGauge, Opts, Registry, TextEncoder};

/// Prometheus metrics for the tracker, kept in their own registry so several
/// instances can coexist in one process.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    tracked: IntGauge,
    cpu_percent: GaugeVec,
    samples: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let tracked = IntGauge::new(
            "cpu_tracker_tracked_processes",
            "Number of processes currently tracked",
        )?;
        let cpu_percent = GaugeVec::new(
            Opts::new(
                "cpu_tracker_process_cpu_percent",
                "Last combined user and system CPU utilization",
            ),
            &["name"],
        )?;
        let samples = IntCounter::new(
            "cpu_tracker_samples_total",
            "Utilization samples recorded across all trackers",
        )?;

        registry.register(Box::new(tracked.clone()))?;
        registry.register(Box::new(cpu_percent.clone()))?;
        registry.register(Box::new(samples.clone()))?;

        Ok(Self {
            registry,
            tracked,
            cpu_percent,
            samples,
        })
    }

    pub fn set_tracked(&self, count: usize) {
        self.tracked.set(count as i64);
    }

    pub fn record_sample(&self, name: &str, percent: f64) {
        self.cpu_percent.with_label_values(&[name]).set(percent);
        self.samples.inc();
    }

    pub fn forget(&self, name: &str) {
        // absent when the tracker was stopped before its first sample
        let _ = self.cpu_percent.remove_label_values(&[name]);
    }

    pub fn samples_recorded(&self) -> u64 {
        self.samples.get()
    }

    /// Renders all metrics in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
