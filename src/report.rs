use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stats::CpuStats;

/// One completed sampling interval, split by CPU mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuSample {
    pub timestamp: DateTime<Utc>,
    pub user_cpu: f64,
    pub system_cpu: f64,
}

/// Final statistics for a tracker that has been stopped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopReport {
    pub message: String,
    pub median_cpu: f64,
    pub p95_cpu: f64,
    pub p99_cpu: f64,
    pub cpu_details: Vec<CpuSample>,
}

impl StopReport {
    pub fn new(name: &str, stats: CpuStats, cpu_details: Vec<CpuSample>) -> Self {
        Self {
            message: format!("Stopped process {}", name),
            median_cpu: stats.median,
            p95_cpu: stats.p95,
            p99_cpu: stats.p99,
            cpu_details,
        }
    }
}

/// Response to stopping a single named tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StopResponse {
    Stopped(StopReport),
    Inactive { error: String },
}

impl StopResponse {
    pub fn inactive(name: &str) -> Self {
        Self::Inactive {
            error: format!("Tracking is not active for {}", name),
        }
    }
}
