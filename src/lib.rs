//! Per-process CPU tracking daemon.
//!
//! A background [`sampler::Sampler`] polls cumulative CPU counters of every
//! tracked process once per interval and turns them into utilization
//! percentages. The HTTP surface in [`server`] starts and stops tracking and
//! reports [`stats::CpuStats`] over the collected series.

pub mod config;
pub mod error;
pub mod metrics;
pub mod process;
pub mod registry;
pub mod report;
pub mod sampler;
pub mod server;
pub mod stats;
pub mod tracker;

pub use process::{CpuTimes, ProcessHandle, ProcessResolver};
pub use registry::TrackerRegistry;
pub use sampler::Sampler;
pub use stats::CpuStats;
pub use tracker::Tracker;
