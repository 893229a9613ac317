use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use cpu_tracker::{
    process::{CpuTimes, ProcessHandle, ProcessResolver, SysinfoResolver},
    Tracker,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Samples one process from the console and prints its CPU statistics
#[derive(Debug, Parser)]
#[command(name = "cpuwatch", version, about)]
struct Args {
    /// Regular expression matched against process names
    pattern: String,

    /// Seconds between samples
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Stop after this many samples
    #[arg(long, default_value_t = 10)]
    count: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let handle = SysinfoResolver::new().resolve(&args.pattern)?;
    let pid = handle.pid();
    println!("Sampling {} (pid {})", args.pattern, pid);

    let mut tracker = Tracker::new(handle, Utc::now());
    while tracker.usage().len() < args.count {
        std::thread::sleep(Duration::from_secs(args.interval));
        let times = tracker.handle().cpu_times().unwrap_or_else(|e| {
            debug!(pid, "cpu query failed: {}", e);
            CpuTimes::default()
        });
        if tracker.observe(times, Utc::now()).is_some() {
            if let Some(sample) = tracker.details().last() {
                println!(
                    "{}  user {:6.2}%  system {:6.2}%",
                    sample.timestamp.format("%H:%M:%S"),
                    sample.user_cpu,
                    sample.system_cpu
                );
            }
        }
    }

    let stats = tracker.stats();
    println!("median {:.2}%  p95 {:.2}%  p99 {:.2}%", stats.median, stats.p95, stats.p99);
    Ok(())
}
