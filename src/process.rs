//! OS process access: resolving a name pattern to a handle, reading its
//! cumulative CPU counters and killing it.
//!
//! Everything above this module works against [`ProcessHandle`] and
//! [`ProcessResolver`] so the sampler and the HTTP handlers can be driven by
//! fakes in tests.

use regex::Regex;
use sysinfo::{Pid, System};
use tracing::debug;

use crate::error::{QueryError, ResolveError, TerminateError};

/// Cumulative CPU time consumed since process start, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuTimes {
    pub user: f64,
    pub system: f64,
}

impl CpuTimes {
    pub fn new(user: f64, system: f64) -> Self {
        Self { user, system }
    }
}

/// Capability over a single OS process.
pub trait ProcessHandle: Send {
    fn pid(&self) -> u32;

    fn cpu_times(&self) -> Result<CpuTimes, QueryError>;

    fn terminate(&self) -> Result<(), TerminateError>;
}

pub trait ProcessResolver: Send + Sync {
    /// Returns a handle to the first process whose name matches `pattern`.
    fn resolve(&self, pattern: &str) -> Result<Box<dyn ProcessHandle>, ResolveError>;
}

/// Handle backed by `/proc/<pid>/stat`.
#[derive(Debug, Clone)]
pub struct ProcHandle {
    pid: Pid,
}

impl ProcHandle {
    pub fn new(pid: u32) -> Self {
        Self {
            pid: Pid::from_u32(pid),
        }
    }
}

impl ProcessHandle for ProcHandle {
    fn pid(&self) -> u32 {
        self.pid.as_u32()
    }

    #[cfg(target_os = "linux")]
    fn cpu_times(&self) -> Result<CpuTimes, QueryError> {
        let pid = self.pid.as_u32();
        let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid))?;
        parse_stat(&stat, clock_ticks()).ok_or(QueryError::Malformed(pid))
    }

    #[cfg(not(target_os = "linux"))]
    fn cpu_times(&self) -> Result<CpuTimes, QueryError> {
        Err(QueryError::Unsupported)
    }

    fn terminate(&self) -> Result<(), TerminateError> {
        let pid = self.pid.as_u32();
        let mut sys = System::new();
        if !sys.refresh_process(self.pid) {
            return Err(TerminateError::Exited(pid));
        }
        match sys.process(self.pid) {
            Some(process) if process.kill() => Ok(()),
            Some(_) => Err(TerminateError::Refused(pid)),
            None => Err(TerminateError::Exited(pid)),
        }
    }
}

#[cfg(target_os = "linux")]
fn clock_ticks() -> f64 {
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as f64
    } else {
        100.0
    }
}

/// Extracts `utime` and `stime` (fields 14 and 15) from a stat line.
///
/// The command name in field 2 may itself contain spaces and parentheses,
/// so fields are counted from the last closing parenthesis.
pub fn parse_stat(stat: &str, clock_ticks: f64) -> Option<CpuTimes> {
    let rest = &stat[stat.rfind(')')? + 1..];
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // fields[0] is the state (field 3)
    let utime: u64 = fields.get(11)?.parse().ok()?;
    let stime: u64 = fields.get(12)?.parse().ok()?;
    Some(CpuTimes {
        user: utime as f64 / clock_ticks,
        system: stime as f64 / clock_ticks,
    })
}

/// Resolves name patterns against the live process table.
#[derive(Debug, Default)]
pub struct SysinfoResolver;

impl SysinfoResolver {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessResolver for SysinfoResolver {
    fn resolve(&self, pattern: &str) -> Result<Box<dyn ProcessHandle>, ResolveError> {
        let re = Regex::new(pattern)?;
        let mut sys = System::new();
        sys.refresh_processes();

        // lowest pid first so repeated lookups pick the same process
        let pid = sys
            .processes()
            .iter()
            .filter(|(_, process)| re.is_match(process.name()))
            .map(|(pid, _)| pid.as_u32())
            .min()
            .ok_or_else(|| ResolveError::NotFound(pattern.to_string()))?;

        debug!(pattern, pid, "resolved process");
        Ok(Box::new(ProcHandle::new(pid)))
    }
}
