//! Fake process handles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpu_tracker::error::{QueryError, ResolveError, TerminateError};
use cpu_tracker::{CpuTimes, ProcessHandle, ProcessResolver};

/// Handle whose counters are set by the test through a [`FakeProcess`].
pub struct FakeHandle {
    pid: u32,
    process: FakeProcess,
}

#[derive(Clone, Default)]
pub struct FakeProcess {
    times: Arc<Mutex<Option<CpuTimes>>>,
    terminated: Arc<AtomicBool>,
    refuse_kill: Arc<AtomicBool>,
}

impl FakeProcess {
    pub fn new(user: f64, system: f64) -> Self {
        let process = Self::default();
        process.set_times(user, system);
        process
    }

    pub fn set_times(&self, user: f64, system: f64) {
        *self.times.lock().unwrap() = Some(CpuTimes::new(user, system));
    }

    /// Makes subsequent queries fail as if the process had exited.
    pub fn exit(&self) {
        *self.times.lock().unwrap() = None;
    }

    pub fn refuse_kill(&self) {
        self.refuse_kill.store(true, Ordering::SeqCst);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    pub fn handle(&self, pid: u32) -> Box<dyn ProcessHandle> {
        Box::new(FakeHandle {
            pid,
            process: self.clone(),
        })
    }
}

impl ProcessHandle for FakeHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn cpu_times(&self) -> Result<CpuTimes, QueryError> {
        (*self.process.times.lock().unwrap()).ok_or(QueryError::Malformed(self.pid))
    }

    fn terminate(&self) -> Result<(), TerminateError> {
        if self.process.refuse_kill.load(Ordering::SeqCst) {
            return Err(TerminateError::Refused(self.pid));
        }
        self.process.terminated.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Resolver over a fixed table of process names.
#[derive(Default)]
pub struct FakeResolver {
    processes: Mutex<HashMap<String, (u32, FakeProcess)>>,
}

impl FakeResolver {
    pub fn with(self, name: &str, pid: u32, process: FakeProcess) -> Self {
        self.processes
            .lock()
            .unwrap()
            .insert(name.to_string(), (pid, process));
        self
    }
}

impl ProcessResolver for FakeResolver {
    fn resolve(&self, pattern: &str) -> Result<Box<dyn ProcessHandle>, ResolveError> {
        let re = regex::Regex::new(pattern)?;
        let processes = self.processes.lock().unwrap();
        processes
            .iter()
            .filter(|(name, _)| re.is_match(name))
            .min_by_key(|(_, (pid, _))| *pid)
            .map(|(_, (pid, process))| process.handle(*pid))
            .ok_or_else(|| ResolveError::NotFound(pattern.to_string()))
    }
}
