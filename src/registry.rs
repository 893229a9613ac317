use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{info, warn};

use crate::process::ProcessHandle;
use crate::tracker::Tracker;

/// The set of tracked processes, keyed by the name they were started with.
///
/// Every operation takes the same lock, so a sampling pass never sees an
/// entry that is half removed and a stop never sees one that is half updated.
#[derive(Debug, Default)]
pub struct TrackerRegistry {
    trackers: Mutex<HashMap<String, Tracker>>,
}

impl TrackerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Tracker>> {
        // Critical sections are plain map operations; the map stays usable
        // after a panicking visitor.
        self.trackers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts tracking `handle` under `name`, replacing any previous entry.
    pub fn add(&self, name: impl Into<String>, handle: Box<dyn ProcessHandle>) {
        let name = name.into();
        let pid = handle.pid();
        let tracker = Tracker::new(handle, Utc::now());
        if let Some(previous) = self.lock().insert(name.clone(), tracker) {
            warn!(process = %name, old_pid = previous.pid(), new_pid = pid, "replaced existing tracker");
        } else {
            info!(process = %name, pid, "tracking started");
        }
    }

    /// Removes and returns the tracker for `name`, or `None` if not tracked.
    pub fn remove(&self, name: &str) -> Option<Tracker> {
        let removed = self.lock().remove(name);
        if let Some(tracker) = &removed {
            info!(process = name, pid = tracker.pid(), "tracking stopped");
        }
        removed
    }

    /// Drains every tracker and asks each underlying process to terminate.
    ///
    /// Termination is best effort: failures are logged and otherwise ignored.
    pub fn remove_all(&self) -> HashMap<String, Tracker> {
        let drained = std::mem::take(&mut *self.lock());
        for (name, tracker) in &drained {
            match tracker.handle().terminate() {
                Ok(()) => info!(process = %name, pid = tracker.pid(), "tracking stopped, process terminated"),
                Err(e) => warn!(process = %name, pid = tracker.pid(), "failed to terminate process: {}", e),
            }
        }
        drained
    }

    /// Visits every tracker mutably while holding the registry lock.
    ///
    /// Returns the number of trackers visited.
    pub fn for_each<F>(&self, mut visit: F) -> usize
    where
        F: FnMut(&str, &mut Tracker),
    {
        let mut trackers = self.lock();
        for (name, tracker) in trackers.iter_mut() {
            visit(name, tracker);
        }
        trackers.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Names of all tracked processes, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
