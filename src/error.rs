use thiserror::Error;

/// Failure to turn a name pattern into a live process handle.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("process matching pattern '{0}' not found")]
    NotFound(String),
}

/// Failure to read the cumulative CPU counters of a process.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to read process stats: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed stat line for pid {0}")]
    Malformed(u32),
    #[error("cpu time queries are not supported on this platform")]
    Unsupported,
}

#[derive(Debug, Error)]
pub enum TerminateError {
    #[error("process {0} has already exited")]
    Exited(u32),
    #[error("kill signal for process {0} was refused")]
    Refused(u32),
}
