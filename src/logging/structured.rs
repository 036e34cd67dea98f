//! Structured logging utilities.
//!
//! Log lines are an upper-snake event name followed by `key=value` pairs,
//! prefixed with a [`LogContext`].

use std::fmt;

/// Logging context for a scan or single lookup.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub scan_id: String,
    pub batch_id: Option<u64>,
}

impl LogContext {
    pub fn new(scan_id: &str) -> Self {
        Self {
            scan_id: scan_id.to_string(),
            batch_id: None,
        }
    }

    pub fn with_batch(&self, batch_id: u64) -> Self {
        Self {
            scan_id: self.scan_id.clone(),
            batch_id: Some(batch_id),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.batch_id {
            Some(id) => write!(f, "[scan={}] [batch={}]", self.scan_id, id),
            None => write!(f, "[scan={}]", self.scan_id),
        }
    }
}

/// Initialize the process logger.
///
/// Defaults to `info`; `RUST_LOG` overrides. Safe to call more than once.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
