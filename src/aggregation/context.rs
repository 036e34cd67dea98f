//! Scan context management.
//!
//! Provides the scan identity used in log lines and the soft-cancel flag a
//! view flips when it goes away.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;

/// Context for one range scan or single lookup.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub scan_id: String,
    pub started_at: DateTime<Utc>,
}

impl ScanContext {
    pub fn new() -> Self {
        Self {
            scan_id: format!("scan-{}", &Uuid::new_v4().to_string()[..8]),
            started_at: Utc::now(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.scan_id)
    }

    pub fn batch_context(&self, batch_id: u64) -> LogContext {
        self.log_context().with_batch(batch_id)
    }
}

impl Default for ScanContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Soft cancellation for a running scan.
///
/// Checked between items. An in-flight call finishes and the scan then
/// reports itself cancelled so the caller can drop its results.
#[derive(Debug, Clone, Default)]
pub struct ScanCancel(Arc<AtomicBool>);

impl ScanCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
