//! Structured logging with scan context.
//!
//! Every log line emitted during a scan or lookup carries the scan id and,
//! once known, the batch id it concerns.

pub mod structured;

pub use structured::*;
