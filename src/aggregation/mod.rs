//! Batch aggregation module.
//!
//! Rebuilds each batch's view-model from scattered sources:
//! - Batch record from the contract
//! - Off-chain metadata document
//! - Lab report from the contract, once verified
//!
//! Shared by all four portals. Per-item faults never abort a scan.

pub mod context;
pub mod filter;
pub mod scan;
pub mod view;

pub use context::*;
pub use filter::*;
pub use scan::*;
pub use view::*;
