//! Portal module.
//!
//! Data-flow contracts of the four role-based portals:
//! - Farmer: register a batch
//! - Lab: verification queue and lab findings
//! - Distributor: verified batches and dispatch
//! - Track: public single-batch lookup
//!
//! Each portal runs its own fresh scan or lookup, including after a write.

pub mod distributor;
pub mod farmer;
pub mod form;
pub mod lab;
pub mod track;

pub use distributor::*;
pub use farmer::*;
pub use lab::*;
pub use track::*;
