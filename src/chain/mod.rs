//! Chain gateway module.
//!
//! Single point of contact with the HerbChain contract:
//! - Typed contract bindings generated from the deployed ABI
//! - Read gateway over a public endpoint
//! - Signing gateway over a wallet endpoint

pub mod contract;
pub mod gateway;
pub mod types;
pub mod wallet;

pub use gateway::*;
pub use types::*;
pub use wallet::*;
