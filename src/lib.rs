//! HerbTrace Core - Client core for the HerbChain supply-chain tracker
//!
//! Reads and writes herb batches through an externally deployed contract and
//! resolves their off-chain metadata from IPFS. The implementation keeps to:
//!
//! 1. **Fault isolation** - One bad batch never hides the others
//! 2. **Logging** - Every scan and write logged with its scan and batch id
//! 3. **Politeness** - Sequential, throttled reads against public endpoints
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `chain` - Contract bindings, read and signing gateways
//! - `extraction` - Metadata resolution and field normalization
//! - `aggregation` - Range scans and single lookups producing batch views
//! - `portal` - Farmer, lab, distributor and tracking data flows
//! - `storage` - Pinning service, image server and gateway URLs
//! - `config` - Deployment constants and endpoints
//! - `logging` - Structured logging with scan context

pub mod aggregation;
pub mod chain;
pub mod config;
pub mod error;
pub mod extraction;
pub mod logging;
pub mod portal;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregation::{BatchAggregator, BatchView, LabDetails, PortalFilter, ScanCancel, ScanOrder, ScanReport};
pub use chain::{Batch, ChainGateway, ChainReader, ChainWriter, LabReport, SigningGateway, Stage};
pub use config::HerbTraceConfig;
pub use error::{HerbTraceError, Result};
pub use extraction::{MetadataResolver, MetadataSource, NormalizedMetadata};
pub use logging::init_logger;
