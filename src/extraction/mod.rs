//! Metadata extraction module.
//!
//! Resolves a batch's off-chain metadata document and normalizes the field
//! names used by the different upstream producers into one shape.

pub mod fields;
pub mod metadata;
pub mod resolver;
pub mod synonyms;

pub use fields::*;
pub use metadata::*;
pub use resolver::*;
pub use synonyms::*;
