//! Storage module.
//!
//! Content-addressed storage access: Pinata pinning uploads, the image
//! upload server, and gateway URL construction for reads.

pub mod gateway;
pub mod image_server;
pub mod pinata;

pub use gateway::*;
pub use image_server::*;
pub use pinata::*;
