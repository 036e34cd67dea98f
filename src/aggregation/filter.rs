//! Portal filters and ordering.
//!
//! Applied after aggregation, never during the scan.

use crate::chain::types::Stage;

use super::view::BatchView;

/// Which batches a portal shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalFilter {
    /// Lab dashboard and raw listings.
    All,
    /// Lab work queue: not yet verified.
    PendingVerification,
    /// Distributor: verified or later.
    VerifiedOnly,
}

impl PortalFilter {
    pub fn admits(&self, view: &BatchView) -> bool {
        match self {
            PortalFilter::All => true,
            PortalFilter::PendingVerification => view.stage < Stage::Verified,
            PortalFilter::VerifiedOnly => view.stage >= Stage::Verified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PortalFilter::All => "all",
            PortalFilter::PendingVerification => "pending_verification",
            PortalFilter::VerifiedOnly => "verified_only",
        }
    }
}

/// Result order of a range scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    Ascending,
    /// The ascending scan reversed.
    NewestFirst,
}

/// Apply a portal's filter and order to freshly aggregated views.
pub fn arrange(views: Vec<BatchView>, filter: PortalFilter, order: ScanOrder) -> Vec<BatchView> {
    let mut kept: Vec<BatchView> = views.into_iter().filter(|v| filter.admits(v)).collect();
    if order == ScanOrder::NewestFirst {
        kept.reverse();
    }
    kept
}
