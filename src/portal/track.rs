//! Public tracking.
//!
//! A single-id lookup, reachable from a shareable `<origin>/track?id=<id>`
//! link, plus the journey timeline shown for a batch.

use std::sync::Arc;

use reqwest::Url;
use serde::Serialize;

use crate::aggregation::{BatchAggregator, BatchView};
use crate::chain::types::Stage;
use crate::error::{HerbTraceError, Result};

/// Query parameter carrying the batch id in a tracking link.
pub const TRACK_QUERY_KEY: &str = "id";

/// Build the shareable tracking link for a batch.
pub fn tracking_link(base: &str, batch_id: u64) -> String {
    format!(
        "{}/track?{}={}",
        base.trim_end_matches('/'),
        TRACK_QUERY_KEY,
        batch_id
    )
}

/// Batch id encoded in a tracking link.
pub fn parse_tracking_link(link: &str) -> Result<u64> {
    let url = Url::parse(link.trim())
        .map_err(|e| HerbTraceError::InvalidInput(format!("tracking link: {}", e)))?;

    let raw = url
        .query_pairs()
        .find(|(key, _)| key == TRACK_QUERY_KEY)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| {
            HerbTraceError::InvalidInput(format!("tracking link has no `{}` parameter", TRACK_QUERY_KEY))
        })?;

    parse_batch_id(&raw)
}

/// Batch id typed into the search box.
pub fn parse_batch_id(raw: &str) -> Result<u64> {
    let trimmed = raw.trim().trim_start_matches('#');
    trimmed
        .parse::<u64>()
        .map_err(|_| HerbTraceError::InvalidInput(format!("{:?} is not a batch id", raw)))
}

/// One step of the supply-chain journey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineStep {
    pub stage: Stage,
    pub title: &'static str,
    pub reached: bool,
}

const JOURNEY: &[(Stage, &str)] = &[
    (Stage::Registered, "Harvested"),
    (Stage::Verified, "Lab Verified"),
    (Stage::Shipped, "Shipped"),
    (Stage::Delivered, "Delivered"),
];

/// Journey steps for a batch, lit up to its current stage.
pub fn timeline(view: &BatchView) -> Vec<TimelineStep> {
    JOURNEY
        .iter()
        .map(|(stage, title)| TimelineStep {
            stage: *stage,
            title: *title,
            reached: view.stage >= *stage,
        })
        .collect()
}

pub struct TrackPortal {
    aggregator: Arc<BatchAggregator>,
}

impl TrackPortal {
    pub fn new(aggregator: Arc<BatchAggregator>) -> Self {
        Self { aggregator }
    }

    pub async fn lookup(&self, batch_id: u64) -> Result<BatchView> {
        self.aggregator.get_one(batch_id).await
    }

    /// Resolve a scanned or pasted tracking link.
    pub async fn lookup_link(&self, link: &str) -> Result<BatchView> {
        let batch_id = parse_tracking_link(link)?;
        self.lookup(batch_id).await
    }
}
