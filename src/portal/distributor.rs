//! Distributor portal.
//!
//! Shows verified batches newest first and dispatches them.

use std::sync::Arc;

use crate::aggregation::{BatchAggregator, BatchView, PortalFilter, ScanCancel, ScanOrder, ScanReport};
use crate::chain::types::{Stage, TxReceipt};
use crate::chain::ChainWriter;
use crate::error::{HerbTraceError, Result};

#[derive(Debug, Clone)]
pub struct Dispatch {
    pub receipt: TxReceipt,
    pub view: BatchView,
}

pub struct DistributorPortal {
    aggregator: Arc<BatchAggregator>,
    chain: Arc<dyn ChainWriter>,
}

impl DistributorPortal {
    pub fn new(aggregator: Arc<BatchAggregator>, chain: Arc<dyn ChainWriter>) -> Self {
        Self { aggregator, chain }
    }

    /// Verified and later batches, newest first.
    pub async fn load(&self, cancel: &ScanCancel) -> Result<ScanReport> {
        self.aggregator
            .list_batches(PortalFilter::VerifiedOnly, ScanOrder::NewestFirst, cancel)
            .await
    }

    /// Whether the dispatch action applies to this batch.
    pub fn can_dispatch(view: &BatchView) -> bool {
        view.is_verified() && !view.is_shipped()
    }

    /// Move a batch to `Shipped` and return its refreshed view.
    pub async fn dispatch(&self, view: &BatchView) -> Result<Dispatch> {
        if view.is_shipped() {
            return Err(HerbTraceError::InvalidInput(format!(
                "batch #{} is already {}",
                view.id,
                view.stage.label()
            )));
        }

        log::info!("DISPATCH_SUBMIT batch={} from={}", view.id, view.stage);
        let receipt = self.chain.update_stage(view.id, Stage::Shipped).await?;
        log::info!("DISPATCH_COMPLETE batch={} tx={}", view.id, receipt.tx_hash);

        let view = self.aggregator.get_one(view.id).await?;
        Ok(Dispatch { receipt, view })
    }
}
