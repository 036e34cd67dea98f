//! Batch aggregation.
//!
//! Coordinates the per-batch workflow shared by every portal:
//! 1. Batch record from the contract (skip when it does not exist)
//! 2. Metadata resolution (degrades to placeholders)
//! 3. Lab report once the batch is verified (absent on any failure)
//! 4. Assemble the view-model
//!
//! Range scans walk `batch_id_start..next_batch_id` sequentially with a
//! fixed delay between items to stay under public endpoint rate limits.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::chain::types::Stage;
use crate::chain::ChainReader;
use crate::config::HerbTraceConfig;
use crate::error::{HerbTraceError, Result};
use crate::extraction::MetadataSource;
use crate::logging::structured::LogContext;

use super::context::{ScanCancel, ScanContext};
use super::filter::{arrange, PortalFilter, ScanOrder};
use super::view::{BatchView, LabDetails};

/// A batch that could not be loaded during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBatch {
    pub id: u64,
    /// Machine-readable error tag, see [`HerbTraceError::kind`].
    pub kind: &'static str,
    pub reason: String,
}

/// Result of one range scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scan_id: String,
    pub next_batch_id: u64,
    pub views: Vec<BatchView>,
    /// Ids whose reads failed; the rest of the scan carried on.
    pub skipped: Vec<SkippedBatch>,
    /// Ids in range that were never created.
    pub nonexistent: usize,
    pub cancelled: bool,
}

/// Builds [`BatchView`]s from the contract and the metadata store.
pub struct BatchAggregator {
    chain: Arc<dyn ChainReader>,
    metadata: Arc<dyn MetadataSource>,
    batch_id_start: u64,
    scan_delay: Duration,
}

impl BatchAggregator {
    pub fn new(
        chain: Arc<dyn ChainReader>,
        metadata: Arc<dyn MetadataSource>,
        config: &HerbTraceConfig,
    ) -> Self {
        Self {
            chain,
            metadata,
            batch_id_start: config.batch_id_start,
            scan_delay: config.scan_delay,
        }
    }

    pub fn batch_id_start(&self) -> u64 {
        self.batch_id_start
    }

    /// Scan every assigned id and return the portal's view of them.
    ///
    /// Only a failure to read `nextBatchId` fails the whole scan.
    pub async fn list_batches(
        &self,
        filter: PortalFilter,
        order: ScanOrder,
        cancel: &ScanCancel,
    ) -> Result<ScanReport> {
        let scan = ScanContext::new();
        let ctx = scan.log_context();

        let next_batch_id = self.chain.next_batch_id().await.map_err(|e| {
            log::error!(
                "{} SCAN_ABORTED reason=next_batch_id kind={} error={}",
                ctx,
                e.kind(),
                e
            );
            e
        })?;

        log::info!(
            "{} SCAN_START range={}..{} filter={}",
            ctx,
            self.batch_id_start,
            next_batch_id,
            filter.as_str()
        );

        let mut views = Vec::new();
        let mut skipped = Vec::new();
        let mut nonexistent = 0;
        let mut cancelled = false;

        for (n, id) in (self.batch_id_start..next_batch_id).enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if n > 0 && !self.scan_delay.is_zero() {
                tokio::time::sleep(self.scan_delay).await;
            }

            let item_ctx = scan.batch_context(id);
            match self.load_item(id, &item_ctx).await {
                Ok(Some(view)) => views.push(view),
                Ok(None) => nonexistent += 1,
                Err(e) => {
                    log::warn!("{} ITEM_SKIPPED kind={} error={}", item_ctx, e.kind(), e);
                    skipped.push(SkippedBatch {
                        id,
                        kind: e.kind(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if cancel.is_cancelled() {
            cancelled = true;
            log::info!("{} SCAN_CANCELLED loaded={}", ctx, views.len());
        }

        let loaded = views.len();
        let views = arrange(views, filter, order);

        log::info!(
            "{} SCAN_COMPLETE loaded={} shown={} skipped={} nonexistent={} elapsed_ms={}",
            ctx,
            loaded,
            views.len(),
            skipped.len(),
            nonexistent,
            (chrono::Utc::now() - scan.started_at).num_milliseconds()
        );

        Ok(ScanReport {
            scan_id: scan.scan_id,
            next_batch_id,
            views,
            skipped,
            nonexistent,
            cancelled,
        })
    }

    /// Look up a single batch.
    pub async fn get_one(&self, id: u64) -> Result<BatchView> {
        let scan = ScanContext::new();
        let ctx = scan.batch_context(id);

        if id < self.batch_id_start {
            log::info!("{} LOOKUP_OUT_OF_RANGE start={}", ctx, self.batch_id_start);
            return Err(HerbTraceError::NotFound(id));
        }

        match self.load_item(id, &ctx).await {
            Ok(Some(view)) => {
                log::info!("{} LOOKUP_COMPLETE stage={}", ctx, view.stage);
                Ok(view)
            }
            Ok(None) => Err(HerbTraceError::NotFound(id)),
            Err(e) => {
                log::warn!("{} LOOKUP_FAILED kind={} error={}", ctx, e.kind(), e);
                Err(e)
            }
        }
    }

    /// `Ok(None)` when the batch was never created. Only the batch read
    /// itself can fail; metadata and lab data degrade.
    async fn load_item(&self, id: u64, ctx: &LogContext) -> Result<Option<BatchView>> {
        let batch = self.chain.get_batch(id).await?;
        if !batch.exists {
            log::debug!("{} BATCH_NOT_CREATED", ctx);
            return Ok(None);
        }

        let metadata = self.metadata.resolve(&batch.metadata_cid, ctx).await;
        if metadata.is_none() {
            log::debug!(
                "{} METADATA_ABSENT cid={:?} fallback=placeholder",
                ctx,
                batch.metadata_cid
            );
        }

        let lab_details = if batch.stage >= Stage::Verified {
            match self.chain.get_lab_report(id).await {
                Ok(report) => LabDetails::from_report(report, ctx),
                Err(e) => {
                    log::warn!("{} LAB_REPORT_UNAVAILABLE error={}", ctx, e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Some(BatchView::assemble(batch, metadata, lab_details)))
    }
}
