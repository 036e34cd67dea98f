//! Lab portal.
//!
//! Lists every batch newest first, narrows to the verification queue, and
//! records lab findings on-chain.

use std::sync::Arc;

use crate::aggregation::{BatchAggregator, BatchView, PortalFilter, ScanCancel, ScanOrder, ScanReport};
use crate::chain::types::{Stage, TxReceipt, NO_REPORT_SENTINEL};
use crate::chain::ChainWriter;
use crate::error::{HerbTraceError, Result};
use crate::storage::{upload_lab_report_pdf, PinningService};

use super::form::{require_file, require_text};

/// Findings entered by the lab technician.
#[derive(Debug, Clone, Default)]
pub struct LabSubmission {
    pub purity: String,
    pub notes: String,
    /// Optional report PDF.
    pub pdf: Option<Vec<u8>>,
}

/// Outcome of a verification: the mined transaction and the re-fetched batch.
#[derive(Debug, Clone)]
pub struct Verification {
    pub receipt: TxReceipt,
    pub report_cid: Option<String>,
    pub view: BatchView,
}

pub struct LabPortal {
    aggregator: Arc<BatchAggregator>,
    chain: Arc<dyn ChainWriter>,
    pinning: Arc<dyn PinningService>,
}

impl LabPortal {
    pub fn new(
        aggregator: Arc<BatchAggregator>,
        chain: Arc<dyn ChainWriter>,
        pinning: Arc<dyn PinningService>,
    ) -> Self {
        Self {
            aggregator,
            chain,
            pinning,
        }
    }

    /// Dashboard listing: every batch, newest first.
    pub async fn load(&self, cancel: &ScanCancel) -> Result<ScanReport> {
        self.aggregator
            .list_batches(PortalFilter::All, ScanOrder::NewestFirst, cancel)
            .await
    }

    /// Work queue: batches still awaiting verification.
    pub async fn pending(&self, cancel: &ScanCancel) -> Result<ScanReport> {
        self.aggregator
            .list_batches(PortalFilter::PendingVerification, ScanOrder::NewestFirst, cancel)
            .await
    }

    pub async fn verify(&self, batch_id: u64, submission: LabSubmission) -> Result<Verification> {
        let purity = require_text("purity", &submission.purity)?;
        let notes = require_text("notes", &submission.notes)?;
        if let Some(pdf) = &submission.pdf {
            require_file("report PDF", pdf)?;
        }

        let current = self.aggregator.get_one(batch_id).await?;
        if current.stage >= Stage::Verified {
            return Err(HerbTraceError::InvalidInput(format!(
                "batch #{} is already {}",
                batch_id,
                current.stage.label()
            )));
        }

        let report_cid = match submission.pdf {
            Some(pdf) => Some(upload_lab_report_pdf(self.pinning.as_ref(), pdf, batch_id).await?),
            None => None,
        };
        let report_ref = report_cid.as_deref().unwrap_or(NO_REPORT_SENTINEL);

        log::info!(
            "VERIFY_SUBMIT batch={} purity={} report={}",
            batch_id,
            purity,
            report_ref
        );

        let receipt = self
            .chain
            .verify_batch(batch_id, report_ref, &purity, &notes)
            .await?;

        log::info!("VERIFY_COMPLETE batch={} tx={}", batch_id, receipt.tx_hash);

        let view = self.aggregator.get_one(batch_id).await?;
        Ok(Verification {
            receipt,
            report_cid,
            view,
        })
    }
}
