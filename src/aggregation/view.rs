//! Batch view-model.
//!
//! Client-only aggregate of the on-chain batch, its lab report and the
//! off-chain metadata. Rebuilt from scratch on every fetch.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::chain::types::{is_report_uploaded, Batch, LabReport, Stage};
use crate::extraction::metadata::NormalizedMetadata;
use crate::logging::structured::LogContext;
use crate::storage::{ipfs_url, ipfs_urls_with_fallback};

/// Lab findings as shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabDetails {
    pub report_ipfs: String,
    pub purity: String,
    pub notes: String,
    /// `None` when the contract recorded no timestamp.
    pub recorded_at: Option<DateTime<Utc>>,
    pub lab_tech: String,
}

impl LabDetails {
    /// Convert a contract report; an empty or zero purity means the lab has
    /// not reported yet.
    pub fn from_report(report: LabReport, ctx: &LogContext) -> Option<Self> {
        if purity_is_absent(&report.purity) {
            if !report.purity.trim().is_empty() {
                // A real 0% result cannot be told apart from "no report".
                log::warn!(
                    "{} LAB_PURITY_ZERO purity={:?} treated_as=absent",
                    ctx,
                    report.purity
                );
            }
            return None;
        }

        let recorded_at = if report.timestamp == 0 {
            None
        } else {
            i64::try_from(report.timestamp)
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
        };

        Some(Self {
            report_ipfs: report.report_ipfs,
            purity: report.purity,
            notes: report.notes,
            recorded_at,
            lab_tech: report.lab_tech,
        })
    }

    /// CID of the uploaded PDF, or `None` for the no-report sentinel.
    pub fn report_cid(&self) -> Option<&str> {
        if is_report_uploaded(&self.report_ipfs) {
            Some(self.report_ipfs.trim())
        } else {
            None
        }
    }

    /// Download link for the report, if one was uploaded.
    pub fn report_url(&self, gateway: &str) -> Option<String> {
        self.report_cid().and_then(|cid| ipfs_url(gateway, cid))
    }
}

fn purity_is_absent(purity: &str) -> bool {
    let trimmed = purity.trim();
    trimmed.is_empty() || trimmed.parse::<f64>().map(|v| v == 0.0).unwrap_or(false)
}

/// Denormalized batch as consumed by the portals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchView {
    pub id: u64,
    pub metadata_cid: String,
    pub farmer: String,
    pub stage: Stage,
    pub name: String,
    pub location: Option<String>,
    pub harvest_date: Option<String>,
    pub image_cid: Option<String>,
    pub farmer_name: Option<String>,
    pub lab_details: Option<LabDetails>,
}

impl BatchView {
    pub fn placeholder_name(id: u64) -> String {
        format!("Batch #{}", id)
    }

    /// Combine the three sources; missing metadata degrades field by field.
    pub fn assemble(
        batch: Batch,
        metadata: Option<NormalizedMetadata>,
        lab_details: Option<LabDetails>,
    ) -> Self {
        let metadata = metadata.unwrap_or_default();
        Self {
            id: batch.id,
            metadata_cid: batch.metadata_cid,
            farmer: batch.farmer,
            stage: batch.stage,
            name: metadata
                .name
                .unwrap_or_else(|| Self::placeholder_name(batch.id)),
            location: metadata.location,
            harvest_date: metadata.harvest_date,
            image_cid: metadata.image_cid,
            farmer_name: metadata.farmer_name,
            lab_details,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.stage >= Stage::Verified
    }

    pub fn is_shipped(&self) -> bool {
        self.stage >= Stage::Shipped
    }

    /// Image links to try in order: the configured gateway, then the
    /// public fallback gateway.
    pub fn image_urls(&self, gateway: &str) -> Vec<String> {
        self.image_cid
            .as_deref()
            .map(|cid| ipfs_urls_with_fallback(gateway, cid))
            .unwrap_or_default()
    }
}
