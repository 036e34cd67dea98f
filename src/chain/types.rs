//! On-chain records as the contract returns them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Report CID recorded when the lab uploaded no PDF.
pub const NO_REPORT_SENTINEL: &str = "No_Report_Uploaded";

/// Lifecycle stage of a batch. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Registered = 0,
    Verified = 1,
    Shipped = 2,
    Delivered = 3,
}

impl Stage {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Stage::Registered),
            1 => Some(Stage::Verified),
            2 => Some(Stage::Shipped),
            3 => Some(Stage::Delivered),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human label shown by the portals.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Registered => "Pending Lab",
            Stage::Verified => "Verified",
            Stage::Shipped => "Shipped",
            Stage::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `batches(uint256)` → `(id, metadataCID, farmer, stage, exists)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub id: u64,
    pub metadata_cid: String,
    pub farmer: String,
    pub stage: Stage,
    pub exists: bool,
}

/// `getLabReport(uint256)` → `(reportIPFS, purity, notes, timestamp, labTech)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabReport {
    pub report_ipfs: String,
    pub purity: String,
    pub notes: String,
    /// Unix seconds; zero means unset.
    pub timestamp: u64,
    pub lab_tech: String,
}

/// Confirmation of a mined write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

/// True when a stored report CID points at an actual document.
pub fn is_report_uploaded(report_ipfs: &str) -> bool {
    let trimmed = report_ipfs.trim();
    !trimmed.is_empty() && trimmed != NO_REPORT_SENTINEL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::Registered < Stage::Verified);
        assert!(Stage::Verified < Stage::Shipped);
        assert!(Stage::Shipped < Stage::Delivered);
    }

    #[test]
    fn test_stage_from_u8() {
        assert_eq!(Stage::from_u8(1), Some(Stage::Verified));
        assert_eq!(Stage::from_u8(3), Some(Stage::Delivered));
        assert_eq!(Stage::from_u8(4), None);
        assert_eq!(Stage::Shipped.as_u8(), 2);
    }

    #[test]
    fn test_report_sentinel() {
        assert!(!is_report_uploaded(NO_REPORT_SENTINEL));
        assert!(!is_report_uploaded(""));
        assert!(is_report_uploaded("QmReportCid"));
    }
}
