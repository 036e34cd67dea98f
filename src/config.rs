//! Process-wide configuration.
//!
//! Built once at startup and passed into every component. Nothing in the
//! aggregation path reads ambient globals.

use std::time::Duration;

use crate::error::{HerbTraceError, Result};

/// HerbChain deployment on Sepolia.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x437B1696B0E67a1430f5486583971D4520af93e1";

/// Batches on the deployed contract are numbered from 101.
pub const DEFAULT_BATCH_ID_START: u64 = 101;

/// CORS-compatible public Sepolia endpoints, tried in order.
///
/// A build can replace the list by setting `HERBTRACE_RPC_URLS` (comma
/// separated) at compile time.
pub const DEFAULT_RPC_URLS: &[&str] = &[
    "https://sepolia.drpc.org",
    "https://1rpc.io/sepolia",
    "https://ethereum-sepolia.blockpi.network/v1/rpc/public",
    "https://ethereum-sepolia-rpc.publicnode.com",
];

pub const DEFAULT_IPFS_GATEWAY: &str = "https://dweb.link/ipfs";
pub const DEFAULT_PINATA_API: &str = "https://api.pinata.cloud";

/// Spacing between per-item contract reads during a range scan.
pub const DEFAULT_SCAN_DELAY_MS: u64 = 100;
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 2_000;

/// Immutable client configuration.
#[derive(Debug, Clone)]
pub struct HerbTraceConfig {
    pub contract_address: String,
    pub batch_id_start: u64,
    pub rpc_urls: Vec<String>,
    pub ipfs_gateway: String,
    pub pinata_api: String,
    pub pinata_jwt: Option<String>,
    /// Image-upload server (`/api/add-batch`). When unset, crop
    /// images are pinned straight to Pinata.
    pub image_server_url: Option<String>,
    /// EIP-1193 style JSON-RPC endpoint exposed by the wallet (e.g. Frame).
    pub wallet_url: Option<String>,
    pub scan_delay: Duration,
    pub receipt_poll_interval: Duration,
}

impl Default for HerbTraceConfig {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            batch_id_start: DEFAULT_BATCH_ID_START,
            rpc_urls: rpc_urls_from(option_env!("HERBTRACE_RPC_URLS")),
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
            pinata_api: DEFAULT_PINATA_API.to_string(),
            pinata_jwt: None,
            image_server_url: None,
            wallet_url: None,
            scan_delay: Duration::from_millis(DEFAULT_SCAN_DELAY_MS),
            receipt_poll_interval: Duration::from_millis(DEFAULT_RECEIPT_POLL_MS),
        }
    }
}

impl HerbTraceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with the deployment secrets and service endpoints:
    /// `HERBTRACE_PINATA_JWT`, `HERBTRACE_IMAGE_SERVER` and
    /// `HERBTRACE_WALLET_URL`. Contract identifiers and read endpoints are
    /// fixed when the binary is built.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(jwt) = std::env::var("HERBTRACE_PINATA_JWT") {
            config.pinata_jwt = non_empty(jwt);
        }
        if let Ok(url) = std::env::var("HERBTRACE_IMAGE_SERVER") {
            config.image_server_url = non_empty(url);
        }
        if let Ok(url) = std::env::var("HERBTRACE_WALLET_URL") {
            config.wallet_url = non_empty(url);
        }
        config.validate()?;

        log::info!(
            "CONFIG_LOADED contract={} batch_id_start={} rpc_endpoints={} pinata={} wallet={}",
            config.contract_address,
            config.batch_id_start,
            config.rpc_urls.len(),
            config.pinata_jwt.is_some(),
            config.wallet_url.is_some()
        );

        Ok(config)
    }

    pub fn with_rpc_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rpc_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_contract_address(mut self, address: impl Into<String>) -> Self {
        self.contract_address = address.into();
        self
    }

    pub fn with_ipfs_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.ipfs_gateway = gateway.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_pinata(mut self, api: impl Into<String>, jwt: impl Into<String>) -> Self {
        self.pinata_api = api.into().trim_end_matches('/').to_string();
        self.pinata_jwt = Some(jwt.into());
        self
    }

    pub fn with_image_server(mut self, url: impl Into<String>) -> Self {
        self.image_server_url = Some(url.into());
        self
    }

    pub fn with_wallet_url(mut self, url: impl Into<String>) -> Self {
        self.wallet_url = Some(url.into());
        self
    }

    pub fn with_scan_delay(mut self, delay: Duration) -> Self {
        self.scan_delay = delay;
        self
    }

    pub fn with_receipt_poll_interval(mut self, interval: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self
    }

    /// Reject configurations no component could work with.
    pub fn validate(&self) -> Result<()> {
        if self.rpc_urls.is_empty() {
            return Err(HerbTraceError::InvalidConfig(
                "at least one read endpoint is required".to_string(),
            ));
        }
        if !is_hex_address(&self.contract_address) {
            return Err(HerbTraceError::InvalidConfig(format!(
                "contract address {:?} is not a 20-byte hex address",
                self.contract_address
            )));
        }
        if self.batch_id_start == 0 {
            return Err(HerbTraceError::InvalidConfig(
                "batch ids start at 1 or above".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Build-time endpoint overlay, or the default list when it is absent or blank.
fn rpc_urls_from(overlay: Option<&str>) -> Vec<String> {
    let parsed: Vec<String> = overlay
        .unwrap_or_default()
        .split(',')
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    if parsed.is_empty() {
        DEFAULT_RPC_URLS.iter().map(|s| s.to_string()).collect()
    } else {
        parsed
    }
}

fn is_hex_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map(|rest| rest.len() == 40 && rest.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}
