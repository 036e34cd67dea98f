//! Metadata resolution from content-addressed storage.
//!
//! Every failure (unreachable gateway, non-2xx, image bytes at the CID,
//! unparseable body) resolves to `None`. Nothing here returns an error.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;

use crate::config::HerbTraceConfig;
use crate::error::{HerbTraceError, Result};
use crate::extraction::metadata::{normalize_metadata, NormalizedMetadata};
use crate::logging::structured::LogContext;
use crate::storage::ipfs_url;

/// Source of normalized batch metadata.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn resolve(&self, cid: &str, ctx: &LogContext) -> Option<NormalizedMetadata>;
}

/// Resolves metadata through a public IPFS gateway.
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    client: Client,
    gateway: String,
}

impl MetadataResolver {
    pub fn new(gateway: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| HerbTraceError::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            gateway: gateway.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &HerbTraceConfig) -> Result<Self> {
        Self::new(&config.ipfs_gateway)
    }

    pub fn gateway(&self) -> &str {
        &self.gateway
    }
}

#[async_trait]
impl MetadataSource for MetadataResolver {
    async fn resolve(&self, cid: &str, ctx: &LogContext) -> Option<NormalizedMetadata> {
        let url = ipfs_url(&self.gateway, cid)?;

        log::debug!("{} METADATA_FETCH url={}", ctx, url);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("{} METADATA_UNREACHABLE cid={} error={}", ctx, cid, e);
                return None;
            }
        };

        if !response.status().is_success() {
            log::warn!(
                "{} METADATA_UNAVAILABLE cid={} status={}",
                ctx,
                cid,
                response.status()
            );
            return None;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.contains("image") || content_type.contains("octet-stream") {
            log::info!(
                "{} METADATA_NOT_DOCUMENT cid={} content_type={}",
                ctx,
                cid,
                content_type
            );
            return None;
        }

        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                log::warn!("{} METADATA_READ_FAILED cid={} error={}", ctx, cid, e);
                return None;
            }
        };

        let doc: Value = match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                log::info!("{} METADATA_PARSE_FAILED cid={} error={}", ctx, cid, e);
                return None;
            }
        };

        if !doc.is_object() {
            log::info!("{} METADATA_NOT_OBJECT cid={}", ctx, cid);
            return None;
        }

        Some(normalize_metadata(&doc, ctx))
    }
}
