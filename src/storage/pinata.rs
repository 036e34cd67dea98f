//! Pinata pinning client.
//!
//! Uploads crop images, lab report PDFs and batch metadata documents. The
//! contract only stores the metadata CID; everything else lives in that
//! document.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::HerbTraceConfig;
use crate::error::{HerbTraceError, Result};

/// Pinata's per-pin metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PinMetadata {
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub keyvalues: BTreeMap<String, String>,
}

impl PinMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keyvalues: BTreeMap::new(),
        }
    }

    pub fn with_keyvalue(mut self, key: &str, value: impl Into<String>) -> Self {
        self.keyvalues.insert(key.to_string(), value.into());
        self
    }
}

/// Upload side of content-addressed storage.
#[async_trait]
pub trait PinningService: Send + Sync {
    /// Pin raw file bytes; returns the CID.
    async fn pin_file(&self, bytes: Vec<u8>, file_name: &str, metadata: PinMetadata)
        -> Result<String>;

    /// Pin a JSON document; returns the CID.
    async fn pin_json(&self, content: Value, metadata: PinMetadata) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Authenticated Pinata API client.
#[derive(Debug, Clone)]
pub struct PinataClient {
    client: Client,
    api_base: String,
    jwt: String,
}

impl PinataClient {
    pub fn new(api_base: &str, jwt: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| HerbTraceError::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            jwt: jwt.to_string(),
        })
    }

    pub fn from_config(config: &HerbTraceConfig) -> Result<Self> {
        let jwt = config.pinata_jwt.as_deref().ok_or_else(|| {
            HerbTraceError::InvalidConfig("pinning requires a Pinata JWT".to_string())
        })?;
        Self::new(&config.pinata_api, jwt)
    }

    async fn read_cid(what: &str, response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("PIN_REJECTED kind={} status={} body={}", what, status, body);
            return Err(HerbTraceError::StorageUploadFailed(format!(
                "{} upload failed: {}",
                what, status
            )));
        }

        let parsed: PinResponse = response.json().await.map_err(|e| {
            HerbTraceError::StorageUploadFailed(format!("{} upload response: {}", what, e))
        })?;

        log::info!("PIN_COMPLETE kind={} cid={}", what, parsed.ipfs_hash);
        Ok(parsed.ipfs_hash)
    }
}

#[async_trait]
impl PinningService for PinataClient {
    async fn pin_file(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        metadata: PinMetadata,
    ) -> Result<String> {
        let pin_metadata = serde_json::to_string(&metadata)
            .map_err(|e| HerbTraceError::StorageUploadFailed(e.to_string()))?;

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("pinataMetadata", pin_metadata);

        log::info!("PIN_FILE_START name={} file={}", metadata.name, file_name);

        let response = self
            .client
            .post(format!("{}/pinning/pinFileToIPFS", self.api_base))
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await
            .map_err(|e| HerbTraceError::StorageUploadFailed(e.to_string()))?;

        Self::read_cid("file", response).await
    }

    async fn pin_json(&self, content: Value, metadata: PinMetadata) -> Result<String> {
        log::info!("PIN_JSON_START name={}", metadata.name);

        let response = self
            .client
            .post(format!("{}/pinning/pinJSONToIPFS", self.api_base))
            .bearer_auth(&self.jwt)
            .json(&json!({
                "pinataContent": content,
                "pinataMetadata": metadata,
            }))
            .send()
            .await
            .map_err(|e| HerbTraceError::StorageUploadFailed(e.to_string()))?;

        Self::read_cid("metadata", response).await
    }
}

/// Fields the farmer supplies for a new batch's metadata document.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchMetadataDraft {
    pub crop_name: String,
    pub location: String,
    pub harvest_date: String,
    pub image_cid: String,
    pub farmer_name: String,
}

/// Metadata document as pinned. Alias keys keep older readers working.
pub fn batch_metadata_document(draft: &BatchMetadataDraft, created_at: DateTime<Utc>) -> Value {
    json!({
        "name": draft.crop_name,
        "cropName": draft.crop_name,
        "location": draft.location,
        "farmLocation": draft.location,
        "harvestDate": draft.harvest_date,
        "date": draft.harvest_date,
        "imageCID": draft.image_cid,
        "farmerName": draft.farmer_name,
        "createdAt": created_at.to_rfc3339(),
    })
}

/// Pin a batch's metadata document; the returned CID goes on-chain.
pub async fn upload_batch_metadata(
    pinning: &dyn PinningService,
    draft: &BatchMetadataDraft,
) -> Result<String> {
    let now = Utc::now();
    let name = format!(
        "HerbTrace_Batch_{}_{}",
        draft.crop_name,
        now.timestamp_millis()
    );
    pinning
        .pin_json(batch_metadata_document(draft, now), PinMetadata::named(name))
        .await
}

/// Pin a lab report PDF for a batch.
pub async fn upload_lab_report_pdf(
    pinning: &dyn PinningService,
    pdf: Vec<u8>,
    batch_id: u64,
) -> Result<String> {
    let name = format!("HerbTrace_LabReport_Batch_{}", batch_id);
    let metadata = PinMetadata::named(name.clone())
        .with_keyvalue("batchId", batch_id.to_string())
        .with_keyvalue("type", "lab_pdf");
    pinning
        .pin_file(pdf, &format!("{}.pdf", name), metadata)
        .await
}

/// Pin a crop image.
pub async fn upload_image(
    pinning: &dyn PinningService,
    image: Vec<u8>,
    file_name: &str,
    label: &str,
) -> Result<String> {
    pinning
        .pin_file(image, file_name, PinMetadata::named(label))
        .await
}
