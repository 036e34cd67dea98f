//! Client for the image upload server.
//!
//! The server accepts the crop photo with a few form fields, pins it, and
//! answers with the image CID under one of several key names.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;

use crate::error::{HerbTraceError, Result};

/// Keys the server has used for the returned CID, in priority order.
const CID_KEYS: &[&str] = &["ipfsHash", "hash", "cid"];

#[derive(Debug, Clone)]
pub struct ImageServerClient {
    client: Client,
    url: String,
}

/// Crop photo plus the descriptive fields sent alongside it.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub crop_name: String,
    pub location: String,
    pub farmer_name: String,
}

impl ImageServerClient {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| HerbTraceError::InvalidConfig(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub async fn upload(&self, upload: ImageUpload) -> Result<String> {
        let form = Form::new()
            .part("image", Part::bytes(upload.bytes).file_name(upload.file_name))
            .text("name", upload.crop_name)
            .text("location", upload.location)
            .text("farmerName", upload.farmer_name);

        log::info!("IMAGE_UPLOAD_START url={}", self.url);

        let response = self
            .client
            .post(&self.url)
            .header("ngrok-skip-browser-warning", "true")
            .multipart(form)
            .send()
            .await
            .map_err(|e| HerbTraceError::StorageUploadFailed(e.to_string()))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let reason = body
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string());
            log::warn!("IMAGE_UPLOAD_REJECTED status={} reason={}", status, reason);
            return Err(HerbTraceError::StorageUploadFailed(reason));
        }

        let cid = extract_cid(&body).ok_or_else(|| {
            HerbTraceError::StorageUploadFailed(
                "server did not return an IPFS hash for the image".to_string(),
            )
        })?;

        log::info!("IMAGE_UPLOAD_COMPLETE cid={}", cid);
        Ok(cid)
    }
}

fn extract_cid(body: &Value) -> Option<String> {
    CID_KEYS.iter().find_map(|key| {
        body.get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().to_string())
    })
}
