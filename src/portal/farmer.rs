//! Farmer portal.
//!
//! Registration pins the crop image and the metadata document before the
//! contract call, so the first read of the new batch resolves its metadata.

use std::sync::Arc;

use crate::chain::types::TxReceipt;
use crate::chain::ChainWriter;
use crate::error::{HerbTraceError, Result};
use crate::storage::{
    upload_batch_metadata, upload_image, BatchMetadataDraft, ImageServerClient, ImageUpload,
    PinningService,
};

use super::form::{require_file, require_text, text_or};
use super::track::tracking_link;

/// Name recorded when the farmer leaves theirs blank.
pub const DEFAULT_FARMER_NAME: &str = "Verified Farmer";

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub crop_name: String,
    pub location: String,
    pub harvest_date: String,
    pub farmer_name: String,
    pub image: Vec<u8>,
    pub image_file_name: String,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub batch_id: u64,
    pub metadata_cid: String,
    pub image_cid: String,
    pub tracking_link: String,
    pub receipt: TxReceipt,
}

pub struct FarmerPortal {
    chain: Arc<dyn ChainWriter>,
    pinning: Arc<dyn PinningService>,
    image_server: Option<ImageServerClient>,
    tracking_base: String,
}

impl FarmerPortal {
    pub fn new(
        chain: Arc<dyn ChainWriter>,
        pinning: Arc<dyn PinningService>,
        tracking_base: &str,
    ) -> Self {
        Self {
            chain,
            pinning,
            image_server: None,
            tracking_base: tracking_base.to_string(),
        }
    }

    /// Send crop images through the image server instead of pinning directly.
    pub fn with_image_server(mut self, client: ImageServerClient) -> Self {
        self.image_server = Some(client);
        self
    }

    pub async fn register(&self, form: RegistrationForm) -> Result<Registration> {
        let crop_name = require_text("crop name", &form.crop_name)?;
        let location = require_text("farm location", &form.location)?;
        let harvest_date = require_text("harvest date", &form.harvest_date)?;
        let farmer_name = text_or("farmer name", &form.farmer_name, DEFAULT_FARMER_NAME)?;
        require_file("crop image", &form.image)?;

        let file_name = if form.image_file_name.trim().is_empty() {
            "crop.jpg".to_string()
        } else {
            form.image_file_name.trim().to_string()
        };

        log::info!("REGISTER_START crop={:?} location={:?}", crop_name, location);

        let image_cid = match &self.image_server {
            Some(server) => {
                server
                    .upload(ImageUpload {
                        bytes: form.image,
                        file_name,
                        crop_name: crop_name.clone(),
                        location: location.clone(),
                        farmer_name: farmer_name.clone(),
                    })
                    .await?
            }
            None => {
                let label = format!("HerbTrace_Image_{}", crop_name);
                upload_image(self.pinning.as_ref(), form.image, &file_name, &label).await?
            }
        };

        let draft = BatchMetadataDraft {
            crop_name,
            location,
            harvest_date,
            image_cid: image_cid.clone(),
            farmer_name,
        };
        let metadata_cid = upload_batch_metadata(self.pinning.as_ref(), &draft).await?;
        log::info!("REGISTER_PINNED image={} metadata={}", image_cid, metadata_cid);

        let receipt = self.chain.create_batch(&metadata_cid).await?;

        let batch_id = self
            .chain
            .next_batch_id()
            .await?
            .checked_sub(1)
            .ok_or_else(|| HerbTraceError::contract("nextBatchId", "returned 0 after createBatch"))?;

        log::info!(
            "REGISTER_COMPLETE batch={} tx={} metadata={}",
            batch_id,
            receipt.tx_hash,
            metadata_cid
        );

        Ok(Registration {
            batch_id,
            metadata_cid,
            image_cid,
            tracking_link: tracking_link(&self.tracking_base, batch_id),
            receipt,
        })
    }
}
