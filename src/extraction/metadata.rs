//! Metadata normalization.
//!
//! Maps a raw metadata document onto [`NormalizedMetadata`] using the
//! synonym table, then falls back to the free-text description for
//! location and farmer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extraction::fields::field_text;
use crate::extraction::synonyms::{parse_description, MetadataField, DESCRIPTION_KEY, FIELD_SYNONYMS};
use crate::logging::structured::LogContext;

/// Canonical shape of a batch's off-chain metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedMetadata {
    pub name: Option<String>,
    pub location: Option<String>,
    pub harvest_date: Option<String>,
    pub image_cid: Option<String>,
    pub farmer_name: Option<String>,
}

impl NormalizedMetadata {
    fn slot(&mut self, field: MetadataField) -> &mut Option<String> {
        match field {
            MetadataField::Name => &mut self.name,
            MetadataField::Location => &mut self.location,
            MetadataField::HarvestDate => &mut self.harvest_date,
            MetadataField::ImageCid => &mut self.image_cid,
            MetadataField::FarmerName => &mut self.farmer_name,
        }
    }
}

/// Normalize a parsed metadata document.
pub fn normalize_metadata(doc: &Value, ctx: &LogContext) -> NormalizedMetadata {
    let mut metadata = NormalizedMetadata::default();

    for synonyms in FIELD_SYNONYMS {
        let found = synonyms.candidates.iter().find_map(|key| {
            field_text(doc, key).map(|v| (*key, v))
        });

        match found {
            Some((key, value)) => {
                log::debug!(
                    "{} FIELD_EXTRACTED field={:?} key={} value={:?}",
                    ctx,
                    synonyms.field,
                    key,
                    value
                );
                *metadata.slot(synonyms.field) = Some(value);
            }
            None => {
                log::debug!("{} FIELD_MISSING field={:?}", ctx, synonyms.field);
            }
        }
    }

    if metadata.location.is_none() || metadata.farmer_name.is_none() {
        let parsed = doc
            .get(DESCRIPTION_KEY)
            .and_then(Value::as_str)
            .map(parse_description)
            .unwrap_or_default();

        if parsed.location.is_some() || parsed.farmer.is_some() {
            log::debug!(
                "{} DESCRIPTION_FALLBACK location={:?} farmer={:?}",
                ctx,
                parsed.location,
                parsed.farmer
            );
        }
        if metadata.location.is_none() {
            metadata.location = parsed.location;
        }
        if metadata.farmer_name.is_none() {
            metadata.farmer_name = parsed.farmer;
        }
    }

    metadata
}
