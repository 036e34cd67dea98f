//! Field synonym table.
//!
//! Each canonical field lists the keys upstream producers have used for it,
//! in priority order. Supporting a new producer means adding keys here; the
//! normalization code does not change.

use lazy_static::lazy_static;
use regex::Regex;

/// Canonical metadata fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Name,
    Location,
    HarvestDate,
    ImageCid,
    FarmerName,
}

/// Candidate top-level keys for one canonical field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSynonyms {
    pub field: MetadataField,
    pub candidates: &'static [&'static str],
}

pub const FIELD_SYNONYMS: &[FieldSynonyms] = &[
    FieldSynonyms {
        field: MetadataField::Name,
        candidates: &["name", "cropName", "crop", "herbName"],
    },
    FieldSynonyms {
        field: MetadataField::Location,
        candidates: &[
            "location",
            "farmLocation",
            "farm_location",
            "farmAddress",
            "farm_address",
            "address",
            "village",
            "district",
            "state",
            "region",
            "place",
            "area",
            "city",
            "origin",
        ],
    },
    FieldSynonyms {
        field: MetadataField::HarvestDate,
        candidates: &["harvestDate", "date", "harvest_date", "harvestdate"],
    },
    FieldSynonyms {
        field: MetadataField::ImageCid,
        candidates: &["imageCID", "imagehash", "image_cid", "image", "imageHash"],
    },
    FieldSynonyms {
        field: MetadataField::FarmerName,
        candidates: &["farmerName", "farmer_name", "farmer"],
    },
];

/// Free-text key some producers use instead of dedicated fields.
pub const DESCRIPTION_KEY: &str = "description";

lazy_static! {
    /// "Harvested at <location> by <farmer>"
    static ref HARVESTED_AT: Regex = Regex::new(r"(?i)harvested at (.+?) by (.+)").unwrap();
}

/// Location and farmer read from a description sentence. Each part is kept
/// on its own; a blank capture leaves only that part unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionParts {
    pub location: Option<String>,
    pub farmer: Option<String>,
}

/// Extract location and farmer from a "Harvested at .. by .." sentence.
pub fn parse_description(text: &str) -> DescriptionParts {
    let Some(caps) = HARVESTED_AT.captures(text) else {
        return DescriptionParts::default();
    };
    let part = |n: usize| {
        caps.get(n)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    DescriptionParts {
        location: part(1),
        farmer: part(2),
    }
}
