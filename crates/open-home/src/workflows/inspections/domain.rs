use serde::{Deserialize, Serialize};

/// Bedroom count assumed when a source omits it.
pub const DEFAULT_BEDROOMS: u32 = 3;
/// Bathroom count assumed when a source omits it.
pub const DEFAULT_BATHROOMS: u32 = 2;
/// Car spot count assumed when a source omits it.
pub const DEFAULT_CAR_SPOTS: u32 = 1;

/// A single open-home viewing as reported by an inspection source.
///
/// Times are kept as the raw `HH:MM` text the source produced; they are only
/// interpreted when the record is bucketed, so a malformed value affects that
/// record alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub address: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_details: Option<PropertyDetails>,
}

impl InspectionRecord {
    pub fn bedrooms(&self) -> u32 {
        self.property_details
            .as_ref()
            .and_then(|details| details.bedrooms)
            .unwrap_or(DEFAULT_BEDROOMS)
    }

    pub fn bathrooms(&self) -> u32 {
        self.property_details
            .as_ref()
            .and_then(|details| details.bathrooms)
            .unwrap_or(DEFAULT_BATHROOMS)
    }

    pub fn car_spots(&self) -> u32 {
        self.property_details
            .as_ref()
            .and_then(|details| details.car_spots)
            .unwrap_or(DEFAULT_CAR_SPOTS)
    }
}

/// Optional listing attributes attached to an inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDetails {
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub car_spots: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
}
