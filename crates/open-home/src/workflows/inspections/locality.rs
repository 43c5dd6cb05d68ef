use serde::Serialize;

const FALLBACK_SUBURB: &str = "sydney";
const FALLBACK_POSTCODE: &str = "2000";

/// Suburb slug and postcode pulled from a free-text address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locality {
    pub suburb: String,
    pub postcode: String,
}

impl Locality {
    /// Reads `"..., Suburb, Postcode"`; anything without a comma maps to the
    /// Sydney CBD.
    pub fn from_address(address: &str) -> Self {
        let parts: Vec<&str> = address.trim().split(',').collect();
        if parts.len() < 2 {
            return Self::default();
        }

        let suburb = parts[parts.len() - 2]
            .trim()
            .to_lowercase()
            .replace(' ', "-");
        let postcode = parts[parts.len() - 1].trim().to_string();

        Self { suburb, postcode }
    }
}

impl Default for Locality {
    fn default() -> Self {
        Self {
            suburb: FALLBACK_SUBURB.to_string(),
            postcode: FALLBACK_POSTCODE.to_string(),
        }
    }
}
