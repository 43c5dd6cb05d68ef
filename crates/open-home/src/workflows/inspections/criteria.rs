use serde::{Deserialize, Serialize};

pub const DEFAULT_BEDROOMS_SPEC: &str = "3-4";
pub const DEFAULT_BATHROOMS_SPEC: &str = "2+";
pub const DEFAULT_CAR_SPOTS_SPEC: &str = "1-2";

/// Inclusive attribute range. `max == None` means no upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl CriteriaRange {
    pub const fn exact(value: u32) -> Self {
        Self {
            min: value,
            max: Some(value),
        }
    }

    pub const fn at_least(min: u32) -> Self {
        Self { min, max: None }
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.min && self.max.map_or(true, |max| value <= max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.max.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    #[error("invalid criteria '{spec}': {reason}")]
    InvalidCriteria { spec: String, reason: &'static str },
}

impl CriteriaError {
    fn invalid(spec: &str, reason: &'static str) -> Self {
        Self::InvalidCriteria {
            spec: spec.to_string(),
            reason,
        }
    }
}

/// Parse a compact range spec: `"N"`, `"N-M"` or `"N+"`.
pub fn parse_range(spec: &str) -> Result<CriteriaRange, CriteriaError> {
    let trimmed = spec.trim();

    if trimmed.contains('+') {
        let min = trimmed
            .strip_suffix('+')
            .filter(|rest| !rest.contains('+'))
            .ok_or_else(|| CriteriaError::invalid(spec, "'+' must terminate the value"))?;
        let min = parse_count(spec, min)?;
        return Ok(CriteriaRange::at_least(min));
    }

    if let Some((low, high)) = trimmed.split_once('-') {
        let min = parse_count(spec, low)?;
        let max = parse_count(spec, high)?;
        if max < min {
            return Err(CriteriaError::invalid(
                spec,
                "upper bound is below lower bound",
            ));
        }
        return Ok(CriteriaRange {
            min,
            max: Some(max),
        });
    }

    parse_count(spec, trimmed).map(CriteriaRange::exact)
}

fn parse_count(spec: &str, part: &str) -> Result<u32, CriteriaError> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CriteriaError::invalid(spec, "expected a non-negative integer"));
    }
    part.parse::<u32>()
        .map_err(|_| CriteriaError::invalid(spec, "value out of range"))
}

/// The three attribute ranges a listing must satisfy to count as competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarityCriteria {
    pub bedrooms: CriteriaRange,
    pub bathrooms: CriteriaRange,
    pub car_spots: CriteriaRange,
    #[serde(skip)]
    specs: CriteriaSpecs,
}

/// Raw textual specs as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaSpecs {
    pub bedrooms: String,
    pub bathrooms: String,
    pub car_spots: String,
}

impl Default for CriteriaSpecs {
    fn default() -> Self {
        Self {
            bedrooms: DEFAULT_BEDROOMS_SPEC.to_string(),
            bathrooms: DEFAULT_BATHROOMS_SPEC.to_string(),
            car_spots: DEFAULT_CAR_SPOTS_SPEC.to_string(),
        }
    }
}

impl SimilarityCriteria {
    pub fn parse(specs: CriteriaSpecs) -> Result<Self, CriteriaError> {
        Ok(Self {
            bedrooms: parse_range(&specs.bedrooms)?,
            bathrooms: parse_range(&specs.bathrooms)?,
            car_spots: parse_range(&specs.car_spots)?,
            specs,
        })
    }

    pub fn from_specs(
        bedrooms: &str,
        bathrooms: &str,
        car_spots: &str,
    ) -> Result<Self, CriteriaError> {
        Self::parse(CriteriaSpecs {
            bedrooms: bedrooms.to_string(),
            bathrooms: bathrooms.to_string(),
            car_spots: car_spots.to_string(),
        })
    }

    /// Ranges that accept every listing.
    pub fn any() -> Self {
        Self {
            bedrooms: CriteriaRange::at_least(0),
            bathrooms: CriteriaRange::at_least(0),
            car_spots: CriteriaRange::at_least(0),
            specs: CriteriaSpecs {
                bedrooms: "0+".to_string(),
                bathrooms: "0+".to_string(),
                car_spots: "0+".to_string(),
            },
        }
    }

    pub fn specs(&self) -> &CriteriaSpecs {
        &self.specs
    }
}

impl Default for SimilarityCriteria {
    fn default() -> Self {
        Self {
            bedrooms: CriteriaRange {
                min: 3,
                max: Some(4),
            },
            bathrooms: CriteriaRange::at_least(2),
            car_spots: CriteriaRange {
                min: 1,
                max: Some(2),
            },
            specs: CriteriaSpecs::default(),
        }
    }
}
