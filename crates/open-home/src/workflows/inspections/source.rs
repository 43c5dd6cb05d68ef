use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{InspectionRecord, PropertyDetails};
use super::locality::Locality;

/// What a source is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionQuery {
    pub address: String,
    pub date: NaiveDate,
    pub locality: Locality,
}

impl InspectionQuery {
    pub fn new(address: impl Into<String>, date: NaiveDate) -> Self {
        let address = address.into();
        let locality = Locality::from_address(&address);
        Self {
            address,
            date,
            locality,
        }
    }

    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read inspection data: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid inspection data: {0}")]
    Format(#[from] serde_json::Error),
    #[error("inspection source unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can list the open homes for an address and date.
pub trait InspectionSource: Send + Sync {
    fn fetch(&self, query: &InspectionQuery) -> Result<Vec<InspectionRecord>, SourceError>;

    fn source_name(&self) -> &'static str;
}

/// Records plus the name of the source that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct SourcedInspections {
    pub records: Vec<InspectionRecord>,
    pub data_source: &'static str,
}

/// Fetch from `primary`, switching to `fallback` only when `primary` errors.
/// An empty primary result is a valid answer and is returned as-is.
pub fn collect_inspections(
    primary: &dyn InspectionSource,
    fallback: &dyn InspectionSource,
    query: &InspectionQuery,
) -> Result<SourcedInspections, SourceError> {
    match primary.fetch(query) {
        Ok(records) => Ok(SourcedInspections {
            records,
            data_source: primary.source_name(),
        }),
        Err(err) => {
            warn!(
                source = primary.source_name(),
                fallback = fallback.source_name(),
                error = %err,
                "inspection source failed, using fallback"
            );
            let records = fallback.fetch(query)?;
            Ok(SourcedInspections {
                records,
                data_source: fallback.source_name(),
            })
        }
    }
}

/// Fixed record list, mostly for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct StaticInspectionSource {
    records: Vec<InspectionRecord>,
}

impl StaticInspectionSource {
    pub fn new(records: Vec<InspectionRecord>) -> Self {
        Self { records }
    }
}

impl InspectionSource for StaticInspectionSource {
    fn fetch(&self, _query: &InspectionQuery) -> Result<Vec<InspectionRecord>, SourceError> {
        Ok(self.records.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// JSON fixture file holding an array of inspection records.
#[derive(Debug, Clone)]
pub struct FileInspectionSource {
    path: PathBuf,
}

impl FileInspectionSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InspectionSource for FileInspectionSource {
    fn fetch(&self, query: &InspectionQuery) -> Result<Vec<InspectionRecord>, SourceError> {
        let raw = std::fs::read_to_string(&self.path)?;
        let records: Vec<InspectionRecord> = serde_json::from_str(&raw)?;
        let date = query.date_label();
        Ok(records
            .into_iter()
            .filter(|record| record.date.trim() == date)
            .collect())
    }

    fn source_name(&self) -> &'static str {
        "fixture_file"
    }
}

const SUBURBS: [&str; 15] = [
    "Bondi",
    "Surry Hills",
    "Paddington",
    "Newtown",
    "Glebe",
    "Manly",
    "Chatswood",
    "Parramatta",
    "Hornsby",
    "Cronulla",
    "Balmain",
    "Leichhardt",
    "Rozelle",
    "Annandale",
    "Dulwich Hill",
];

const STREETS: [&str; 15] = [
    "George Street",
    "King Street",
    "Queen Street",
    "Park Avenue",
    "High Street",
    "Church Street",
    "Victoria Road",
    "Oxford Street",
    "Crown Street",
    "Bay Street",
    "Hill Road",
    "Beach Road",
    "Forest Way",
    "Garden Street",
    "River Road",
];

const PROPERTY_TYPES: [&str; 5] = ["House", "Apartment", "Townhouse", "Villa", "Studio"];

const VIEWING_SLOTS: [(&str, &str); 14] = [
    ("09:00", "09:30"),
    ("09:30", "10:00"),
    ("10:00", "10:30"),
    ("10:30", "11:00"),
    ("11:00", "11:30"),
    ("11:30", "12:00"),
    ("12:00", "12:30"),
    ("12:30", "13:00"),
    ("13:00", "13:30"),
    ("13:30", "14:00"),
    ("14:00", "14:30"),
    ("14:30", "15:00"),
    ("15:00", "15:30"),
    ("15:30", "16:00"),
];

const BEDROOMS: [u32; 6] = [1, 2, 3, 4, 5, 6];
const BEDROOM_WEIGHTS: [u32; 6] = [10, 25, 30, 25, 8, 2];
const BATHROOMS: [u32; 4] = [1, 2, 3, 4];
const BATHROOM_WEIGHTS: [u32; 4] = [20, 50, 25, 5];
const CAR_SPOTS: [u32; 5] = [0, 1, 2, 3, 4];
const CAR_SPOT_WEIGHTS: [u32; 5] = [15, 35, 35, 12, 3];

const MIN_GENERATED: usize = 12;
const MAX_GENERATED: usize = 25;

/// Synthetic Sydney open homes with realistic attribute weights.
#[derive(Debug, Clone, Default)]
pub struct MockInspectionSource {
    seed: Option<u64>,
}

impl MockInspectionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch with the same seed yields the same listings.
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl InspectionSource for MockInspectionSource {
    fn fetch(&self, query: &InspectionQuery) -> Result<Vec<InspectionRecord>, SourceError> {
        let mut rng = self.rng();
        let bedrooms = weighted(&BEDROOM_WEIGHTS)?;
        let bathrooms = weighted(&BATHROOM_WEIGHTS)?;
        let car_spots = weighted(&CAR_SPOT_WEIGHTS)?;

        let date = query.date_label();
        let count = rng.gen_range(MIN_GENERATED..=MAX_GENERATED);
        let mut records = Vec::with_capacity(count);

        for _ in 0..count {
            let street_number: u32 = rng.gen_range(1..=999);
            let street = STREETS.choose(&mut rng).copied().unwrap_or(STREETS[0]);
            let suburb = SUBURBS.choose(&mut rng).copied().unwrap_or(SUBURBS[0]);
            let property_type = PROPERTY_TYPES
                .choose(&mut rng)
                .copied()
                .unwrap_or(PROPERTY_TYPES[0]);
            let (start_time, end_time) = VIEWING_SLOTS
                .choose(&mut rng)
                .copied()
                .unwrap_or(VIEWING_SLOTS[0]);

            records.push(InspectionRecord {
                address: format!(
                    "{street_number} {street}, {suburb} NSW {}",
                    query.locality.postcode
                ),
                date: date.clone(),
                start_time: start_time.to_string(),
                end_time: end_time.to_string(),
                property_details: Some(PropertyDetails {
                    bedrooms: Some(BEDROOMS[bedrooms.sample(&mut rng)]),
                    bathrooms: Some(BATHROOMS[bathrooms.sample(&mut rng)]),
                    car_spots: Some(CAR_SPOTS[car_spots.sample(&mut rng)]),
                    property_type: Some(property_type.to_string()),
                }),
            });
        }

        info!(
            address = %query.address,
            date = %date,
            generated = records.len(),
            "generated mock inspections"
        );
        Ok(records)
    }

    fn source_name(&self) -> &'static str {
        "mock_data"
    }
}

fn weighted(weights: &[u32]) -> Result<WeightedIndex<u32>, SourceError> {
    WeightedIndex::new(weights).map_err(|err| SourceError::Unavailable(err.to_string()))
}
