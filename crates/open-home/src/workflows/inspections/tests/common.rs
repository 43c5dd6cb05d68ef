use chrono::NaiveDate;

use crate::workflows::inspections::domain::{InspectionRecord, PropertyDetails};
use crate::workflows::inspections::source::{InspectionQuery, InspectionSource, SourceError};

pub(super) fn inspection_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 4).expect("valid date")
}

pub(super) fn query() -> InspectionQuery {
    InspectionQuery::new("18 Church Street, Newtown, 2042", inspection_date())
}

pub(super) fn listing(
    start_time: &str,
    bedrooms: u32,
    bathrooms: u32,
    car_spots: u32,
) -> InspectionRecord {
    InspectionRecord {
        address: format!("{start_time} George Street, Glebe NSW 2037"),
        date: "2025-10-04".to_string(),
        start_time: start_time.to_string(),
        end_time: "16:00".to_string(),
        property_details: Some(PropertyDetails {
            bedrooms: Some(bedrooms),
            bathrooms: Some(bathrooms),
            car_spots: Some(car_spots),
            property_type: Some("Townhouse".to_string()),
        }),
    }
}

pub(super) struct FailingSource;

impl InspectionSource for FailingSource {
    fn fetch(&self, _query: &InspectionQuery) -> Result<Vec<InspectionRecord>, SourceError> {
        Err(SourceError::Unavailable("listings site timed out".to_string()))
    }

    fn source_name(&self) -> &'static str {
        "listings_site"
    }
}
