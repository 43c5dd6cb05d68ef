//! Open home competition analysis.
//!
//! Inspection records flow one way through three stages: a source lists the
//! open homes for an address and date, the similarity filter keeps listings
//! comparable to the caller's property, and the aggregator buckets the
//! survivors into half-hour slots and ranks the quietest ones.

mod analysis;
mod competition;
mod criteria;
pub mod domain;
mod export;
mod locality;
mod similarity;
pub mod source;

#[cfg(test)]
mod tests;

pub use analysis::{AnalysisSummary, CompetitionAnalysis};
pub use competition::{
    aggregate, parse_clock, recommendations, CompetitionLevel, MalformedTimeError, TimeSlot,
    TimeWindow, DEFAULT_WINDOW_END, DEFAULT_WINDOW_START, RECOMMENDATION_LIMIT,
};
pub use criteria::{
    parse_range, CriteriaError, CriteriaRange, CriteriaSpecs, SimilarityCriteria,
    DEFAULT_BATHROOMS_SPEC, DEFAULT_BEDROOMS_SPEC, DEFAULT_CAR_SPOTS_SPEC,
};
pub use domain::{InspectionRecord, PropertyDetails};
pub use export::write_slots_csv;
pub use locality::Locality;
pub use similarity::{filter_similar, is_similar};
pub use source::{
    collect_inspections, FileInspectionSource, InspectionQuery, InspectionSource,
    MockInspectionSource, SourceError, SourcedInspections, StaticInspectionSource,
};

use chrono::NaiveDate;

/// Request-level failures of the analysis pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Criteria(#[from] CriteriaError),
    #[error(transparent)]
    Time(#[from] MalformedTimeError),
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    Date(String),
    #[error("{0}")]
    MissingParameter(&'static str),
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, AnalysisError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AnalysisError::Date(raw.to_string()))
}
