use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::accounts::UserId;
use crate::workflows::inspections::{
    AnalysisSummary, CompetitionAnalysis, CriteriaRange, CriteriaSpecs, TimeSlot, TimeWindow,
};

pub const DEFAULT_LISTING_STATUS: &str = "active";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub u64);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A listing managed by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub id: PropertyId,
    pub user_id: UserId,
    pub full_address: String,
    pub property_type: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub car_spaces: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_price: Option<u64>,
    pub listing_status: String,
    pub created_at: DateTime<Utc>,
}

/// Payload accepted when adding a property.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewProperty {
    pub full_address: String,
    pub property_type: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    #[serde(default)]
    pub car_spaces: Option<u32>,
    #[serde(default)]
    pub listing_price: Option<u64>,
    #[serde(default)]
    pub listing_status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnalysisId(pub u64);

/// Everything about a finished analysis that is worth keeping, before it is
/// attached to an owner and a property.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisDraft {
    pub analysis_date: NaiveDate,
    pub window: TimeWindow,
    pub criteria: CriteriaSpecs,
    pub summary: AnalysisSummary,
    pub time_slots: Vec<TimeSlot>,
    pub recommendations: Vec<TimeSlot>,
    pub data_source: String,
}

impl AnalysisDraft {
    pub fn from_analysis(
        analysis: &CompetitionAnalysis,
        total_inspections: usize,
        analysis_date: NaiveDate,
        window: TimeWindow,
        criteria: CriteriaSpecs,
        data_source: &str,
    ) -> Self {
        Self {
            analysis_date,
            window,
            criteria,
            summary: analysis.summary(total_inspections),
            time_slots: analysis.competition_analysis.clone(),
            recommendations: analysis.recommendations.clone(),
            data_source: data_source.to_string(),
        }
    }
}

/// Saved analysis as listed in an agent's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord {
    pub id: AnalysisId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub analysis_date: NaiveDate,
    pub window: TimeWindow,
    pub criteria: CriteriaSpecs,
    #[serde(flatten)]
    pub summary: AnalysisSummary,
    pub time_slots: Vec<TimeSlot>,
    pub recommendations: Vec<TimeSlot>,
    pub data_source: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriteriaId(pub u64);

/// Similarity ranges an agent wants applied to one of their properties.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCriteria {
    pub property_id: PropertyId,
    pub bedrooms_criteria: String,
    pub bathrooms_criteria: String,
    pub car_spaces_criteria: String,
}

/// Stored criteria: the raw specs as entered plus their parsed ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedCriteria {
    pub id: CriteriaId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub bedrooms_criteria: String,
    pub bathrooms_criteria: String,
    pub car_spaces_criteria: String,
    pub bedrooms: CriteriaRange,
    pub bathrooms: CriteriaRange,
    pub car_spaces: CriteriaRange,
    pub created_at: DateTime<Utc>,
}

impl SavedCriteria {
    pub fn specs(&self) -> CriteriaSpecs {
        CriteriaSpecs {
            bedrooms: self.bedrooms_criteria.clone(),
            bathrooms: self.bathrooms_criteria.clone(),
            car_spots: self.car_spaces_criteria.clone(),
        }
    }
}
