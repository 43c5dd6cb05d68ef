use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, TimeZone};

use crate::workflows::accounts::UserId;
use crate::workflows::inspections::{
    CompetitionAnalysis, CriteriaSpecs, InspectionRecord, SimilarityCriteria, TimeWindow,
};
use crate::workflows::portfolio::domain::{
    AnalysisDraft, AnalysisId, AnalysisRecord, CriteriaId, NewCriteria, NewProperty, Property,
    PropertyId, SavedCriteria,
};
use crate::workflows::portfolio::repository::{PortfolioRepository, RepositoryError};
use crate::workflows::portfolio::service::PortfolioService;

pub(super) use crate::workflows::accounts::tests::common::{
    fast_policy, now, read_json_body, registration, MemoryAccounts,
};

pub(super) const OWNER: UserId = UserId(41);
pub(super) const STRANGER: UserId = UserId(42);

pub(super) fn at(hour: u32, minute: u32) -> chrono::DateTime<chrono::Utc> {
    chrono::Utc
        .with_ymd_and_hms(2025, 10, 4, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn new_property(address: &str) -> NewProperty {
    NewProperty {
        full_address: address.to_string(),
        property_type: "house".to_string(),
        bedrooms: 3,
        bathrooms: 2,
        car_spaces: None,
        listing_price: Some(1_450_000),
        listing_status: None,
    }
}

pub(super) fn new_criteria(property_id: PropertyId, bedrooms: &str) -> NewCriteria {
    NewCriteria {
        property_id,
        bedrooms_criteria: bedrooms.to_string(),
        bathrooms_criteria: "2+".to_string(),
        car_spaces_criteria: "1-2".to_string(),
    }
}

pub(super) fn draft() -> AnalysisDraft {
    let records = vec![
        InspectionRecord {
            address: "4 Albert Street, Newtown NSW 2042".to_string(),
            date: "2025-10-04".to_string(),
            start_time: "10:00".to_string(),
            end_time: "10:30".to_string(),
            property_details: None,
        },
        InspectionRecord {
            address: "9 King Street, Newtown NSW 2042".to_string(),
            date: "2025-10-04".to_string(),
            start_time: "10:15".to_string(),
            end_time: "10:45".to_string(),
            property_details: None,
        },
    ];
    let window = TimeWindow::default();
    let analysis = CompetitionAnalysis::run(&records, &SimilarityCriteria::default(), &window);
    AnalysisDraft::from_analysis(
        &analysis,
        records.len(),
        NaiveDate::from_ymd_opt(2025, 10, 4).expect("valid date"),
        window,
        CriteriaSpecs::default(),
        "static",
    )
}

pub(super) fn build_service() -> (PortfolioService<MemoryPortfolio>, Arc<MemoryPortfolio>) {
    let repository = Arc::new(MemoryPortfolio::default());
    (PortfolioService::new(repository.clone()), repository)
}

#[derive(Default)]
pub(super) struct MemoryPortfolio {
    properties: Mutex<BTreeMap<PropertyId, Property>>,
    analyses: Mutex<BTreeMap<AnalysisId, AnalysisRecord>>,
    criteria: Mutex<BTreeMap<CriteriaId, SavedCriteria>>,
}

impl PortfolioRepository for MemoryPortfolio {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut properties = self.properties.lock().expect("properties mutex poisoned");
        if properties.contains_key(&property.id) {
            return Err(RepositoryError::Conflict);
        }
        properties.insert(property.id, property.clone());
        Ok(property)
    }

    fn fetch_property(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        Ok(self
            .properties
            .lock()
            .expect("properties mutex poisoned")
            .get(&id)
            .cloned())
    }

    fn properties_for(&self, user_id: UserId) -> Result<Vec<Property>, RepositoryError> {
        Ok(self
            .properties
            .lock()
            .expect("properties mutex poisoned")
            .values()
            .filter(|property| property.user_id == user_id)
            .cloned()
            .collect())
    }

    fn insert_analysis(&self, record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError> {
        self.analyses
            .lock()
            .expect("analyses mutex poisoned")
            .insert(record.id, record.clone());
        Ok(record)
    }

    fn analyses_for(&self, user_id: UserId) -> Result<Vec<AnalysisRecord>, RepositoryError> {
        Ok(self
            .analyses
            .lock()
            .expect("analyses mutex poisoned")
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect())
    }

    fn insert_criteria(&self, criteria: SavedCriteria) -> Result<SavedCriteria, RepositoryError> {
        self.criteria
            .lock()
            .expect("criteria mutex poisoned")
            .insert(criteria.id, criteria.clone());
        Ok(criteria)
    }

    fn criteria_for(&self, property_id: PropertyId) -> Result<Vec<SavedCriteria>, RepositoryError> {
        Ok(self
            .criteria
            .lock()
            .expect("criteria mutex poisoned")
            .values()
            .filter(|criteria| criteria.property_id == property_id)
            .cloned()
            .collect())
    }
}

pub(super) struct UnavailablePortfolio;

impl PortfolioRepository for UnavailablePortfolio {
    fn insert_property(&self, _property: Property) -> Result<Property, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn fetch_property(&self, _id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn properties_for(&self, _user_id: UserId) -> Result<Vec<Property>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn insert_analysis(&self, _record: AnalysisRecord) -> Result<AnalysisRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn analyses_for(&self, _user_id: UserId) -> Result<Vec<AnalysisRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn insert_criteria(&self, _criteria: SavedCriteria) -> Result<SavedCriteria, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }

    fn criteria_for(
        &self,
        _property_id: PropertyId,
    ) -> Result<Vec<SavedCriteria>, RepositoryError> {
        Err(RepositoryError::Unavailable("offline".to_string()))
    }
}
