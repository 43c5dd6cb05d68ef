use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::workflows::accounts::UserId;
use crate::workflows::inspections::{CriteriaError, SimilarityCriteria};

use super::domain::{
    AnalysisDraft, AnalysisId, AnalysisRecord, CriteriaId, NewCriteria, NewProperty, Property,
    PropertyId, SavedCriteria, DEFAULT_LISTING_STATUS,
};
use super::repository::{PortfolioRepository, RepositoryError};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

static PROPERTY_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static ANALYSIS_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CRITERIA_SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Agent-scoped access to properties and saved analyses.
pub struct PortfolioService<R> {
    repository: Arc<R>,
}

impl<R> PortfolioService<R>
where
    R: PortfolioRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create_property(
        &self,
        user_id: UserId,
        new_property: NewProperty,
        now: DateTime<Utc>,
    ) -> Result<Property, PortfolioError> {
        let full_address = new_property.full_address.trim().to_string();
        if full_address.is_empty() {
            return Err(PortfolioError::InvalidProperty("full_address is required"));
        }
        let property_type = new_property.property_type.trim().to_string();
        if property_type.is_empty() {
            return Err(PortfolioError::InvalidProperty("property_type is required"));
        }

        let listing_status = new_property
            .listing_status
            .map(|status| status.trim().to_string())
            .filter(|status| !status.is_empty())
            .unwrap_or_else(|| DEFAULT_LISTING_STATUS.to_string());

        let property = Property {
            id: PropertyId(PROPERTY_SEQUENCE.fetch_add(1, Ordering::Relaxed)),
            user_id,
            full_address,
            property_type,
            bedrooms: new_property.bedrooms,
            bathrooms: new_property.bathrooms,
            car_spaces: new_property.car_spaces.unwrap_or(0),
            listing_price: new_property.listing_price,
            listing_status,
            created_at: now,
        };

        let property = self.repository.insert_property(property)?;
        info!(
            user_id = user_id.0,
            property_id = property.id.0,
            "property created"
        );
        Ok(property)
    }

    /// Properties owned by `user_id`, oldest first.
    pub fn properties_for(&self, user_id: UserId) -> Result<Vec<Property>, PortfolioError> {
        let mut properties = self.repository.properties_for(user_id)?;
        properties.sort_by_key(|property| (property.created_at, property.id));
        Ok(properties)
    }

    /// A property is only visible to its owner.
    pub fn property_for(
        &self,
        user_id: UserId,
        property_id: PropertyId,
    ) -> Result<Property, PortfolioError> {
        self.repository
            .fetch_property(property_id)?
            .filter(|property| property.user_id == user_id)
            .ok_or(PortfolioError::PropertyNotFound(property_id))
    }

    /// Validate and store similarity criteria against one of the caller's properties.
    pub fn save_criteria(
        &self,
        user_id: UserId,
        new_criteria: NewCriteria,
        now: DateTime<Utc>,
    ) -> Result<SavedCriteria, PortfolioError> {
        let property = self.property_for(user_id, new_criteria.property_id)?;
        let parsed = SimilarityCriteria::from_specs(
            &new_criteria.bedrooms_criteria,
            &new_criteria.bathrooms_criteria,
            &new_criteria.car_spaces_criteria,
        )?;

        let criteria = SavedCriteria {
            id: CriteriaId(CRITERIA_SEQUENCE.fetch_add(1, Ordering::Relaxed)),
            user_id,
            property_id: property.id,
            bedrooms_criteria: new_criteria.bedrooms_criteria.trim().to_string(),
            bathrooms_criteria: new_criteria.bathrooms_criteria.trim().to_string(),
            car_spaces_criteria: new_criteria.car_spaces_criteria.trim().to_string(),
            bedrooms: parsed.bedrooms,
            bathrooms: parsed.bathrooms,
            car_spaces: parsed.car_spots,
            created_at: now,
        };

        let criteria = self.repository.insert_criteria(criteria)?;
        info!(
            user_id = user_id.0,
            property_id = property.id.0,
            criteria_id = criteria.id.0,
            "criteria saved"
        );
        Ok(criteria)
    }

    /// Most recently saved criteria for an owned property, if any.
    pub fn latest_criteria(
        &self,
        user_id: UserId,
        property_id: PropertyId,
    ) -> Result<Option<SavedCriteria>, PortfolioError> {
        let property = self.property_for(user_id, property_id)?;
        Ok(self
            .repository
            .criteria_for(property.id)?
            .into_iter()
            .max_by_key(|criteria| (criteria.created_at, criteria.id)))
    }

    pub fn record_analysis(
        &self,
        user_id: UserId,
        property_id: PropertyId,
        draft: AnalysisDraft,
        now: DateTime<Utc>,
    ) -> Result<AnalysisRecord, PortfolioError> {
        let property = self.property_for(user_id, property_id)?;

        let record = AnalysisRecord {
            id: AnalysisId(ANALYSIS_SEQUENCE.fetch_add(1, Ordering::Relaxed)),
            user_id,
            property_id: property.id,
            analysis_date: draft.analysis_date,
            window: draft.window,
            criteria: draft.criteria,
            summary: draft.summary,
            time_slots: draft.time_slots,
            recommendations: draft.recommendations,
            data_source: draft.data_source,
            created_at: now,
        };

        let record = self.repository.insert_analysis(record)?;
        info!(
            user_id = user_id.0,
            property_id = property_id.0,
            analysis_id = record.id.0,
            "analysis saved"
        );
        Ok(record)
    }

    /// Saved analyses across all of the agent's properties, newest first.
    pub fn analysis_history(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<AnalysisRecord>, PortfolioError> {
        let mut history = self.repository.analyses_for(user_id)?;
        history.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        history.truncate(limit);
        Ok(history)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    #[error("{0}")]
    InvalidProperty(&'static str),
    #[error("property {0} not found")]
    PropertyNotFound(PropertyId),
    #[error(transparent)]
    InvalidCriteria(#[from] CriteriaError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
