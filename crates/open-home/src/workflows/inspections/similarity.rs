use super::criteria::SimilarityCriteria;
use super::domain::InspectionRecord;

/// Keep the inspections whose bedrooms, bathrooms and car spots all fall inside
/// `criteria`. Missing attributes are read through the record defaults.
pub fn filter_similar(
    records: &[InspectionRecord],
    criteria: &SimilarityCriteria,
) -> Vec<InspectionRecord> {
    records
        .iter()
        .filter(|record| is_similar(record, criteria))
        .cloned()
        .collect()
}

pub fn is_similar(record: &InspectionRecord, criteria: &SimilarityCriteria) -> bool {
    criteria.bedrooms.contains(record.bedrooms())
        && criteria.bathrooms.contains(record.bathrooms())
        && criteria.car_spots.contains(record.car_spots())
}
