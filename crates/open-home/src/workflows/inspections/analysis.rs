use serde::Serialize;
use tracing::debug;

use super::competition::{aggregate, recommendations, TimeSlot, TimeWindow};
use super::criteria::SimilarityCriteria;
use super::domain::InspectionRecord;
use super::similarity::filter_similar;

/// Output of one filter -> aggregate -> rank pass.
#[derive(Debug, Clone, Serialize)]
pub struct CompetitionAnalysis {
    pub filtered_inspections: Vec<InspectionRecord>,
    pub competition_analysis: Vec<TimeSlot>,
    pub recommendations: Vec<TimeSlot>,
}

impl CompetitionAnalysis {
    pub fn run(
        records: &[InspectionRecord],
        criteria: &SimilarityCriteria,
        window: &TimeWindow,
    ) -> Self {
        let filtered_inspections = filter_similar(records, criteria);
        let competition_analysis = aggregate(&filtered_inspections, window);
        let recommendations = recommendations(&competition_analysis);

        debug!(
            total = records.len(),
            similar = filtered_inspections.len(),
            slots = competition_analysis.len(),
            "competition analysis complete"
        );

        Self {
            filtered_inspections,
            competition_analysis,
            recommendations,
        }
    }

    /// Headline figures stored alongside a saved analysis.
    pub fn summary(&self, total_inspections: usize) -> AnalysisSummary {
        let similar = self.filtered_inspections.len();
        let filter_efficiency_pct = if total_inspections == 0 {
            0.0
        } else {
            similar as f32 / total_inspections as f32 * 100.0
        };

        let peak_competition_time = self
            .competition_analysis
            .iter()
            .filter(|slot| slot.count > 0)
            .fold(None::<&TimeSlot>, |best, slot| match best {
                Some(current) if current.count >= slot.count => Some(current),
                _ => Some(slot),
            })
            .map(|slot| slot.time.clone());

        let slot_total: usize = self.competition_analysis.iter().map(|slot| slot.count).sum();
        let average_count = if self.competition_analysis.is_empty() {
            0.0
        } else {
            slot_total as f32 / self.competition_analysis.len() as f32
        };

        AnalysisSummary {
            total_inspections,
            similar_inspections: similar,
            filter_efficiency_pct,
            peak_competition_time,
            lowest_competition_time: self.recommendations.first().map(|slot| slot.time.clone()),
            average_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub total_inspections: usize,
    pub similar_inspections: usize,
    pub filter_efficiency_pct: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_competition_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_competition_time: Option<String>,
    pub average_count: f32,
}
