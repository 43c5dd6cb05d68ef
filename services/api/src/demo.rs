use crate::infra::InspectionSources;
use chrono::NaiveDate;
use clap::Args;
use open_home::config::AppConfig;
use open_home::error::AppError;
use open_home::telemetry;
use open_home::workflows::inspections::{
    parse_date, write_slots_csv, AnalysisError, CompetitionAnalysis, FileInspectionSource,
    InspectionQuery, InspectionSource, MockInspectionSource, SimilarityCriteria,
    SourcedInspections, TimeWindow, DEFAULT_BATHROOMS_SPEC, DEFAULT_BEDROOMS_SPEC,
    DEFAULT_CAR_SPOTS_SPEC, DEFAULT_WINDOW_END, DEFAULT_WINDOW_START,
};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Address of the property being marketed
    #[arg(long)]
    pub(crate) address: String,
    /// Inspection date (YYYY-MM-DD)
    #[arg(long, value_parser = date_arg)]
    pub(crate) date: NaiveDate,
    /// Start of the time window (HH:MM)
    #[arg(long, default_value = DEFAULT_WINDOW_START)]
    pub(crate) start_time: String,
    /// End of the time window (HH:MM)
    #[arg(long, default_value = DEFAULT_WINDOW_END)]
    pub(crate) end_time: String,
    /// Bedroom range counted as competition, e.g. 3, 3-4 or 3+
    #[arg(long, default_value = DEFAULT_BEDROOMS_SPEC)]
    pub(crate) bedrooms: String,
    /// Bathroom range counted as competition
    #[arg(long, default_value = DEFAULT_BATHROOMS_SPEC)]
    pub(crate) bathrooms: String,
    /// Car spot range counted as competition
    #[arg(long, default_value = DEFAULT_CAR_SPOTS_SPEC)]
    pub(crate) car_spots: String,
    /// Seed for the mock listing generator
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// JSON fixture of inspections to use instead of generated listings
    #[arg(long)]
    pub(crate) inspections_file: Option<PathBuf>,
    /// Write the slot table to this CSV file
    #[arg(long)]
    pub(crate) export_csv: Option<PathBuf>,
}

fn date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).map_err(|err| err.to_string())
}

pub(crate) fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let criteria = SimilarityCriteria::from_specs(&args.bedrooms, &args.bathrooms, &args.car_spots)
        .map_err(AnalysisError::from)?;
    let window =
        TimeWindow::parse(&args.start_time, &args.end_time).map_err(AnalysisError::from)?;
    let query = InspectionQuery::new(args.address.trim(), args.date);

    let fixture = args
        .inspections_file
        .or_else(|| config.inspections.fixture_path.clone());
    let primary = fixture
        .map(|path| Box::new(FileInspectionSource::new(path)) as Box<dyn InspectionSource>);
    let mock = match args.seed.or(config.inspections.mock_seed) {
        Some(seed) => MockInspectionSource::seeded(seed),
        None => MockInspectionSource::new(),
    };
    let sources = InspectionSources::new(primary, mock);

    let sourced = sources.collect(&query)?;
    let analysis = CompetitionAnalysis::run(&sourced.records, &criteria, &window);

    let stdout = io::stdout();
    render_analysis(&mut stdout.lock(), &query, &criteria, &sourced, &analysis)?;

    if let Some(path) = args.export_csv {
        write_slots_csv(File::create(&path)?, &analysis.competition_analysis)?;
        println!("\nSlot table written to {}", path.display());
    }

    Ok(())
}

pub(crate) fn render_analysis<W: Write>(
    out: &mut W,
    query: &InspectionQuery,
    criteria: &SimilarityCriteria,
    sourced: &SourcedInspections,
    analysis: &CompetitionAnalysis,
) -> io::Result<()> {
    let specs = criteria.specs();
    let summary = analysis.summary(sourced.records.len());

    writeln!(out, "Open home competition for {}", query.address)?;
    writeln!(
        out,
        "Date {} | suburb {} ({}) | data source {}",
        query.date_label(),
        query.locality.suburb,
        query.locality.postcode,
        sourced.data_source
    )?;
    writeln!(
        out,
        "Similar listings: {} of {} ({:.0}%) matching {} bed / {} bath / {} car",
        summary.similar_inspections,
        summary.total_inspections,
        summary.filter_efficiency_pct,
        specs.bedrooms,
        specs.bathrooms,
        specs.car_spots
    )?;

    writeln!(out, "\nTime slots")?;
    for slot in &analysis.competition_analysis {
        writeln!(
            out,
            "- {} | {:>2} | {:<9} | {}",
            slot.time,
            slot.count,
            slot.competition.label(),
            "#".repeat(slot.count)
        )?;
    }

    if analysis.recommendations.is_empty() {
        writeln!(out, "\nRecommended times: none (empty window)")?;
    } else {
        writeln!(out, "\nRecommended times")?;
        for (rank, slot) in analysis.recommendations.iter().enumerate() {
            writeln!(
                out,
                "{}. {} ({} competing, {})",
                rank + 1,
                slot.time,
                slot.count,
                slot.competition.label()
            )?;
        }
    }

    if let Some(peak) = &summary.peak_competition_time {
        writeln!(out, "\nBusiest slot: {peak}")?;
    }
    writeln!(out, "Average per slot: {:.1}", summary.average_count)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use open_home::workflows::inspections::{InspectionRecord, StaticInspectionSource};

    fn record(start: &str) -> InspectionRecord {
        InspectionRecord {
            address: format!("{start} Bay Street, Glebe NSW 2037"),
            date: "2025-10-04".to_string(),
            start_time: start.to_string(),
            end_time: start.to_string(),
            property_details: None,
        }
    }

    #[test]
    fn render_lists_slots_and_ranked_recommendations() {
        let query = InspectionQuery::new(
            "9 Bay Street, Glebe, 2037",
            NaiveDate::from_ymd_opt(2025, 10, 4).expect("valid date"),
        );
        let source = StaticInspectionSource::new(vec![
            record("09:00"),
            record("09:10"),
            record("10:30"),
        ]);
        let sourced = SourcedInspections {
            records: source.fetch(&query).expect("static fetch"),
            data_source: source.source_name(),
        };
        let criteria = SimilarityCriteria::default();
        let analysis =
            CompetitionAnalysis::run(&sourced.records, &criteria, &TimeWindow::hours(9, 11));

        let mut out = Vec::new();
        render_analysis(&mut out, &query, &criteria, &sourced, &analysis).expect("render");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("Open home competition for 9 Bay Street, Glebe, 2037"));
        assert!(text.contains("suburb glebe (2037) | data source static"));
        assert!(text.contains("Similar listings: 3 of 3 (100%)"));
        assert!(text.contains("- 09:00 |  2 | low       | ##"));
        assert!(text.contains("1. 09:30 (0 competing, low)"));
        assert!(text.contains("Busiest slot: 09:00"));
    }

    #[test]
    fn date_argument_uses_library_parser() {
        assert_eq!(
            date_arg(" 2025-10-04 "),
            Ok(NaiveDate::from_ymd_opt(2025, 10, 4).expect("valid date"))
        );
        assert_eq!(
            date_arg("tomorrow"),
            Err("invalid date 'tomorrow': expected YYYY-MM-DD".to_string())
        );
    }

    #[test]
    fn inverted_window_has_no_recommendations() {
        let query = InspectionQuery::new(
            "Glebe",
            NaiveDate::from_ymd_opt(2025, 10, 4).expect("valid date"),
        );
        let sourced = SourcedInspections {
            records: vec![record("10:00")],
            data_source: "static",
        };
        let criteria = SimilarityCriteria::any();
        let window = TimeWindow::parse("16:00", "09:00").expect("parses");
        let analysis = CompetitionAnalysis::run(&sourced.records, &criteria, &window);

        let mut out = Vec::new();
        render_analysis(&mut out, &query, &criteria, &sourced, &analysis).expect("render");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("Recommended times: none"));
        assert!(!text.contains("Busiest slot"));
        assert!(text.contains("Average per slot: 0.0"));
    }
}
