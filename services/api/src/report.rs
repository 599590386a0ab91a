use chrono::Local;
use clap::Args;
use std::io::{self, Write};
use std::path::PathBuf;
use ta_planner::config::AppConfig;
use ta_planner::error::AppError;
use ta_planner::workflows::analysis::{
    compute_report, AnalysisError, AnalysisReport, NeedWeights,
};
use ta_planner::workflows::datasets::{DatasetImporter, DatasetKind, StagedDatasets};

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Students and classes export (CSV)
    #[arg(long)]
    pub(crate) enrolment: PathBuf,
    /// Students and SEN export (CSV)
    #[arg(long)]
    pub(crate) needs: PathBuf,
    /// Timetable export (CSV)
    #[arg(long)]
    pub(crate) timetable: PathBuf,
    /// Rows shown per ranked list (defaults to APP_REPORT_LIMIT)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Drop classes larger than this (whole-year assemblies)
    #[arg(long)]
    pub(crate) max_class_size: Option<usize>,
    /// Time slot fragment to leave out of the analysis; repeatable
    #[arg(long)]
    pub(crate) exclude_slot: Vec<String>,
    /// Emit the full report as JSON instead of the text summary
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let mut policy = config.analysis.aggregation_policy();
    if args.max_class_size.is_some() {
        policy.max_class_size = args.max_class_size;
    }
    policy.excluded_time_slots.extend(args.exclude_slot);
    let limit = args.limit.unwrap_or(config.analysis.report_limit);

    let mut staged = StagedDatasets::default();
    for (kind, path) in [
        (DatasetKind::StudentsClasses, &args.enrolment),
        (DatasetKind::StudentsSen, &args.needs),
        (DatasetKind::Timetable, &args.timetable),
    ] {
        let (dataset, _rows) = DatasetImporter::from_path(kind, path)?;
        staged = staged.with_dataset(dataset);
    }
    let snapshot = staged.snapshot().map_err(AnalysisError::MissingDataset)?;

    let report = compute_report(&snapshot, &NeedWeights::default(), &policy);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        let body = serde_json::to_string_pretty(&report).map_err(io::Error::from)?;
        writeln!(out, "{body}")?;
    } else {
        render_report(&report, limit, &mut out)?;
    }
    Ok(())
}

pub(crate) fn render_report<W: Write>(
    report: &AnalysisReport,
    limit: usize,
    out: &mut W,
) -> io::Result<()> {
    let statistics = &report.statistics;

    writeln!(out, "TA deployment analysis")?;
    writeln!(out, "Generated {}", Local::now().format("%Y-%m-%d %H:%M"))?;

    writeln!(out, "\nSummary")?;
    writeln!(
        out,
        "- {} students across {} classes ({} excluded)",
        statistics.total_students, statistics.total_classes, statistics.excluded_classes
    )?;
    writeln!(
        out,
        "- Needs: {} none | {} low | {} medium | {} high",
        statistics.no_needs, statistics.low_needs, statistics.medium_needs, statistics.high_needs
    )?;
    writeln!(
        out,
        "- Average score {:.2} | max {} | average class score {:.2}",
        statistics.average_score, statistics.max_score, statistics.average_class_score
    )?;
    if statistics.unmatched_students > 0 {
        writeln!(
            out,
            "- {} enrolled students have no needs record and score zero",
            statistics.unmatched_students
        )?;
    }

    writeln!(out, "\nTop students")?;
    for (rank, student) in report.student_prefix(Some(limit)).iter().enumerate() {
        writeln!(
            out,
            "{:>3}. {} | {} ({}) | {}",
            rank + 1,
            student.name,
            student.score,
            student.band.label(),
            student.breakdown
        )?;
    }

    writeln!(out, "\nTop classes")?;
    for (rank, class) in report.class_prefix(Some(limit)).iter().enumerate() {
        writeln!(
            out,
            "{:>3}. {} | weighted {} ({}) | {} students, {} high need, avg {:.2}",
            rank + 1,
            class.class_code,
            class.weighted_score,
            class.priority.label(),
            class.student_count,
            class.high_need_students,
            class.average_need_score
        )?;
    }

    if report.timetable_grid.is_empty() {
        writeln!(out, "\nTimetable grid: no sessions")?;
    } else {
        writeln!(out, "\nTimetable grid")?;
        for slot in &report.timetable_grid {
            writeln!(out, "{}", slot.time_slot)?;
            for entry in &slot.entries {
                writeln!(
                    out,
                    "  - {} {} | {} | {} | {} students | weighted {} ({})",
                    entry.day,
                    entry.class_code,
                    entry.staff,
                    entry.room,
                    entry.student_count,
                    entry.weighted_score,
                    entry.priority.label()
                )?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ta_planner::workflows::analysis::AggregationPolicy;

    fn sample_report() -> AnalysisReport {
        let mut staged = StagedDatasets::default();
        for (kind, body) in [
            (
                DatasetKind::StudentsClasses,
                "Name,Classes\nAda Byron,\"8A/Ma1, 8A/Sc2\"\nAlan Turing,8A/Ma1\nGrace Hopper,8A/Sc2\n",
            ),
            (
                DatasetKind::StudentsSen,
                "Name,Pupil Premium,Looked After,SEN,SEN need(s),EAL,Reading Score,Spelling Score,BOXALL,Medical Information,Stage 1\nAda Byron,Yes,Yes,Yes,Autism,No,,,,,\nAlan Turing,No,,No,,Yes,,,,,\n",
            ),
            (
                DatasetKind::Timetable,
                "Day,Time Slot,Class Code,Staff,Room\nFriday,14:00 - 15:00,8A/Sc2,PRT,S1\n",
            ),
        ] {
            let (dataset, _) =
                DatasetImporter::from_reader(kind, body.as_bytes()).expect("fixture imports");
            staged = staged.with_dataset(dataset);
        }
        let snapshot = staged.snapshot().expect("complete snapshot");
        compute_report(
            &snapshot,
            &NeedWeights::default(),
            &AggregationPolicy::default(),
        )
    }

    #[test]
    fn text_report_respects_the_limit() {
        let report = sample_report();
        let mut out = Vec::new();
        render_report(&report, 1, &mut out).expect("rendered");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("  1. Ada Byron | 8 (high) | Pupil Premium: +2; Looked After: +3; SEN (1 need): +3"));
        assert!(!text.contains("2. Alan Turing"));
        assert!(text.contains("  1. 8A/Ma1 | weighted 9 (low)"));
        assert!(text.contains("- 1 enrolled students have no needs record"));
        assert!(text.contains("  - Friday 8A/Sc2 | PRT | S1 | 2 students | weighted 8 (low)"));
    }
}
