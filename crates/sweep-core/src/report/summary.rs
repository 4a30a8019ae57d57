use crate::report::RunReport;

/// One-line human summary printed at the end of a run.
pub fn summary_line(report: &RunReport) -> String {
    let errors = report.error_count();
    format!(
        "Session '{}': {} examples x {} repetitions on dataset '{}' ({} outcomes, {} errors)",
        report.session_name,
        report.processed,
        report.repetitions,
        report.dataset_name,
        report.outcome_count(),
        errors
    )
}
