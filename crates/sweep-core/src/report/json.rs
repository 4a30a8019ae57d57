use crate::report::RunReport;
use std::path::Path;

/// Write the result map and run metadata as pretty JSON.
pub fn write_json(report: &RunReport, out: &Path) -> anyhow::Result<()> {
    let v = serde_json::json!({
        "session_name": report.session_name,
        "dataset": {
            "id": report.dataset_id,
            "name": report.dataset_name,
        },
        "predictor": report.predictor,
        "repetitions": report.repetitions,
        "processed": report.processed,
        "results": report.results,
    });
    std::fs::write(out, serde_json::to_string_pretty(&v)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExampleId, Outcome, ResultMap};

    #[test]
    fn writes_results_keyed_by_example() {
        let mut results = ResultMap::new();
        results.insert(
            ExampleId::from("a"),
            vec![Outcome::Output(serde_json::json!("x")), Outcome::error("boom")],
        );
        let report = RunReport {
            session_name: "qa-echo-2".into(),
            dataset_id: "ds-1".into(),
            dataset_name: "qa".into(),
            predictor: "echo".into(),
            repetitions: 2,
            processed: 1,
            completion_order: vec![ExampleId::from("a")],
            results,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        write_json(&report, &path).unwrap();

        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["session_name"], "qa-echo-2");
        assert_eq!(v["results"]["a"][0], "x");
        assert_eq!(v["results"]["a"][1]["Error"], "boom");
    }
}
