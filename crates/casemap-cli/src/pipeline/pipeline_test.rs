use std::path::Path;

use casemap_core::Environment;
use chrono::{Datelike, Days};
use serde_json::{json, Value};

use super::*;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 9, 17).unwrap()
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Config pointing every table at files inside `dir`.
fn fixture_config(dir: &Path) -> AppConfig {
    let names = write(dir, "names.json", r#"{"California": "CA", "Texas": "TX"}"#);
    let codes = write(
        dir,
        "codes.json",
        r#"{"CA": "California", "TX": "Texas", "NY": ["New York", "N.Y."]}"#,
    );
    let corrections = write(
        dir,
        "corrections.yaml",
        "corrections:\n  - date: 2020-09-30\n    scope: TX\n    delta: -700\n    source: ctp\n    note: county backlog\n",
    );
    let boundary = json!({
        "type": "Topology",
        "arcs": [],
        "objects": {
            "states": {
                "type": "GeometryCollection",
                "geometries": [
                    { "type": "Polygon", "arcs": [], "properties": { "st": "CA" } },
                    { "type": "Polygon", "arcs": [], "properties": { "st": "TX" } }
                ]
            }
        }
    });
    let boundary = write(dir, "states.topo.json", &boundary.to_string());

    AppConfig {
        env: Environment::Test,
        log_level: "info".to_string(),
        data_dir: dir.join("data"),
        region_names_path: names,
        region_codes_path: codes,
        boundary_path: boundary,
        boundary_key: "st".to_string(),
        population_path: None,
        corrections_path: corrections,
        request_timeout_secs: 5,
        user_agent: "casemap-test/0.1".to_string(),
        ctp_url: "http://127.0.0.1:1/unused".to_string(),
        jhu_url: "http://127.0.0.1:1/unused".to_string(),
        cdc_url: "http://127.0.0.1:1/unused".to_string(),
        cdc_app_token: None,
        cdc_row_limit: 5000,
    }
}

/// Fourteen days of CTP rows for CA and TX at 100 a day, plus one row for
/// an unknown region and one with an unreadable date.
fn write_ctp_input(dir: &Path) -> PathBuf {
    let mut rows = Vec::new();
    for i in 0..14 {
        let date = start() + Days::new(i);
        let compact = date.year() * 10_000 + i32::try_from(date.month() * 100 + date.day()).unwrap();
        for state in ["CA", "TX"] {
            rows.push(json!({ "date": compact, "state": state, "positiveIncrease": 100 }));
        }
    }
    rows.push(json!({ "date": 20_200_930, "state": "ZZ", "positiveIncrease": 5 }));
    rows.push(json!({ "date": "last tuesday", "state": "CA", "positiveIncrease": 5 }));
    write(dir, "ctp.json", &Value::Array(rows).to_string())
}

fn args(input: PathBuf) -> RunArgs {
    RunArgs {
        source: SourceKind::Ctp,
        input: Some(input),
        as_of: None,
        out_dir: None,
        qa_csv: false,
        dry_run: false,
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn full_run_writes_three_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let input = write_ctp_input(dir.path());

    let summary = run_pipeline(&config, &args(input)).await.unwrap();

    assert_eq!(summary.observations, 28);
    assert_eq!(summary.regions, 2);
    assert_eq!(summary.omitted, 0);
    assert_eq!(summary.corrections_applied, 1);
    assert_eq!(summary.dropped.unknown_region, 1);
    assert_eq!(summary.dropped.unparseable_date, 1);
    assert_eq!(summary.latest, NaiveDate::from_ymd_opt(2020, 9, 30));
    assert_eq!(summary.written.len(), 3);

    let data = config.data_dir;
    let national = read_json(&data.join("usData.json"));
    assert_eq!(national.as_array().unwrap().len(), 14);
    assert_eq!(national[0]["date"], "2020-09-17");
    assert_eq!(national[13]["cases"], -500);

    let regions = read_json(&data.join("stateData.json"));
    assert_eq!(regions[0]["state"], "CA");
    assert_eq!(regions[0]["change"], 0.0);
    assert_eq!(regions[1]["state"], "TX");
    assert_eq!(regions[1]["currAvg"], 0.0);
    assert_eq!(regions[1]["change"], -100.0);

    let topo = read_json(&data.join("stateTopo.json"));
    let geometries = &topo["objects"]["states"]["geometries"];
    assert_eq!(geometries[0]["properties"]["currAvg"], 100.0);
    assert_eq!(geometries[1]["properties"]["prevDate"], "2020-09-23");
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let mut run = args(write_ctp_input(dir.path()));
    run.dry_run = true;

    let summary = run_pipeline(&config, &run).await.unwrap();

    assert!(summary.written.is_empty());
    assert!(!config.data_dir.exists());
    assert!(summary.to_string().ends_with("nothing written"));
}

#[tokio::test]
async fn qa_csv_lands_next_to_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let out = dir.path().join("elsewhere");
    let mut run = args(write_ctp_input(dir.path()));
    run.qa_csv = true;
    run.out_dir = Some(out.clone());

    let summary = run_pipeline(&config, &run).await.unwrap();

    assert_eq!(summary.written.len(), 4);
    let sheet = std::fs::read_to_string(out.join("Sept. 30 case growth.csv")).unwrap();
    assert!(sheet.starts_with("state,9/17/20,"));
    assert!(!config.data_dir.exists());
}

#[tokio::test]
async fn as_of_short_of_two_windows_omits_regions() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let mut run = args(write_ctp_input(dir.path()));
    run.as_of = NaiveDate::from_ymd_opt(2020, 9, 29);

    let summary = run_pipeline(&config, &run).await.unwrap();

    assert_eq!(summary.regions, 0);
    assert_eq!(summary.omitted, 2);
    assert_eq!(summary.corrections_applied, 0);
    let national = read_json(&config.data_dir.join("usData.json"));
    assert_eq!(national.as_array().unwrap().len(), 13);
}

#[tokio::test]
async fn missing_input_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());

    let result = run_pipeline(&config, &args(dir.path().join("absent.json"))).await;

    assert!(result.is_err());
    assert!(!config.data_dir.exists());
}

#[tokio::test]
async fn unreachable_source_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let mut run = args(PathBuf::new());
    run.input = None;

    let result = run_pipeline(&config, &run).await;

    assert!(result.is_err());
    assert!(!config.data_dir.exists());
}

#[tokio::test]
async fn unsupported_boundary_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture_config(dir.path());
    config.boundary_path = write(dir.path(), "point.json", r#"{"type": "Point"}"#);

    let result = run_pipeline(&config, &args(write_ctp_input(dir.path()))).await;

    assert!(result.is_err());
    assert!(!config.data_dir.exists());
}

#[tokio::test]
async fn nothing_usable_after_normalization_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let config = fixture_config(dir.path());
    let input = write(
        dir.path(),
        "fooland.json",
        r#"[{"date": 20200922, "state": "Fooland", "positiveIncrease": 9}]"#,
    );

    let err = run_pipeline(&config, &args(input)).await.unwrap_err();

    assert!(err.to_string().contains("unknown region: 1"), "got: {err}");
    assert!(!config.data_dir.exists());
}
