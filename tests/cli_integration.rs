// CLI integration tests driving `osrm-marshal` against a fixture dataset.
use std::io::Write;
use std::process::Command;

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_osrm-marshal");
    Command::new(exe)
}

fn dataset(algorithm: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        r#"{{"name":"berlin","algorithm":"{algorithm}","bounds":[13.0,52.3,13.8,52.7],"speed_kmh":36.0}}"#
    )
    .expect("write dataset");
    file
}

/// Log lines may precede the payload on stderr; the JSON document is always last.
fn parse_json(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().last().expect("json line");
    serde_json::from_str(line).expect("valid json")
}

#[test]
fn route_prints_engine_json() {
    let data = dataset("MLD");
    let output = cmd()
        .arg("--data")
        .arg(data.path())
        .args(["route", "13.388,52.517;13.397,52.529", "--steps"])
        .output()
        .expect("route");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let body = parse_json(&output.stdout);
    assert_eq!(body["code"], "Ok");
    assert_eq!(body["routes"].as_array().expect("routes").len(), 1);
    assert!(body["routes"][0]["legs"][0]["steps"].as_array().is_some());
    assert_eq!(body["waypoints"].as_array().expect("waypoints").len(), 2);
}

#[test]
fn table_prints_requested_matrix() {
    let data = dataset("MLD");
    let output = cmd()
        .arg("--data")
        .arg(data.path())
        .args([
            "table",
            "13.388,52.517;13.397,52.529;13.428,52.523",
            "--sources",
            "0",
            "--annotations",
            "distance",
        ])
        .output()
        .expect("table");
    assert!(output.status.success());
    let body = parse_json(&output.stdout);
    assert!(body.get("durations").is_none());
    let distances = body["distances"].as_array().expect("distances");
    assert_eq!(distances.len(), 1);
    assert_eq!(distances[0].as_array().expect("row").len(), 3);
}

#[test]
fn nearest_returns_requested_count() {
    let data = dataset("CH");
    let output = cmd()
        .arg("--data")
        .arg(data.path())
        .args(["--algorithm", "ch", "nearest", "13.388,52.517", "--number", "3"])
        .output()
        .expect("nearest");
    assert!(output.status.success());
    let body = parse_json(&output.stdout);
    assert_eq!(body["waypoints"].as_array().expect("waypoints").len(), 3);
}

#[test]
fn engine_failure_goes_to_stderr_as_json() {
    let data = dataset("MLD");
    let output = cmd()
        .arg("--data")
        .arg(data.path())
        .args(["route", "13.388,52.517;2.35,48.85"])
        .output()
        .expect("route");
    assert_eq!(output.status.code(), Some(6));
    assert!(output.stdout.is_empty());
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Engine");
    assert_eq!(
        err["error"]["message"],
        "Could not find a matching segment for coordinate 1"
    );
}

#[test]
fn mismatched_match_radiuses_are_a_validation_error() {
    let data = dataset("MLD");
    let output = cmd()
        .arg("--data")
        .arg(data.path())
        .args([
            "match",
            "13.388,52.517;13.389,52.518;13.390,52.519",
            "--radiuses",
            "5,5",
        ])
        .output()
        .expect("match");
    assert_eq!(output.status.code(), Some(4));
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Validation");
    assert_eq!(
        err["error"]["message"],
        "num_radiuses must equal num_coordinates"
    );
}

#[test]
fn missing_dataset_is_a_construction_error() {
    let output = cmd()
        .args([
            "--data",
            "/nonexistent/osrm-marshal.json",
            "trip",
            "13.388,52.517;13.397,52.529",
        ])
        .output()
        .expect("trip");
    assert_eq!(output.status.code(), Some(5));
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Construction");
}

#[test]
fn algorithm_mismatch_is_reported() {
    let data = dataset("MLD");
    let output = cmd()
        .arg("--data")
        .arg(data.path())
        .args(["--algorithm", "ch", "trip", "13.388,52.517;13.397,52.529"])
        .output()
        .expect("trip");
    assert_eq!(output.status.code(), Some(5));
    let err = parse_json(&output.stderr);
    let message = err["error"]["message"].as_str().expect("message");
    assert!(message.contains("prepared for MLD"), "{message}");
}

#[test]
fn malformed_coordinates_are_a_usage_error() {
    let data = dataset("MLD");
    let output = cmd()
        .arg("--data")
        .arg(data.path())
        .args(["route", "13.388;52.517"])
        .output()
        .expect("route");
    assert_eq!(output.status.code(), Some(2));
    let err = parse_json(&output.stderr);
    assert_eq!(err["error"]["kind"], "Usage");
}
