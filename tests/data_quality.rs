use std::fs;
use std::path::Path;

use chronomap::data::{analyze_csv, load_rows};
use chronomap::normalize::{normalize, RegionKey};
use tempfile::TempDir;

fn write_csv(path: &Path, header: &str, rows: &[&str]) {
    let mut out = String::new();
    out.push_str(header);
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    fs::write(path, out).unwrap();
}

const NYT_HEADER: &str = "date,county,state,fips,cases,deaths";

#[test]
fn manifest_counts_rows_and_spans_dates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cases.csv");
    write_csv(
        &path,
        NYT_HEADER,
        &[
            "2020-01-21,Snohomish,Washington,53061,1,0",
            "2020-01-22,Snohomish,Washington,53061,1,0",
            "2020-01-23,Unknown,Washington,,1,0",
        ],
    );
    let manifest = analyze_csv(&path).unwrap();
    assert_eq!(manifest.row_count, 3);
    assert_eq!(manifest.bad_rows, 1);
    assert_eq!(manifest.date_min.as_deref(), Some("2020-01-21"));
    assert_eq!(manifest.date_max.as_deref(), Some("2020-01-22"));
    assert_eq!(manifest.hash_sha256.len(), 64);
}

#[test]
fn manifest_rejects_missing_columns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.csv");
    write_csv(&path, "date,county,state", &["2020-01-21,Snohomish,Washington"]);
    let err = analyze_csv(&path).unwrap_err();
    assert!(err.contains("missing_column"));
}

#[test]
fn load_maps_columns_by_header_position() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reordered.csv");
    write_csv(
        &path,
        "fips,cases,date",
        &["53061,12,2020-01-21", "1001,3,2020-01-22"],
    );
    let rows = load_rows(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].region, "53061");
    assert_eq!(rows[0].cases, "12");
    assert_eq!(rows[1].date, "2020-01-22");
}

#[test]
fn load_then_normalize_pads_and_counts_skips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cases.csv");
    write_csv(
        &path,
        NYT_HEADER,
        &[
            "2020-01-21,Autauga,Alabama,1001,5,0",
            "2020-01-22,Unknown,Alabama,,7,0",
            "not-a-date,Autauga,Alabama,1001,9,0",
        ],
    );
    let rows = load_rows(&path).unwrap();
    let report = normalize(&rows);
    assert_eq!(report.accepted, 1);
    assert_eq!(report.skipped_missing_region, 1);
    assert_eq!(report.skipped_bad_date, 1);
    assert_eq!(report.observations[0].region, RegionKey::new("01001"));
    assert_eq!(report.observations[0].cumulative, 5);
}
