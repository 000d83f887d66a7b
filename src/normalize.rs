//! Raw-row validation and canonicalization.
//!
//! Case data arrives as loosely typed CSV rows: a date string, a region
//! identifier that may be missing or unpadded, and a cumulative count that
//! may not parse. Normalization is lossy but never fatal - bad rows are
//! counted and dropped, the batch survives.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Width of a canonical region identifier (state FIPS + county FIPS).
pub const REGION_KEY_WIDTH: usize = 5;

/// A county-level region identifier, left-zero-padded to 5 characters.
///
/// CSV exports frequently strip leading zeros ("1001" for Autauga County,
/// AL), while geographic feature data carries the padded form ("01001").
/// Both must normalize to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionKey(String);

impl RegionKey {
    pub fn new(raw: &str) -> Self {
        Self(format!("{:0>width$}", raw.trim(), width = REGION_KEY_WIDTH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row as it comes off the wire, before validation.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub date: String,
    pub region: String,
    pub cases: String,
}

/// A validated observation: cumulative case count for one region on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub date: NaiveDate,
    pub region: RegionKey,
    pub cumulative: i64,
}

/// Outcome of normalizing a batch, with per-reason skip counts.
#[derive(Debug, Default, Serialize)]
pub struct NormalizeReport {
    #[serde(skip)]
    pub observations: Vec<Observation>,
    pub accepted: u64,
    pub skipped_missing_region: u64,
    pub skipped_bad_date: u64,
}

/// Validates and canonicalizes a batch of raw rows.
///
/// Rows with an empty region identifier or an unparseable date are dropped
/// and counted. A cumulative count that fails to parse as a non-negative
/// integer is coerced to zero rather than failing the row.
pub fn normalize(rows: &[RawRow]) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    for row in rows {
        if row.region.trim().is_empty() {
            report.skipped_missing_region += 1;
            continue;
        }
        let date = match NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                report.skipped_bad_date += 1;
                continue;
            }
        };
        let cumulative = row
            .cases
            .trim()
            .parse::<i64>()
            .unwrap_or(0)
            .max(0);
        report.observations.push(Observation {
            date,
            region: RegionKey::new(&row.region),
            cumulative,
        });
        report.accepted += 1;
    }

    report
}
