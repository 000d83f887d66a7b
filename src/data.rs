//! Case dataset loading and audit manifest.
//!
//! The case file is the NYT-style county CSV: `date,county,state,fips,cases`
//! columns in any order, one row per county per day, cases cumulative. The
//! manifest records enough (content hash, row counts, date span) to tell two
//! runs apart and to spot a truncated or stale download.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::normalize::RawRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub path: String,
    pub hash_sha256: String,
    pub row_count: u64,
    pub bad_rows: u64,
    pub date_min: Option<String>,
    pub date_max: Option<String>,
    pub columns: Vec<String>,
    pub warnings: Vec<String>,
    pub generated_at_epoch: u64,
}

/// Column positions resolved from a header line.
#[derive(Debug, Clone, Copy)]
struct Layout {
    date: usize,
    fips: usize,
    cases: usize,
}

fn resolve_layout(header: &[&str]) -> Result<Layout, String> {
    let find = |name: &str| {
        header
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("missing_column: {}", name))
    };
    Ok(Layout {
        date: find("date")?,
        fips: find("fips")?,
        cases: find("cases")?,
    })
}

/// Reads raw rows from a case CSV. Short rows yield empty fields and are
/// left for the normalizer to count and drop.
pub fn load_rows(path: &Path) -> Result<Vec<RawRow>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let reader = BufReader::new(file);
    let mut rows = Vec::new();
    let mut layout: Option<Layout> = None;

    for line in reader.lines() {
        let line = line.map_err(|e| e.to_string())?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split(',').collect();
        match layout {
            None => layout = Some(resolve_layout(&fields)?),
            Some(l) => {
                let get = |i: usize| fields.get(i).map(|s| s.to_string()).unwrap_or_default();
                rows.push(RawRow {
                    date: get(l.date),
                    region: get(l.fips),
                    cases: get(l.cases),
                });
            }
        }
    }

    if layout.is_none() {
        return Err("missing_header".to_string());
    }
    Ok(rows)
}

/// Scans a case CSV without materializing rows, producing an audit manifest.
pub fn analyze_csv(path: &Path) -> Result<DatasetManifest, String> {
    let hash = file_sha256(path)?;
    let file = File::open(path).map_err(|e| e.to_string())?;
    let reader = BufReader::new(file);

    let mut row_count = 0u64;
    let mut bad_rows = 0u64;
    let mut date_min: Option<String> = None;
    let mut date_max: Option<String> = None;
    let mut warnings = Vec::new();
    let mut columns: Vec<String> = Vec::new();
    let mut layout: Option<Layout> = None;

    for line in reader.lines().map_while(Result::ok) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split(',').collect();
        let l = match layout {
            None => {
                columns = fields.iter().map(|s| s.trim().to_string()).collect();
                match resolve_layout(&fields) {
                    Ok(l) => {
                        layout = Some(l);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }
            Some(l) => l,
        };

        row_count += 1;
        let date = fields.get(l.date).map(|s| s.trim()).unwrap_or("");
        let ok_date = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok();
        let fips = fields.get(l.fips).map(|s| s.trim()).unwrap_or("");
        if !ok_date || fips.is_empty() {
            bad_rows += 1;
            continue;
        }
        let date = date.to_string();
        if date_min.as_deref().map(|m| date.as_str() < m).unwrap_or(true) {
            date_min = Some(date.clone());
        }
        if date_max.as_deref().map(|m| date.as_str() > m).unwrap_or(true) {
            date_max = Some(date);
        }
    }

    if row_count == 0 {
        warnings.push("no_data_rows".to_string());
    }
    if bad_rows > 0 {
        warnings.push(format!("bad_rows: {}", bad_rows));
    }

    Ok(DatasetManifest {
        path: path.display().to_string(),
        hash_sha256: hash,
        row_count,
        bad_rows,
        date_min,
        date_max,
        columns,
        warnings,
        generated_at_epoch: chrono::Utc::now().timestamp() as u64,
    })
}

pub fn file_sha256(path: &Path) -> Result<String, String> {
    let mut file = File::open(path).map_err(|e| e.to_string())?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(|e| e.to_string())?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
