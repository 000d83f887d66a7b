//! Prints the dataset manifest and normalization report for a case CSV.

use std::path::Path;

use anyhow::{anyhow, Result};
use chronomap::{data, normalize};

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./us-counties.csv".to_string());
    let path = Path::new(&path);

    let manifest = data::analyze_csv(path).map_err(|e| anyhow!(e))?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);

    let rows = data::load_rows(path).map_err(|e| anyhow!(e))?;
    let report = normalize::normalize(&rows);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
