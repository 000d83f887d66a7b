//! Geographic feature ingestion and coverage against the case data.
//!
//! The renderer binds county geometry by a feature id that must compare
//! equal to the case data's region key after normalization. Feature ids in
//! the wild come as strings or bare numbers, with or without leading
//! zeros; everything funnels through [`RegionKey`] here.

use serde::Deserialize;
use serde_json::Value;

use crate::aggregate::CaseSeries;
use crate::normalize::RegionKey;

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<Value>,
}

/// How the feature set and the case data line up.
#[derive(Debug, Clone, Default)]
pub struct CoverageReport {
    pub matched: usize,
    /// Features whose id never appears in the case data.
    pub features_without_data: Vec<RegionKey>,
    /// Regions observed in the case data with no feature to paint.
    pub regions_without_feature: Vec<RegionKey>,
}

fn id_to_key(id: &Value) -> Option<RegionKey> {
    match id {
        Value::String(s) if !s.trim().is_empty() => Some(RegionKey::new(s)),
        Value::Number(n) => Some(RegionKey::new(&n.to_string())),
        _ => None,
    }
}

/// Extracts normalized region keys from a GeoJSON-style feature collection.
/// Features without a usable id are skipped.
pub fn parse_feature_ids(json: &str) -> Result<Vec<RegionKey>, serde_json::Error> {
    let collection: FeatureCollection = serde_json::from_str(json)?;
    Ok(collection
        .features
        .iter()
        .filter_map(|f| f.id.as_ref().and_then(id_to_key))
        .collect())
}

/// Compares a feature id set against the regions the aggregator saw.
pub fn coverage(features: &[RegionKey], series: &CaseSeries) -> CoverageReport {
    let mut report = CoverageReport::default();
    for key in features {
        if series.regions().contains(key) {
            report.matched += 1;
        } else {
            report.features_without_data.push(key.clone());
        }
    }
    for region in series.regions() {
        if !features.contains(region) {
            report.regions_without_feature.push(region.clone());
        }
    }
    report
}
