//! Time-series aggregation: per-region cumulative counts in, per-date
//! derived metric maps out.
//!
//! All derived maps share one index, the date axis. A region absent from a
//! date's map simply has no signal there; readers treat the value as zero.
//!
//! Deltas are not clamped. Source data is revised downward from time to
//! time, and a negative daily delta is real signal that must stay visible.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

use crate::normalize::{Observation, RegionKey};

/// Trailing window for the rolling sum, in series entries (one per reporting day).
pub const DEFAULT_ROLLING_WINDOW: usize = 30;

/// Fatal initialization failure: nothing usable to aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataError(pub String);

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data error: {}", self.0)
    }
}

impl std::error::Error for DataError {}

/// Region-keyed values for a single date and metric kind.
pub type MetricMap = HashMap<RegionKey, i64>;

/// The aggregator's full output: the shared date axis, three date-indexed
/// metric map collections, and the scalar maxima bounding color mappings.
/// Built once per session; immutable afterwards.
#[derive(Debug, Clone)]
pub struct CaseSeries {
    /// Strictly increasing distinct dates across all regions.
    pub axis: Vec<NaiveDate>,
    /// Daily new cases (cumulative[i] - cumulative[i-1], 0 at a region's first entry).
    pub daily: HashMap<NaiveDate, MetricMap>,
    /// Cumulative snapshot as reported.
    pub cumulative: HashMap<NaiveDate, MetricMap>,
    /// Trailing sum of daily deltas over the last `window` entries,
    /// clipped at the region's own series start.
    pub rolling: HashMap<NaiveDate, MetricMap>,
    /// Largest daily delta anywhere in the series.
    pub daily_max: i64,
    /// Largest cumulative snapshot anywhere in the series.
    pub cumulative_max: i64,
    pub window: usize,
    regions: BTreeSet<RegionKey>,
}

impl CaseSeries {
    pub fn build(observations: Vec<Observation>) -> Result<Self, DataError> {
        Self::build_with_window(observations, DEFAULT_ROLLING_WINDOW)
    }

    pub fn build_with_window(
        observations: Vec<Observation>,
        window: usize,
    ) -> Result<Self, DataError> {
        if observations.is_empty() {
            return Err(DataError(
                "no usable observations after normalization".to_string(),
            ));
        }

        let mut by_region: HashMap<RegionKey, Vec<(NaiveDate, i64)>> = HashMap::new();
        for obs in observations {
            by_region
                .entry(obs.region)
                .or_default()
                .push((obs.date, obs.cumulative));
        }

        let mut axis_set: BTreeSet<NaiveDate> = BTreeSet::new();
        let mut daily: HashMap<NaiveDate, MetricMap> = HashMap::new();
        let mut cumulative: HashMap<NaiveDate, MetricMap> = HashMap::new();
        let mut rolling: HashMap<NaiveDate, MetricMap> = HashMap::new();
        let mut regions = BTreeSet::new();

        for (region, mut series) in by_region {
            // Stable sort: duplicate dates keep arrival order.
            series.sort_by_key(|(date, _)| *date);

            for (i, &(date, cum)) in series.iter().enumerate() {
                axis_set.insert(date);
                let delta = if i == 0 { 0 } else { cum - series[i - 1].1 };
                // History before the series start counts as zero cumulative,
                // so early entries roll up to the snapshot itself.
                let window_floor = if i >= window { series[i - window].1 } else { 0 };
                let trailing = cum - window_floor;

                daily.entry(date).or_default().insert(region.clone(), delta);
                cumulative
                    .entry(date)
                    .or_default()
                    .insert(region.clone(), cum);
                rolling
                    .entry(date)
                    .or_default()
                    .insert(region.clone(), trailing);
            }
            regions.insert(region);
        }

        let max_of = |maps: &HashMap<NaiveDate, MetricMap>| {
            maps.values()
                .flat_map(|m| m.values())
                .copied()
                .max()
                .unwrap_or(0)
        };
        let daily_max = max_of(&daily);
        let cumulative_max = max_of(&cumulative);

        Ok(Self {
            axis: axis_set.into_iter().collect(),
            daily,
            cumulative,
            rolling,
            daily_max,
            cumulative_max,
            window,
            regions,
        })
    }

    pub fn last_index(&self) -> usize {
        self.axis.len() - 1
    }

    pub fn date_at(&self, index: usize) -> Option<NaiveDate> {
        self.axis.get(index).copied()
    }

    /// Every region with at least one observation.
    pub fn regions(&self) -> &BTreeSet<RegionKey> {
        &self.regions
    }
}
