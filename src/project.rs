//! View projection: (date index, view mode) -> metric map + color bound.

use chrono::NaiveDate;
use std::sync::OnceLock;

use crate::aggregate::{CaseSeries, MetricMap};
use crate::playback::ViewMode;

/// Everything a renderer needs for one displayed date.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub date: NaiveDate,
    pub values: &'a MetricMap,
    /// Upper bound for the color mapping in this mode.
    pub max_bound: i64,
    pub mode: ViewMode,
}

fn empty_map() -> &'static MetricMap {
    static EMPTY: OnceLock<MetricMap> = OnceLock::new();
    EMPTY.get_or_init(MetricMap::new)
}

/// Pure read of the aggregator's output. Always succeeds: an index past the
/// axis clamps to the last date, and a date with no entry yields an empty
/// map rather than an error.
pub fn project(series: &CaseSeries, index: usize, mode: ViewMode) -> Frame<'_> {
    let date = series
        .date_at(index)
        .unwrap_or_else(|| series.axis[series.last_index()]);
    let (maps, max_bound) = match mode {
        ViewMode::Daily => (&series.daily, series.daily_max),
        ViewMode::Cumulative => (&series.cumulative, series.cumulative_max),
    };
    Frame {
        date,
        values: maps.get(&date).unwrap_or_else(|| empty_map()),
        max_bound,
        mode,
    }
}
