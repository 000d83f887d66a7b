//! Fixed-window averages of daily new cases over named historical waves.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::aggregate::CaseSeries;
use crate::normalize::RegionKey;

/// A closed date interval with a display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveWindow {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WaveWindow {
    pub fn new(label: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            label: label.to_string(),
            start,
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Per-region mean of daily deltas over one window.
#[derive(Debug, Clone)]
pub struct WaveAverage {
    pub window: WaveWindow,
    pub values: HashMap<RegionKey, f64>,
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // Literal calendar dates, known valid.
    NaiveDate::from_ymd_opt(year, month, day).expect("valid literal date")
}

/// The three historical surge windows.
pub fn default_windows() -> Vec<WaveWindow> {
    vec![
        WaveWindow::new("Spring 2020 Surge", ymd(2020, 3, 1), ymd(2020, 5, 31)),
        WaveWindow::new("Summer 2020 Surge", ymd(2020, 6, 1), ymd(2020, 9, 30)),
        WaveWindow::new("Winter 2020 Surge", ymd(2020, 11, 1), ymd(2021, 1, 31)),
    ]
}

/// Averages each region's daily deltas over the dates it actually appears in
/// within each window. Partial coverage averages the observed subset only;
/// a region with no covered dates gets no entry at all. An empty window
/// yields an empty map.
pub fn wave_averages(series: &CaseSeries, windows: &[WaveWindow]) -> Vec<WaveAverage> {
    windows
        .iter()
        .map(|window| {
            let mut sums: HashMap<RegionKey, (i64, u32)> = HashMap::new();
            for date in series.axis.iter().filter(|d| window.contains(**d)) {
                let Some(daily) = series.daily.get(date) else {
                    continue;
                };
                for (region, delta) in daily {
                    let entry = sums.entry(region.clone()).or_insert((0, 0));
                    entry.0 += delta;
                    entry.1 += 1;
                }
            }
            let values = sums
                .into_iter()
                .map(|(region, (sum, count))| (region, sum as f64 / count as f64))
                .collect();
            WaveAverage {
                window: window.clone(),
                values,
            }
        })
        .collect()
}
