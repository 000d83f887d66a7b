//! Narrative milestones and their resolution onto the date axis.
//!
//! A milestone names a literal calendar date; the axis only has the dates
//! the data actually covers, so each stage resolves to the first axis index
//! at or after its date. Stages past the end of the axis are dropped.

use chrono::NaiveDate;

/// A narrative milestone that pauses playback for an explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStage {
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
}

impl KeyStage {
    pub fn new(date: NaiveDate, title: &str, description: &str) -> Self {
        Self {
            date,
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// A stage mapped onto the axis, keeping its position in the declared list.
#[derive(Debug, Clone)]
pub struct ResolvedStage {
    pub stage: KeyStage,
    /// Position of the stage in the declared list, identity for shown-once tracking.
    pub ordinal: usize,
    pub axis_index: usize,
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid literal date")
}

/// The five narrative milestones of the timeline.
pub fn default_stages() -> Vec<KeyStage> {
    vec![
        KeyStage::new(
            ymd(2020, 1, 21),
            "First confirmed U.S. case",
            "A traveler returning to Washington State tests positive, the first confirmed case in the country.",
        ),
        KeyStage::new(
            ymd(2020, 3, 11),
            "WHO declares a pandemic",
            "The World Health Organization characterizes the outbreak as a pandemic as cases appear in all fifty states.",
        ),
        KeyStage::new(
            ymd(2020, 3, 26),
            "U.S. leads the world in cases",
            "Confirmed U.S. cases pass every other country as the first wave builds in the Northeast.",
        ),
        KeyStage::new(
            ymd(2020, 12, 14),
            "First vaccinations",
            "The first doses outside clinical trials are administered while the winter surge accelerates.",
        ),
        KeyStage::new(
            ymd(2021, 1, 8),
            "Winter surge peak",
            "Daily reported cases reach their highest point of the winter wave before a long decline.",
        ),
    ]
}

/// Lower-bound resolution of each stage onto an ascending axis. Stages whose
/// date falls after the last axis date are omitted; declaration order is
/// preserved for the rest.
pub fn resolve_stages(stages: &[KeyStage], axis: &[NaiveDate]) -> Vec<ResolvedStage> {
    stages
        .iter()
        .enumerate()
        .filter_map(|(ordinal, stage)| {
            let axis_index = axis.partition_point(|d| *d < stage.date);
            if axis_index < axis.len() {
                Some(ResolvedStage {
                    stage: stage.clone(),
                    ordinal,
                    axis_index,
                })
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(dates: &[&str]) -> Vec<NaiveDate> {
        dates
            .iter()
            .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap())
            .collect()
    }

    #[test]
    fn exact_date_resolves_to_its_index() {
        let axis = axis(&["2020-03-10", "2020-03-11", "2020-03-12"]);
        let stages = vec![KeyStage::new(ymd(2020, 3, 11), "t", "d")];
        let resolved = resolve_stages(&stages, &axis);
        assert_eq!(resolved[0].axis_index, 1);
    }

    #[test]
    fn gap_resolves_to_next_available_date() {
        let axis = axis(&["2020-03-10", "2020-03-14"]);
        let stages = vec![KeyStage::new(ymd(2020, 3, 11), "t", "d")];
        let resolved = resolve_stages(&stages, &axis);
        assert_eq!(resolved[0].axis_index, 1);
    }

    #[test]
    fn stage_past_axis_end_is_dropped() {
        let axis = axis(&["2020-03-10", "2020-03-11"]);
        let stages = vec![
            KeyStage::new(ymd(2020, 3, 10), "kept", "d"),
            KeyStage::new(ymd(2021, 1, 1), "dropped", "d"),
        ];
        let resolved = resolve_stages(&stages, &axis);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].stage.title, "kept");
    }

    #[test]
    fn resolution_is_monotonic_in_stage_date() {
        let axis = axis(&["2020-01-01", "2020-06-01", "2021-01-01"]);
        let resolved = resolve_stages(&default_stages(), &axis);
        for pair in resolved.windows(2) {
            assert!(pair[0].axis_index <= pair[1].axis_index);
        }
    }

    #[test]
    fn ordinals_track_declaration_order() {
        let axis = axis(&["2020-01-01", "2021-12-31"]);
        let resolved = resolve_stages(&default_stages(), &axis);
        assert_eq!(resolved.len(), 5);
        let ordinals: Vec<usize> = resolved.iter().map(|r| r.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
    }
}
