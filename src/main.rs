//! Headless autoplay run: load the case CSV, build a session, and play the
//! timeline end to end with a JSON-logging frame sink.

use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use tokio::sync::oneshot;

use chronomap::aggregate::MetricMap;
use chronomap::logging::{json_log, json_warn, obj, v_num, v_str};
use chronomap::session::{FrameSink, Session, SessionHandle};
use chronomap::stages::KeyStage;
use chronomap::{data, geo, normalize, Config, ViewMode};

struct CliSink {
    handle: SessionHandle,
    done: Option<oneshot::Sender<()>>,
}

impl FrameSink for CliSink {
    fn on_frame(&mut self, date: NaiveDate, values: &MetricMap, max_bound: i64, mode: ViewMode) {
        json_log(
            "frame",
            obj(&[
                ("date", v_str(&date.to_string())),
                ("regions", v_num(values.len() as f64)),
                ("max_bound", v_num(max_bound as f64)),
                ("mode", v_str(&format!("{:?}", mode).to_lowercase())),
            ]),
        );
    }

    fn on_stage_reached(&mut self, stage: &KeyStage) {
        json_log(
            "stage",
            obj(&[
                ("date", v_str(&stage.date.to_string())),
                ("title", v_str(&stage.title)),
                ("description", v_str(&stage.description)),
            ]),
        );
        // Headless run: acknowledge immediately so autoplay resumes.
        self.handle.acknowledge_stage();
    }

    fn on_finished(&mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let path = Path::new(&cfg.case_csv);

    let manifest = data::analyze_csv(path).map_err(|e| anyhow!(e))?;
    json_log(
        "dataset",
        obj(&[
            ("path", v_str(&manifest.path)),
            ("hash", v_str(&manifest.hash_sha256)),
            ("rows", v_num(manifest.row_count as f64)),
            ("bad_rows", v_num(manifest.bad_rows as f64)),
        ]),
    );

    let rows = data::load_rows(path).map_err(|e| anyhow!(e))?;
    let report = normalize::normalize(&rows);
    json_log(
        "normalize",
        obj(&[
            ("accepted", v_num(report.accepted as f64)),
            (
                "skipped_missing_region",
                v_num(report.skipped_missing_region as f64),
            ),
            ("skipped_bad_date", v_num(report.skipped_bad_date as f64)),
        ]),
    );

    // Fatal only when nothing usable remains; one diagnostic, nothing rendered.
    let (session, handle) = Session::new(report.observations, &cfg)?;

    if let Some(features_path) = &cfg.features_json {
        let text = std::fs::read_to_string(features_path)?;
        let features = geo::parse_feature_ids(&text)?;
        let coverage = geo::coverage(&features, &session.series);
        json_log(
            "geo",
            obj(&[
                ("matched", v_num(coverage.matched as f64)),
                (
                    "features_without_data",
                    v_num(coverage.features_without_data.len() as f64),
                ),
                (
                    "regions_without_feature",
                    v_num(coverage.regions_without_feature.len() as f64),
                ),
            ]),
        );
        if !coverage.regions_without_feature.is_empty() {
            json_warn(
                "geo",
                obj(&[("warning", v_str("case_regions_without_geometry"))]),
            );
        }
    }

    json_log(
        "series",
        obj(&[
            ("dates", v_num(session.series.axis.len() as f64)),
            ("regions", v_num(session.series.regions().len() as f64)),
            ("rolling_window", v_num(session.series.window as f64)),
            ("daily_max", v_num(session.series.daily_max as f64)),
            ("cumulative_max", v_num(session.series.cumulative_max as f64)),
        ]),
    );

    for wave in &session.waves {
        json_log(
            "wave",
            obj(&[
                ("label", v_str(&wave.window.label)),
                ("regions", v_num(wave.values.len() as f64)),
            ]),
        );
    }

    let (done_tx, done_rx) = oneshot::channel();
    let sink = CliSink {
        handle: handle.clone(),
        done: Some(done_tx),
    };

    let driver = tokio::spawn(session.run(sink));
    handle.play();
    let _ = done_rx.await;
    handle.shutdown();
    driver.await?;

    json_log("session", obj(&[("status", v_str("complete"))]));
    Ok(())
}
