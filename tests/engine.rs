//! End-to-end session tests driven on a paused tokio clock.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use chronomap::aggregate::MetricMap;
use chronomap::session::{FrameSink, Session, SessionHandle};
use chronomap::stages::KeyStage;
use chronomap::{Config, Observation, RegionKey, ViewMode};
use tokio::time::{advance, Duration};

#[derive(Default)]
struct Recorded {
    frames: Vec<(NaiveDate, i64, ViewMode)>,
    stages: Vec<String>,
    acks: u32,
    finished: bool,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Recorded>>);

impl Recorder {
    fn frames(&self) -> Vec<(NaiveDate, i64, ViewMode)> {
        self.0.lock().unwrap().frames.clone()
    }

    fn stages(&self) -> Vec<String> {
        self.0.lock().unwrap().stages.clone()
    }

    fn finished(&self) -> bool {
        self.0.lock().unwrap().finished
    }
}

impl FrameSink for Recorder {
    fn on_frame(&mut self, date: NaiveDate, _values: &MetricMap, max_bound: i64, mode: ViewMode) {
        self.0.lock().unwrap().frames.push((date, max_bound, mode));
    }

    fn on_stage_reached(&mut self, stage: &KeyStage) {
        self.0.lock().unwrap().stages.push(stage.title.clone());
    }

    fn on_stage_acknowledged(&mut self) {
        self.0.lock().unwrap().acks += 1;
    }

    fn on_finished(&mut self) {
        self.0.lock().unwrap().finished = true;
    }
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// One region, `days` consecutive dates starting 2020-03-01, +2 cases a day.
fn observations(days: i64) -> Vec<Observation> {
    (0..days)
        .map(|i| Observation {
            date: date("2020-03-01") + chrono::Duration::days(i),
            region: RegionKey::new("1001"),
            cumulative: (i + 1) * 2,
        })
        .collect()
}

fn config() -> Config {
    Config {
        base_interval_ms: 100,
        ..Config::default()
    }
}

fn start(
    days: i64,
    stages: Vec<KeyStage>,
) -> (SessionHandle, Recorder, tokio::task::JoinHandle<()>) {
    let (session, handle) =
        Session::with_narrative(observations(days), stages, Vec::new(), &config()).unwrap();
    let recorder = Recorder::default();
    let driver = tokio::spawn(session.run(recorder.clone()));
    (handle, recorder, driver)
}

/// Lets the session and ticker tasks catch up with queued work.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

async fn advance_ticks(n: u32) {
    for _ in 0..n {
        advance(Duration::from_millis(100)).await;
        settle().await;
    }
}

#[tokio::test(start_paused = true)]
async fn double_play_keeps_a_single_tick_stream() {
    let (handle, recorder, driver) = start(40, Vec::new());
    settle().await;

    handle.play();
    handle.play();
    settle().await;
    advance_ticks(10).await;

    // Initial frame plus exactly one frame per interval; a stacked timer
    // would roughly double this.
    assert_eq!(recorder.frames().len(), 11);

    handle.shutdown();
    driver.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn autoplay_pauses_at_stage_and_resumes_on_acknowledgment() {
    let stage = KeyStage::new(date("2020-03-04"), "milestone", "desc");
    let (handle, recorder, driver) = start(40, vec![stage]);
    settle().await;

    handle.play();
    settle().await;
    advance_ticks(3).await;

    // Landed on the stage index and stopped advancing.
    assert_eq!(recorder.stages(), vec!["milestone".to_string()]);
    let frames_at_pause = recorder.frames().len();
    advance_ticks(3).await;
    assert_eq!(recorder.frames().len(), frames_at_pause, "ticks must be no-ops while paused");

    handle.acknowledge_stage();
    settle().await;
    advance_ticks(2).await;

    let frames = recorder.frames();
    assert!(frames.len() > frames_at_pause, "autoplay resumes after acknowledgment");
    // Resumed from the same index: next frame is the day after the stage.
    assert_eq!(frames[frames_at_pause].0, date("2020-03-05"));

    handle.shutdown();
    driver.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stage_triggers_only_on_first_entry() {
    let stage = KeyStage::new(date("2020-03-04"), "once", "desc");
    let (handle, recorder, driver) = start(40, vec![stage]);
    settle().await;

    handle.seek(3);
    settle().await;
    handle.acknowledge_stage();
    settle().await;
    handle.seek(0);
    handle.seek(3);
    handle.seek(0);
    handle.seek(3);
    settle().await;

    assert_eq!(recorder.stages().len(), 1);

    handle.shutdown();
    driver.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reaching_axis_end_stops_and_cancels_the_timer() {
    let (handle, recorder, driver) = start(4, Vec::new());
    settle().await;

    handle.play();
    settle().await;
    advance_ticks(5).await;

    assert!(recorder.finished());
    let frames = recorder.frames();
    assert_eq!(frames.last().unwrap().0, date("2020-03-04"));

    // Timer is gone: more time produces no more frames.
    let count = frames.len();
    advance_ticks(5).await;
    assert_eq!(recorder.frames().len(), count);

    handle.shutdown();
    driver.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn scrub_wins_over_autoplay() {
    let (handle, recorder, driver) = start(40, Vec::new());
    settle().await;

    handle.play();
    settle().await;
    advance_ticks(2).await;

    handle.seek(0);
    settle().await;
    let count = recorder.frames().len();
    advance_ticks(4).await;

    // No tick frames after the scrub; playback stopped.
    assert_eq!(recorder.frames().len(), count);
    assert_eq!(recorder.frames().last().unwrap().0, date("2020-03-01"));

    handle.shutdown();
    driver.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn view_mode_switch_changes_projection_not_position() {
    let (handle, recorder, driver) = start(40, Vec::new());
    settle().await;

    handle.play();
    settle().await;
    advance_ticks(2).await;
    handle.set_view_mode(ViewMode::Cumulative);
    settle().await;

    let frames = recorder.frames();
    let last = frames.last().unwrap();
    assert_eq!(last.2, ViewMode::Cumulative);
    // Same date as the frame before the switch.
    assert_eq!(last.0, frames[frames.len() - 2].0);
    // Cumulative bound: 40 days at +2 a day.
    assert_eq!(last.1, 80);

    // Playback kept going.
    advance_ticks(1).await;
    assert!(recorder.frames().len() > frames.len());

    handle.shutdown();
    driver.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn speed_change_rederives_the_interval() {
    let (handle, recorder, driver) = start(40, Vec::new());
    settle().await;

    handle.play();
    handle.set_speed(2.0);
    settle().await;

    // At 2x the interval halves to 50ms: 100ms now carries two ticks.
    for _ in 0..4 {
        advance(Duration::from_millis(50)).await;
        settle().await;
    }
    assert_eq!(recorder.frames().len(), 1 + 4);

    handle.shutdown();
    driver.await.unwrap();
}
