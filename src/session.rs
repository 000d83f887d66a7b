//! Session driver: one owned context object per browsing session.
//!
//! The session owns the aggregator output, the wave averages, the resolved
//! stages, the playback controller and the ticker. Commands arrive on a
//! single channel (UI operations and timer ticks alike) and are applied one
//! at a time, so every transition runs on one logical thread and the sink
//! sees a consistent state after each change.

use chrono::NaiveDate;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::aggregate::{CaseSeries, DataError, MetricMap};
use crate::config::Config;
use crate::normalize::Observation;
use crate::playback::{Effect, PlaybackController, Ticker, ViewMode};
use crate::project::project;
use crate::stages::{default_stages, resolve_stages, KeyStage, ResolvedStage};
use crate::waves::{default_windows, wave_averages, WaveAverage, WaveWindow};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play,
    Pause,
    Seek(usize),
    SetSpeed(f64),
    SetViewMode(ViewMode),
    AcknowledgeStage,
    Tick,
    Shutdown,
}

/// Render callback surface. Invoked after every state change.
pub trait FrameSink {
    fn on_frame(&mut self, date: NaiveDate, values: &MetricMap, max_bound: i64, mode: ViewMode);
    fn on_stage_reached(&mut self, _stage: &KeyStage) {}
    fn on_stage_acknowledged(&mut self) {}
    /// Autoplay ran off the end of the axis.
    fn on_finished(&mut self) {}
}

/// Cheap cloneable sender for the UI side.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: UnboundedSender<Command>,
}

impl SessionHandle {
    fn send(&self, cmd: Command) {
        // A closed channel just means the session ended; controls go quiet.
        let _ = self.tx.send(cmd);
    }

    pub fn play(&self) {
        self.send(Command::Play);
    }

    pub fn pause(&self) {
        self.send(Command::Pause);
    }

    pub fn seek(&self, index: usize) {
        self.send(Command::Seek(index));
    }

    pub fn set_speed(&self, multiplier: f64) {
        self.send(Command::SetSpeed(multiplier));
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.send(Command::SetViewMode(mode));
    }

    pub fn acknowledge_stage(&self) {
        self.send(Command::AcknowledgeStage);
    }

    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }
}

pub struct Session {
    pub series: CaseSeries,
    pub waves: Vec<WaveAverage>,
    controller: PlaybackController,
    ticker: Ticker,
    tx: UnboundedSender<Command>,
    rx: UnboundedReceiver<Command>,
}

impl Session {
    /// Builds a session with the default narrative (three waves, five stages).
    pub fn new(
        observations: Vec<Observation>,
        cfg: &Config,
    ) -> Result<(Self, SessionHandle), DataError> {
        Self::with_narrative(observations, default_stages(), default_windows(), cfg)
    }

    pub fn with_narrative(
        observations: Vec<Observation>,
        stages: Vec<KeyStage>,
        windows: Vec<WaveWindow>,
        cfg: &Config,
    ) -> Result<(Self, SessionHandle), DataError> {
        let series = CaseSeries::build_with_window(observations, cfg.rolling_window)?;
        let waves = wave_averages(&series, &windows);
        let resolved = resolve_stages(&stages, &series.axis);
        let mut controller =
            PlaybackController::new(series.last_index(), resolved, cfg.base_interval_ms);
        // Configured starting speed; invalid values fall back to 1.0 inside.
        let _ = controller.set_speed(cfg.speed);

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SessionHandle { tx: tx.clone() };
        Ok((
            Self {
                series,
                waves,
                controller,
                ticker: Ticker::new(),
                tx,
                rx,
            },
            handle,
        ))
    }

    pub fn stages(&self) -> &[ResolvedStage] {
        self.controller.stages()
    }

    /// Processes commands until shutdown, emitting an initial frame first.
    /// Dropping out of this loop cancels any pending timer.
    pub async fn run<S: FrameSink>(mut self, mut sink: S) {
        self.emit_frame(&mut sink);
        while let Some(cmd) = self.rx.recv().await {
            let effects = match cmd {
                Command::Play => self.controller.play(),
                Command::Pause => self.controller.stop(),
                Command::Seek(index) => self.controller.seek(index),
                Command::SetSpeed(multiplier) => self.controller.set_speed(multiplier),
                Command::SetViewMode(mode) => self.controller.set_view_mode(mode),
                Command::AcknowledgeStage => self.controller.acknowledge(),
                Command::Tick => self.controller.tick(),
                Command::Shutdown => break,
            };
            self.apply(effects, &mut sink);
        }
        self.ticker.cancel();
    }

    fn apply<S: FrameSink>(&mut self, effects: Vec<Effect>, sink: &mut S) {
        for effect in effects {
            match effect {
                Effect::Frame => self.emit_frame(sink),
                Effect::StageReached(pos) => {
                    sink.on_stage_reached(&self.controller.stages()[pos].stage);
                }
                Effect::StageAcknowledged => sink.on_stage_acknowledged(),
                Effect::StartTimer => {
                    self.ticker
                        .start(self.controller.interval(), self.tx.clone(), Command::Tick);
                }
                Effect::CancelTimer => self.ticker.cancel(),
                Effect::Finished => sink.on_finished(),
            }
        }
    }

    fn emit_frame<S: FrameSink>(&self, sink: &mut S) {
        let frame = project(
            &self.series,
            self.controller.index(),
            self.controller.view_mode(),
        );
        sink.on_frame(frame.date, frame.values, frame.max_bound, frame.mode);
    }
}
