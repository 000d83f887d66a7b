//! Playback state machine and the autoplay ticker.
//!
//! The controller is a pure state machine: every operation mutates the
//! playback state and returns the effects the driver must carry out (emit a
//! frame, surface a stage, start or cancel the timer). Nothing in here is
//! fallible - out-of-range seeks clamp, stray ticks in the wrong phase are
//! no-ops.
//!
//! The timer side lives in [`Ticker`]: one cancellable task handle, aborted
//! before every reschedule so two tick streams can never coexist.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::stages::ResolvedStage;

/// Tick period at speed 1.0.
pub const BASE_INTERVAL_MS: u64 = 500;

/// Which derived metric the projector pairs with the current date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Daily,
    Cumulative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    Playing,
    PausedAtStage,
}

/// What the driver must do after a transition, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Re-project and hand the current frame to the sink.
    Frame,
    /// A narrative stage was entered; the value indexes the resolved stage list.
    StageReached(usize),
    StageAcknowledged,
    /// (Re)schedule the tick timer at the current interval, cancelling any
    /// outstanding one first.
    StartTimer,
    CancelTimer,
    /// Autoplay reached the end of the axis.
    Finished,
}

/// Read-only snapshot of the playback state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub current_index: usize,
    pub is_playing: bool,
    pub speed: f64,
    pub view_mode: ViewMode,
    /// Ordinal of the stage currently holding playback, if any.
    pub active_stage: Option<usize>,
}

pub struct PlaybackController {
    index: usize,
    last_index: usize,
    phase: Phase,
    speed: f64,
    view_mode: ViewMode,
    base_interval_ms: u64,
    stages: Vec<ResolvedStage>,
    /// axis index -> positions in `stages`, in declaration order. A sparse
    /// axis can resolve several milestones onto one index.
    stage_at: HashMap<usize, Vec<usize>>,
    /// Stage ordinals already surfaced this session.
    shown: HashSet<usize>,
    /// Position in `stages` of the stage holding playback.
    active_stage: Option<usize>,
    /// Whether autoplay should resume once the active stage is acknowledged.
    resume_after_ack: bool,
}

impl PlaybackController {
    pub fn new(last_index: usize, stages: Vec<ResolvedStage>, base_interval_ms: u64) -> Self {
        let mut stage_at: HashMap<usize, Vec<usize>> = HashMap::new();
        for (pos, s) in stages.iter().enumerate() {
            stage_at.entry(s.axis_index).or_default().push(pos);
        }
        Self {
            index: 0,
            last_index,
            phase: Phase::Stopped,
            speed: 1.0,
            view_mode: ViewMode::Daily,
            base_interval_ms,
            stages,
            stage_at,
            shown: HashSet::new(),
            active_stage: None,
            resume_after_ack: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn stages(&self) -> &[ResolvedStage] {
        &self.stages
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            current_index: self.index,
            is_playing: self.phase == Phase::Playing,
            speed: self.speed,
            view_mode: self.view_mode,
            active_stage: self.active_stage.map(|pos| self.stages[pos].ordinal),
        }
    }

    /// Tick period derived from the base interval and the speed multiplier.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.base_interval_ms as f64 / 1000.0 / self.speed)
    }

    pub fn play(&mut self) -> Vec<Effect> {
        match self.phase {
            // StartTimer always cancels the outstanding handle first, so a
            // repeated play request cannot stack tick streams.
            Phase::Playing => vec![Effect::StartTimer],
            // The interlock holds; remember the intent for acknowledge().
            Phase::PausedAtStage => {
                self.resume_after_ack = true;
                Vec::new()
            }
            Phase::Stopped => {
                self.phase = Phase::Playing;
                vec![Effect::StartTimer]
            }
        }
    }

    pub fn stop(&mut self) -> Vec<Effect> {
        self.phase = Phase::Stopped;
        self.active_stage = None;
        self.resume_after_ack = false;
        vec![Effect::CancelTimer]
    }

    /// Manual scrub. Always wins over autoplay; the target is clamped, never
    /// an error. Landing on an unshown stage still surfaces it once.
    pub fn seek(&mut self, target: usize) -> Vec<Effect> {
        self.index = target.min(self.last_index);
        self.phase = Phase::Stopped;
        self.active_stage = None;
        self.resume_after_ack = false;
        let mut effects = vec![Effect::CancelTimer, Effect::Frame];
        self.check_stage(false, &mut effects);
        effects
    }

    /// One timer tick. A no-op outside `Playing`, so ticks arriving while a
    /// stage holds playback are dropped rather than queued.
    pub fn tick(&mut self) -> Vec<Effect> {
        if self.phase != Phase::Playing {
            return Vec::new();
        }
        if self.index >= self.last_index {
            self.phase = Phase::Stopped;
            return vec![Effect::CancelTimer, Effect::Finished];
        }
        self.index += 1;
        let mut effects = vec![Effect::Frame];
        self.check_stage(true, &mut effects);
        if self.phase == Phase::Playing && self.index == self.last_index {
            self.phase = Phase::Stopped;
            effects.push(Effect::CancelTimer);
            effects.push(Effect::Finished);
        }
        effects
    }

    pub fn acknowledge(&mut self) -> Vec<Effect> {
        if self.phase != Phase::PausedAtStage {
            return Vec::new();
        }
        self.active_stage = None;
        let mut effects = vec![Effect::StageAcknowledged];
        if self.resume_after_ack {
            // Restart the timer rather than trust the old one: a pause
            // entered via scrub has no timer left to resume.
            self.phase = Phase::Playing;
            effects.push(Effect::StartTimer);
        } else {
            self.phase = Phase::Stopped;
            effects.push(Effect::CancelTimer);
        }
        self.resume_after_ack = false;
        effects
    }

    /// Re-derives the tick interval without touching the index. Non-positive
    /// or non-finite multipliers are ignored.
    pub fn set_speed(&mut self, multiplier: f64) -> Vec<Effect> {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Vec::new();
        }
        self.speed = multiplier;
        if self.phase == Phase::Playing {
            vec![Effect::StartTimer]
        } else {
            Vec::new()
        }
    }

    /// Never affects playback, only what the projector returns.
    pub fn set_view_mode(&mut self, mode: ViewMode) -> Vec<Effect> {
        self.view_mode = mode;
        vec![Effect::Frame]
    }

    fn check_stage(&mut self, was_playing: bool, effects: &mut Vec<Effect>) {
        let Some(positions) = self.stage_at.get(&self.index) else {
            return;
        };
        // Surface the first unshown stage here; re-entering the same index
        // after acknowledgment surfaces the next one.
        for &pos in positions {
            let ordinal = self.stages[pos].ordinal;
            if !self.shown.insert(ordinal) {
                continue;
            }
            self.phase = Phase::PausedAtStage;
            self.active_stage = Some(pos);
            self.resume_after_ack = was_playing;
            effects.push(Effect::StageReached(pos));
            return;
        }
    }
}

// =============================================================================
// Ticker
// =============================================================================

/// A cancellable periodic task owning at most one outstanding handle.
///
/// Starting cancels the previous handle before spawning, so no two tick
/// streams can coexist regardless of how the controls are mashed. Dropping
/// the ticker aborts the pending task.
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self { handle: None }
    }

    pub fn start<M: Clone + Send + 'static>(
        &mut self,
        every: Duration,
        tx: UnboundedSender<M>,
        tick: M,
    ) {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            let mut clock = tokio::time::interval(every);
            clock.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first interval tick completes immediately; swallow it so
            // ticks are strictly periodic from the start request.
            clock.tick().await;
            loop {
                clock.tick().await;
                if tx.send(tick.clone()).is_err() {
                    break;
                }
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
