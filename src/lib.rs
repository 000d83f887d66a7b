//! Time-series aggregation and playback engine for a county-level epidemic
//! choropleth timeline.
//!
//! The pipeline: [`normalize`] canonicalizes raw CSV rows, [`aggregate`]
//! derives per-date metric maps over a shared date axis, [`waves`] and
//! [`stages`] build the narrative layer on top, and [`session`] drives a
//! [`playback`] state machine whose current frame [`project`] exposes to an
//! external renderer. Rendering itself (projection, color scales, DOM) is
//! not this crate's concern.

pub mod aggregate;
pub mod config;
pub mod data;
pub mod geo;
pub mod logging;
pub mod normalize;
pub mod playback;
pub mod project;
pub mod session;
pub mod stages;
pub mod waves;

pub use aggregate::{CaseSeries, DataError, MetricMap};
pub use config::Config;
pub use normalize::{Observation, RawRow, RegionKey};
pub use playback::{PlaybackController, PlaybackState, ViewMode};
pub use session::{FrameSink, Session, SessionHandle};
pub use stages::KeyStage;
pub use waves::WaveWindow;
