//! Rhythm-game chart generation and hit judgment.
//!
//! The offline side turns a mono track into a lane-assigned chart:
//!
//! ```text
//! samples → RMS envelope → {onsets, tempo}
//! samples → spectra → lane mapper
//! {onsets, tempo, lanes} → beat grid → chart
//! ```
//!
//! The playback side judges lane presses against that chart with a
//! [`PlaybackSession`].
//!
//! ```no_run
//! use beatlane::{AnalysisConfig, AnalysisContext, JudgeWindows, PlaybackSession, SampleBuffer};
//!
//! let samples: Vec<f32> = vec![]; // mono, decoded by the host
//! let mut ctx = AnalysisContext::new(AnalysisConfig::default())?;
//! ctx.load_with_spectra(SampleBuffer::new(samples, 44100));
//! let analysis = ctx.analyze()?;
//!
//! let mut session = PlaybackSession::new(analysis.chart.clone(), JudgeWindows::default());
//! let hit = session.press(0, 1.25);
//! println!("{:?}, score {}", hit.judgment, session.snapshot().score);
//! # Ok::<(), beatlane::ChartError>(())
//! ```

pub mod audio;
pub mod chart;
pub mod config;
pub mod error;
pub mod judge;
pub mod pipeline;

pub use audio::decode::{AudioSource, SampleBuffer};
pub use chart::{Chart, Note};
pub use config::{AnalysisConfig, Config, JudgeConfig, LaneStrategy};
pub use error::ChartError;
pub use judge::session::PlaybackSession;
pub use judge::{HitResult, InputEvent, JudgeWindows, Judgment};
pub use pipeline::{Analysis, AnalysisContext, TempoEstimate};
