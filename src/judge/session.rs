use std::sync::Arc;
use std::time::Instant;

use super::{expire, judge, HitResult, InputEvent, JudgeWindows, JudgmentState, Tally};
use crate::chart::Chart;

/// Seconds since playback started; monotonic and non-negative.
pub trait PlaybackClock {
    fn now(&self) -> f64;
}

/// Clock driven by the host, e.g. from an audio device position or a replay.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManualClock {
    now: f64,
}

impl ManualClock {
    pub fn set(&mut self, now: f64) {
        self.now = self.now.max(now);
    }
}

impl PlaybackClock for ManualClock {
    fn now(&self) -> f64 {
        self.now
    }
}

/// Wall time since construction.
#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    started: Instant,
}

impl WallClock {
    pub fn start() -> Self {
        Self { started: Instant::now() }
    }
}

impl PlaybackClock for WallClock {
    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Consistent copy of the live counters for readers outside the input path.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    pub tally: Tally,
    pub remaining: usize,
    pub total: usize,
    /// Points earned over the points a full-Perfect run would earn, 0..=1
    pub accuracy: f64,
}

/// One playback attempt over a shared chart.
///
/// Presses go through `&mut self`, so they are judged one at a time in
/// arrival order. The chart is never modified; dropping or stopping the
/// session leaves it ready for a fresh attempt.
pub struct PlaybackSession {
    chart: Arc<Chart>,
    state: JudgmentState,
    windows: JudgeWindows,
}

impl PlaybackSession {
    pub fn new(chart: Arc<Chart>, windows: JudgeWindows) -> Self {
        let state = JudgmentState::new(&chart);
        log::debug!("Playback session started: {} notes", chart.len());
        Self { chart, state, windows }
    }

    pub fn state(&self) -> &JudgmentState {
        &self.state
    }

    pub fn press(&mut self, lane: usize, now: f64) -> HitResult {
        let state = std::mem::take(&mut self.state);
        let (state, result) = judge(state, &self.chart, lane, now, &self.windows);
        self.state = state;
        log::trace!("lane {} @ {:.3}s -> {:?}", lane, now, result.judgment);
        result
    }

    pub fn press_now(&mut self, lane: usize, clock: &dyn PlaybackClock) -> HitResult {
        self.press(lane, clock.now())
    }

    /// Judges presses; releases are ignored and return `None`.
    pub fn handle(&mut self, event: InputEvent) -> Option<HitResult> {
        match event {
            InputEvent::Press { lane, time } => Some(self.press(lane, time)),
            InputEvent::Release { .. } => None,
        }
    }

    /// Age out notes that have scrolled past the miss window by `now`.
    pub fn advance(&mut self, now: f64) -> usize {
        let state = std::mem::take(&mut self.state);
        let (state, expired) = expire(state, &self.chart, now, &self.windows);
        self.state = state;
        expired
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let total = self.chart.len();
        let best = total as u64 * self.windows.perfect_score;
        let earned = self.state.tally.perfect as u64 * self.windows.perfect_score
            + self.state.tally.good as u64 * self.windows.good_score;
        SessionSnapshot {
            score: self.state.score,
            combo: self.state.combo,
            max_combo: self.state.max_combo,
            tally: self.state.tally,
            remaining: self.state.remaining(),
            total,
            accuracy: if best == 0 { 0.0 } else { earned as f64 / best as f64 },
        }
    }

    /// End the attempt, discarding its state and returning the chart.
    pub fn stop(self) -> Arc<Chart> {
        log::debug!(
            "Playback session stopped: score={}, max_combo={}",
            self.state.score,
            self.state.max_combo
        );
        self.chart
    }
}
