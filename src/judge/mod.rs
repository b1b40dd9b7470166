//! Hit judgment against a fixed chart.
//!
//! [`judge`] is a pure transition: it takes the state by value together with
//! one press and returns the next state plus the outcome. The chart itself is
//! never mutated; consumed notes are tombstoned in the state, so a chart can
//! be shared with readers while a session runs.

pub mod session;

use serde::Deserialize;

use crate::chart::{Chart, Note};
use crate::config::JudgeConfig;

/// Slack applied to window edges so decimal timestamps such as
/// `1.08 - 1.0` land inside a 0.08s window.
const WINDOW_EPSILON: f64 = 1e-9;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Judgment {
    Perfect,
    Good,
    Miss,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HitResult {
    pub judgment: Judgment,
    /// The note the press was matched against, if any. A `Miss` with a note
    /// means a candidate existed but was outside the good window.
    pub note: Option<Note>,
    /// `now - note.time` in seconds
    pub offset: Option<f64>,
}

/// Player input; only the leading edge of a press is judged.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum InputEvent {
    Press { lane: usize, time: f64 },
    Release { lane: usize, time: f64 },
}

impl InputEvent {
    pub fn time(&self) -> f64 {
        match *self {
            InputEvent::Press { time, .. } | InputEvent::Release { time, .. } => time,
        }
    }
}

/// Press outcomes plus notes that aged out unhit.
///
/// `perfect + good + expired` never exceeds the chart length; `miss` counts
/// presses (stray ones included), so it can.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub perfect: u32,
    pub good: u32,
    pub miss: u32,
    pub expired: u32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct JudgmentState {
    pub score: u64,
    pub combo: u32,
    pub max_combo: u32,
    /// Earliest possibly unconsumed note; never moves backwards.
    pub cursor: usize,
    pub tally: Tally,
    consumed: Vec<bool>,
    remaining: usize,
}

impl JudgmentState {
    pub fn new(chart: &Chart) -> Self {
        Self {
            score: 0,
            combo: 0,
            max_combo: 0,
            cursor: 0,
            tally: Tally::default(),
            consumed: vec![false; chart.len()],
            remaining: chart.len(),
        }
    }

    pub fn is_consumed(&self, index: usize) -> bool {
        self.consumed.get(index).copied().unwrap_or(true)
    }

    /// Notes neither hit nor aged out.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn consume(&mut self, index: usize) {
        if !self.consumed[index] {
            self.consumed[index] = true;
            self.remaining -= 1;
        }
        while self.cursor < self.consumed.len() && self.consumed[self.cursor] {
            self.cursor += 1;
        }
    }

    fn reward(&mut self, judgment: Judgment, points: u64) {
        self.score += points;
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        match judgment {
            Judgment::Perfect => self.tally.perfect += 1,
            Judgment::Good => self.tally.good += 1,
            Judgment::Miss => self.tally.miss += 1,
        }
    }

    fn break_combo(&mut self) {
        self.combo = 0;
        self.tally.miss += 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JudgeWindows {
    pub perfect: f64,
    pub good: f64,
    pub miss: f64,
    pub perfect_score: u64,
    pub good_score: u64,
}

impl Default for JudgeWindows {
    fn default() -> Self {
        JudgeWindows::from(&JudgeConfig::default())
    }
}

impl From<&JudgeConfig> for JudgeWindows {
    fn from(config: &JudgeConfig) -> Self {
        Self {
            perfect: config.perfect_window,
            good: config.good_window,
            miss: config.miss_window,
            perfect_score: config.perfect_score,
            good_score: config.good_score,
        }
    }
}

/// Judge one press of `lane` at playback time `now`.
///
/// Scans unconsumed notes of that lane from the cursor, stopping once notes
/// start beyond `now + miss`. The closest note within the miss window is the
/// candidate (earlier note on ties). Perfect and Good consume it; a candidate
/// outside the good window is a Miss that leaves the note in place; no
/// candidate at all is a plain Miss. Both misses reset the combo.
pub fn judge(
    mut state: JudgmentState,
    chart: &Chart,
    lane: usize,
    now: f64,
    windows: &JudgeWindows,
) -> (JudgmentState, HitResult) {
    let horizon = now + windows.miss + WINDOW_EPSILON;
    let mut best: Option<(usize, f64)> = None;

    for (index, note) in chart.notes.iter().enumerate().skip(state.cursor) {
        if note.time > horizon {
            break;
        }
        if note.lane != lane || state.is_consumed(index) {
            continue;
        }
        let distance = (note.time - now).abs();
        if distance > windows.miss + WINDOW_EPSILON {
            continue;
        }
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((index, distance));
        }
    }

    let Some((index, distance)) = best else {
        state.break_combo();
        return (
            state,
            HitResult { judgment: Judgment::Miss, note: None, offset: None },
        );
    };

    let note = chart.notes[index];
    let offset = Some(now - note.time);
    let judgment = if distance <= windows.perfect + WINDOW_EPSILON {
        Judgment::Perfect
    } else if distance <= windows.good + WINDOW_EPSILON {
        Judgment::Good
    } else {
        Judgment::Miss
    };

    match judgment {
        Judgment::Perfect => {
            state.reward(judgment, windows.perfect_score);
            state.consume(index);
        }
        Judgment::Good => {
            state.reward(judgment, windows.good_score);
            state.consume(index);
        }
        Judgment::Miss => state.break_combo(),
    }

    (state, HitResult { judgment, note: Some(note), offset })
}

/// Tombstone every unconsumed note that can no longer be hit at `now`
/// (older than `now - miss`). Each is tallied as expired; any expiry resets
/// the combo. Returns how many notes expired.
pub fn expire(
    mut state: JudgmentState,
    chart: &Chart,
    now: f64,
    windows: &JudgeWindows,
) -> (JudgmentState, usize) {
    let deadline = now - windows.miss - WINDOW_EPSILON;
    let mut expired = 0;

    let mut index = state.cursor;
    while index < chart.len() && chart.notes[index].time < deadline {
        if !state.is_consumed(index) {
            state.consume(index);
            state.tally.expired += 1;
            expired += 1;
        }
        index += 1;
    }

    if expired > 0 {
        state.combo = 0;
    }
    (state, expired)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(notes: &[(f64, usize)]) -> Chart {
        Chart {
            bpm: 120.0,
            subdivision: 4,
            lane_count: 4,
            notes: notes.iter().map(|&(time, lane)| Note { time, lane }).collect(),
        }
    }

    fn press(chart: &Chart, state: JudgmentState, lane: usize, now: f64) -> (JudgmentState, HitResult) {
        judge(state, chart, lane, now, &JudgeWindows::default())
    }

    #[test]
    fn window_boundaries_are_exact() {
        let c = chart(&[(1.0, 0)]);
        let cases = [
            (1.08, Judgment::Perfect, true),
            (0.92, Judgment::Perfect, true),
            (1.0801, Judgment::Good, true),
            (1.18, Judgment::Good, true),
            (1.1801, Judgment::Miss, false),
            (1.30, Judgment::Miss, false),
        ];
        for (now, expected, consumed) in cases {
            let (state, result) = press(&c, JudgmentState::new(&c), 0, now);
            assert_eq!(result.judgment, expected, "press at {now}");
            assert!(result.note.is_some(), "press at {now}");
            assert_eq!(state.is_consumed(0), consumed, "press at {now}");
        }

        let (state, result) = press(&c, JudgmentState::new(&c), 0, 1.3001);
        assert_eq!(result.judgment, Judgment::Miss);
        assert_eq!(result.note, None);
        assert_eq!(state.remaining(), 1);
    }

    #[test]
    fn perfect_then_repeat_press_misses() {
        let c = chart(&[(2.0, 1)]);
        let mut state = JudgmentState::new(&c);
        state.combo = 5;

        let (state, first) = press(&c, state, 1, 2.0);
        assert_eq!(first.judgment, Judgment::Perfect);
        assert_eq!(first.offset, Some(0.0));
        assert_eq!(state.score, 1000);
        assert_eq!(state.combo, 6);
        assert_eq!(state.remaining(), 0);

        let (state, second) = press(&c, state, 1, 2.0);
        assert_eq!(second.judgment, Judgment::Miss);
        assert_eq!(second.note, None);
        assert_eq!(state.combo, 0);
        assert_eq!(state.score, 1000);
        assert_eq!(state.max_combo, 6);
    }

    #[test]
    fn good_awards_half() {
        let c = chart(&[(1.0, 2)]);
        let (state, result) = press(&c, JudgmentState::new(&c), 2, 0.85);
        assert_eq!(result.judgment, Judgment::Good);
        assert!((result.offset.unwrap() + 0.15).abs() < 1e-12);
        assert_eq!((state.score, state.combo), (500, 1));
        assert_eq!(state.tally, Tally { perfect: 0, good: 1, miss: 0, expired: 0 });
    }

    #[test]
    fn late_miss_keeps_note_for_next_press() {
        let c = chart(&[(1.0, 0)]);
        let (state, early) = press(&c, JudgmentState::new(&c), 0, 0.75);
        assert_eq!(early.judgment, Judgment::Miss);
        assert_eq!(early.note, Some(Note { time: 1.0, lane: 0 }));
        assert_eq!(state.remaining(), 1);

        let (state, hit) = press(&c, state, 0, 1.01);
        assert_eq!(hit.judgment, Judgment::Perfect);
        assert_eq!(state.remaining(), 0);
    }

    #[test]
    fn only_matching_lane_is_considered() {
        let c = chart(&[(1.0, 0), (1.0, 1)]);
        let (state, result) = press(&c, JudgmentState::new(&c), 1, 1.0);
        assert_eq!(result.note, Some(Note { time: 1.0, lane: 1 }));
        assert!(!state.is_consumed(0));
        assert!(state.is_consumed(1));

        let (_, result) = press(&c, state, 3, 1.0);
        assert_eq!(result.judgment, Judgment::Miss);
        assert_eq!(result.note, None);
    }

    #[test]
    fn closest_note_wins() {
        let c = chart(&[(1.0, 0), (1.2, 0)]);
        let (state, result) = press(&c, JudgmentState::new(&c), 0, 1.15);
        assert_eq!(result.note, Some(Note { time: 1.2, lane: 0 }));
        assert_eq!(result.judgment, Judgment::Perfect);
        assert!(state.is_consumed(1));
        assert!(!state.is_consumed(0));
        // Note 0 still blocks the cursor.
        assert_eq!(state.cursor, 0);
    }

    #[test]
    fn cursor_advances_over_consumed_prefix() {
        let c = chart(&[(1.0, 0), (1.5, 1), (2.0, 2)]);
        let state = JudgmentState::new(&c);
        let (state, _) = press(&c, state, 1, 1.5);
        assert_eq!(state.cursor, 0);
        let (state, _) = press(&c, state, 0, 1.0);
        assert_eq!(state.cursor, 2);
        let (state, _) = press(&c, state, 2, 2.0);
        assert_eq!(state.cursor, 3);
        assert_eq!(state.tally.perfect, 3);
        assert_eq!(state.score, 3000);
    }

    #[test]
    fn expire_ages_out_passed_notes() {
        let c = chart(&[(1.0, 0), (1.5, 1), (3.0, 2)]);
        let mut state = JudgmentState::new(&c);
        state.combo = 4;

        let (state, expired) = expire(state, &c, 1.2, &JudgeWindows::default());
        assert_eq!(expired, 0);
        assert_eq!(state.combo, 4);

        let (state, expired) = expire(state, &c, 2.0, &JudgeWindows::default());
        assert_eq!(expired, 2);
        assert_eq!(state.combo, 0);
        assert_eq!(state.cursor, 2);
        assert_eq!(state.tally.expired, 2);
        assert_eq!(state.tally.miss, 0);
        assert_eq!(state.remaining(), 1);

        // Expired notes can no longer be hit.
        let (_, result) = press(&c, state, 1, 1.6);
        assert_eq!(result.note, None);
    }

    #[test]
    fn missed_then_expired_note_counts_once_per_note() {
        let c = chart(&[(1.0, 0), (2.0, 1)]);
        let windows = JudgeWindows::default();

        let (state, early) = press(&c, JudgmentState::new(&c), 0, 0.75);
        assert_eq!(early.judgment, Judgment::Miss);
        assert!(early.note.is_some());
        let (state, _) = press(&c, state, 1, 2.0);
        let (state, _) = press(&c, state, 3, 2.1);
        let (state, expired) = expire(state, &c, f64::INFINITY, &windows);
        assert_eq!(expired, 1);

        let tally = state.tally;
        assert_eq!(tally, Tally { perfect: 1, good: 0, miss: 2, expired: 1 });
        assert_eq!((tally.perfect + tally.good + tally.expired) as usize, c.len());
    }

    #[test]
    fn empty_chart_always_misses() {
        let c = chart(&[]);
        let (state, result) = press(&c, JudgmentState::new(&c), 0, 0.0);
        assert_eq!(result.judgment, Judgment::Miss);
        assert_eq!(state.tally.miss, 1);
    }

    #[test]
    fn input_events_parse_from_json() {
        let events: Vec<InputEvent> = serde_json::from_str(
            r#"[{"kind":"press","lane":2,"time":1.25},{"kind":"release","lane":2,"time":1.4}]"#,
        )
        .unwrap();
        assert_eq!(events[0], InputEvent::Press { lane: 2, time: 1.25 });
        assert_eq!(events[1], InputEvent::Release { lane: 2, time: 1.4 });
    }
}
