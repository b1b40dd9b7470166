//! Note synthesis: snap onsets to the beat grid and assign lanes.

use std::collections::BTreeSet;

use super::grid::BeatGrid;
use super::lanes::LaneMapper;
use super::{Chart, Note};

/// Build a chart from onsets, a grid and a lane mapper.
///
/// Each onset snaps to its nearest grid point and is dropped when that point
/// lies more than half a grid step away. The lane comes from the mapper at
/// the onset's own time. Notes are keyed by `(grid index, lane)`, which
/// deduplicates them and yields time-then-lane order in one step.
///
/// With `fill_gap > 0`, silences between consecutive notes longer than
/// `fill_gap` seconds receive a note on every beat strictly inside them.
/// Only silences bounded by notes on both sides are filled: the stretch
/// before the first note and after the last one stays empty, so an intro or
/// outro without onsets does not become a run of filler notes.
pub fn synthesize(
    onsets: &[f64],
    grid: &BeatGrid,
    mapper: &dyn LaneMapper,
    fill_gap: f64,
) -> Chart {
    let snap_window = grid.spacing() / 2.0;
    let lane_count = mapper.lane_count();
    let mut keys: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut dropped = 0usize;

    for &onset in onsets {
        let Some(idx) = grid.nearest(onset) else {
            dropped += 1;
            continue;
        };
        if (grid.times[idx] - onset).abs() > snap_window {
            dropped += 1;
            continue;
        }
        let lane = mapper.lane_at(onset).min(lane_count.saturating_sub(1));
        keys.insert((idx, lane));
    }

    if fill_gap > 0.0 {
        let filled = fill_silences(&mut keys, grid, mapper, fill_gap);
        log::debug!("Gap fill added {} notes", filled);
    }

    let notes: Vec<Note> = keys
        .into_iter()
        .map(|(idx, lane)| Note { time: grid.times[idx], lane })
        .collect();

    log::debug!(
        "Synthesized {} notes from {} onsets ({} off-grid)",
        notes.len(),
        onsets.len(),
        dropped
    );

    Chart {
        bpm: grid.bpm,
        subdivision: grid.subdivision,
        lane_count,
        notes,
    }
}

fn fill_silences(
    keys: &mut BTreeSet<(usize, usize)>,
    grid: &BeatGrid,
    mapper: &dyn LaneMapper,
    fill_gap: f64,
) -> usize {
    let occupied: Vec<usize> = keys.iter().map(|&(idx, _)| idx).collect();
    let per_beat = grid.points_per_beat();
    let lane_limit = mapper.lane_count().saturating_sub(1);
    let mut filler = Vec::new();

    for pair in occupied.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if grid.times[to] - grid.times[from] <= fill_gap {
            continue;
        }
        for idx in (from + 1)..to {
            if idx % per_beat == 0 {
                filler.push((idx, mapper.lane_at(grid.times[idx]).min(lane_limit)));
            }
        }
    }

    let added = filler.len();
    keys.extend(filler);
    added
}
