//! Lane assignment strategies.
//!
//! The synthesizer only sees the [`LaneMapper`] trait, so mappings can be
//! swapped without touching chart generation.

use crate::audio::features::{nearest_frame, SpectralFrame};
use crate::config::LaneStrategy;

pub trait LaneMapper {
    fn lane_count(&self) -> usize;

    /// Lane for a note at `time`. Must be deterministic and `< lane_count()`.
    fn lane_at(&self, time: f64) -> usize;
}

/// Splits the spectrum into `lane_count` equal bands, low frequencies on
/// lane 0, and picks the loudest band of the frame nearest the note.
pub struct BandLaneMapper<'a> {
    frames: &'a [SpectralFrame],
    lane_count: usize,
}

impl<'a> BandLaneMapper<'a> {
    /// A `lane_count` of 0 is treated as a single lane.
    pub fn new(frames: &'a [SpectralFrame], lane_count: usize) -> Self {
        Self { frames, lane_count: lane_count.max(1) }
    }
}

impl LaneMapper for BandLaneMapper<'_> {
    fn lane_count(&self) -> usize {
        self.lane_count
    }

    fn lane_at(&self, time: f64) -> usize {
        let Some(idx) = nearest_frame(self.frames, time) else {
            return 0;
        };
        let energies = self.frames[idx].band_energies(self.lane_count);
        let mut best = 0;
        for (lane, &energy) in energies.iter().enumerate() {
            if energy > energies[best] {
                best = lane;
            }
        }
        best
    }
}

/// Maps the nearest frame's spectral centroid linearly across lanes.
pub struct CentroidLaneMapper<'a> {
    frames: &'a [SpectralFrame],
    lane_count: usize,
}

impl<'a> CentroidLaneMapper<'a> {
    /// A `lane_count` of 0 is treated as a single lane.
    pub fn new(frames: &'a [SpectralFrame], lane_count: usize) -> Self {
        Self { frames, lane_count: lane_count.max(1) }
    }
}

impl LaneMapper for CentroidLaneMapper<'_> {
    fn lane_count(&self) -> usize {
        self.lane_count
    }

    fn lane_at(&self, time: f64) -> usize {
        let Some(frame) = nearest_frame(self.frames, time).map(|i| &self.frames[i]) else {
            return 0;
        };
        let bins = frame.magnitudes.len();
        match frame.centroid_bin() {
            Some(centroid) if bins > 1 => {
                let position = (centroid / bins as f32).clamp(0.0, 1.0);
                ((position * self.lane_count as f32) as usize).min(self.lane_count - 1)
            }
            _ => 0,
        }
    }
}

pub fn mapper_for<'a>(
    strategy: LaneStrategy,
    frames: &'a [SpectralFrame],
    lane_count: usize,
) -> Box<dyn LaneMapper + 'a> {
    match strategy {
        LaneStrategy::Bands => Box::new(BandLaneMapper::new(frames, lane_count)),
        LaneStrategy::Centroid => Box::new(CentroidLaneMapper::new(frames, lane_count)),
    }
}
