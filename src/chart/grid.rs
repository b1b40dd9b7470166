use crate::error::ChartError;

/// Tolerance for float drift when testing `t_n <= duration`.
const EDGE_EPSILON: f64 = 1e-9;

/// Evenly spaced candidate note times from 0 to the track duration.
#[derive(Clone, Debug, PartialEq)]
pub struct BeatGrid {
    pub bpm: f32,
    pub subdivision: u32,
    pub times: Vec<f64>,
}

impl BeatGrid {
    /// Seconds between grid points: `60 / bpm * 4 / subdivision`.
    pub fn spacing(&self) -> f64 {
        grid_spacing(self.bpm, self.subdivision)
    }

    /// Index of the grid time nearest `time`; ties go to the earlier point.
    pub fn nearest(&self, time: f64) -> Option<usize> {
        if self.times.is_empty() {
            return None;
        }
        let idx = self.times.partition_point(|&t| t < time);
        if idx == 0 {
            return Some(0);
        }
        if idx >= self.times.len() {
            return Some(self.times.len() - 1);
        }
        let before = time - self.times[idx - 1];
        let after = self.times[idx] - time;
        Some(if after < before { idx } else { idx - 1 })
    }

    /// Grid points per beat; 1 for subdivisions coarser than a quarter note.
    pub fn points_per_beat(&self) -> usize {
        (self.subdivision as usize / 4).max(1)
    }
}

fn grid_spacing(bpm: f32, subdivision: u32) -> f64 {
    60.0 / bpm as f64 * 4.0 / subdivision as f64
}

/// `t_n = n * 60 / bpm * 4 / subdivision` for every `t_n <= duration`.
///
/// Points are computed by multiplication, not accumulation, so the spacing
/// stays exact over long tracks.
pub fn build_grid(bpm: f32, subdivision: u32, duration: f64) -> Result<BeatGrid, ChartError> {
    if !(bpm > 0.0) || !bpm.is_finite() {
        return Err(ChartError::DegenerateTempo(bpm));
    }
    if subdivision == 0 {
        return Err(ChartError::InvalidConfig("subdivision must be >= 1".to_string()));
    }

    let spacing = grid_spacing(bpm, subdivision);
    let times: Vec<f64> = if duration >= 0.0 {
        let last = (duration / spacing + EDGE_EPSILON).floor() as usize;
        (0..=last).map(|n| n as f64 * spacing).collect()
    } else {
        Vec::new()
    };

    log::debug!(
        "Grid: {} points at {:.4}s spacing ({:.2} BPM, 1/{})",
        times.len(),
        spacing,
        bpm,
        subdivision
    );
    Ok(BeatGrid { bpm, subdivision, times })
}
