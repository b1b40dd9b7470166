/// Magnitude spectrum of one analysis frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectralFrame {
    /// Frame start in seconds
    pub time: f64,
    /// FFT magnitude bins (N/2 elements, linear scale)
    pub magnitudes: Vec<f32>,
}

impl SpectralFrame {
    /// Summed magnitude per band after splitting bins `1..len` (DC excluded)
    /// into `bands` contiguous ranges of near-equal width, lowest first.
    pub fn band_energies(&self, bands: usize) -> Vec<f32> {
        if self.magnitudes.len() < 2 {
            return vec![0.0; bands];
        }
        let usable = self.magnitudes.len() - 1;
        (0..bands)
            .map(|band| {
                let start = 1 + band * usable / bands;
                let end = 1 + (band + 1) * usable / bands;
                self.magnitudes[start..end].iter().sum()
            })
            .collect()
    }

    /// Magnitude-weighted mean bin index, or `None` for a silent frame.
    pub fn centroid_bin(&self) -> Option<f32> {
        let total: f32 = self.magnitudes.iter().sum();
        if total <= 1e-10 {
            return None;
        }
        let weighted: f32 = self
            .magnitudes
            .iter()
            .enumerate()
            .map(|(i, &mag)| i as f32 * mag)
            .sum();
        Some(weighted / total)
    }
}

/// Index of the frame whose time is nearest `time`; ties go to the earlier
/// frame. Frames must be sorted by time.
pub fn nearest_frame(frames: &[SpectralFrame], time: f64) -> Option<usize> {
    if frames.is_empty() {
        return None;
    }
    let idx = frames.partition_point(|f| f.time < time);
    if idx == 0 {
        return Some(0);
    }
    if idx >= frames.len() {
        return Some(frames.len() - 1);
    }
    let before = time - frames[idx - 1].time;
    let after = frames[idx].time - time;
    Some(if after < before { idx } else { idx - 1 })
}
