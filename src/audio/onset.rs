//! Energy-flux onset detection.
//!
//! `flux[j] = max(0, env[j + 1] - env[j])` is normalized against its peak and
//! thresholded at `base_threshold / sensitivity`. Flux index `j` describes the
//! rise into envelope frame `j + 1`, so that frame's start time is the onset.

/// Parameters for [`detect_onsets`].
#[derive(Clone, Copy, Debug)]
pub struct OnsetParams {
    pub sensitivity: f32,
    pub base_threshold: f32,
    /// Seconds
    pub min_gap: f64,
}

impl Default for OnsetParams {
    fn default() -> Self {
        Self {
            sensitivity: 1.5,
            base_threshold: 0.18,
            min_gap: 0.12,
        }
    }
}

/// Rectified first difference of the envelope, one shorter than its input.
pub fn energy_flux(envelope: &[f32]) -> Vec<f32> {
    envelope.windows(2).map(|w| (w[1] - w[0]).max(0.0)).collect()
}

/// Onset times (seconds) whose normalized flux clears the threshold, before
/// the minimum-gap rule is applied.
pub fn onset_candidates(
    envelope: &[f32],
    hop: usize,
    sample_rate: u32,
    params: &OnsetParams,
) -> Vec<f64> {
    if sample_rate == 0 {
        return Vec::new();
    }

    let flux = energy_flux(envelope);
    let peak = flux.iter().copied().fold(0.0f32, f32::max);
    let peak = if peak > 0.0 { peak } else { 1.0 };
    let threshold = params.base_threshold / params.sensitivity;

    flux.iter()
        .enumerate()
        .filter(|(_, &f)| f / peak > threshold)
        .map(|(j, _)| (j + 1) as f64 * hop as f64 / sample_rate as f64)
        .collect()
}

/// Strictly increasing onset times at least `min_gap` apart.
///
/// Candidates closer than `min_gap` to the last accepted onset are dropped:
/// the earliest candidate of a cluster wins, not the strongest.
pub fn detect_onsets(
    envelope: &[f32],
    hop: usize,
    sample_rate: u32,
    params: &OnsetParams,
) -> Vec<f64> {
    let candidates = onset_candidates(envelope, hop, sample_rate, params);
    let mut onsets: Vec<f64> = Vec::with_capacity(candidates.len());

    for time in candidates {
        let far_enough = onsets.last().map_or(true, |&last| time - last >= params.min_gap);
        if far_enough {
            onsets.push(time);
        }
    }

    log::debug!(
        "Onsets: {} accepted (sensitivity={:.2}, threshold={:.3})",
        onsets.len(),
        params.sensitivity,
        params.base_threshold / params.sensitivity
    );
    onsets
}
