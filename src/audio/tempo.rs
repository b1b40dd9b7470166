//! Autocorrelation tempo estimate from the energy envelope.
//!
//! The envelope is mean-removed and correlated against itself over the lags
//! that correspond to `[min_bpm, max_bpm]`. The correlation is normalized by
//! the zero-lag energy (biased estimator), so among equally periodic lags the
//! shorter one wins and half-tempo octave errors are avoided.

use crate::error::ChartError;

/// Frame lag bounds `(shortest, longest)` for a BPM range.
pub fn lag_bounds(hop_seconds: f64, min_bpm: f32, max_bpm: f32) -> (usize, usize) {
    let shortest = (60.0 / (max_bpm as f64 * hop_seconds)).ceil().max(1.0) as usize;
    let longest = (60.0 / (min_bpm as f64 * hop_seconds)).floor() as usize;
    (shortest, longest)
}

/// Single BPM estimate, within `[min_bpm, max_bpm]` when it succeeds.
///
/// Fails with `InsufficientData` when the envelope holds fewer than two
/// periods of the fastest candidate tempo, carries no variation, or shows no
/// positive correlation at any candidate lag. Callers fall back to a default
/// tempo on failure.
pub fn estimate_tempo(
    envelope: &[f32],
    hop_seconds: f64,
    min_bpm: f32,
    max_bpm: f32,
) -> Result<f32, ChartError> {
    let n = envelope.len();
    if !(hop_seconds > 0.0) {
        return Err(ChartError::InvalidConfig("hop must be positive".to_string()));
    }
    let (shortest, longest) = lag_bounds(hop_seconds, min_bpm, max_bpm);
    let needed = shortest.saturating_mul(2);
    let insufficient = ChartError::InsufficientData { frames: n, needed };

    if n < needed {
        return Err(insufficient);
    }
    let longest = longest.min(n / 2);
    if longest < shortest {
        return Err(insufficient);
    }

    let mean = envelope.iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let centered: Vec<f64> = envelope.iter().map(|&v| v as f64 - mean).collect();
    let energy: f64 = centered.iter().map(|d| d * d).sum();
    if energy <= f64::EPSILON {
        return Err(insufficient);
    }

    let mut best: Option<(usize, f64)> = None;
    for lag in shortest..=longest {
        let r = autocorrelation_at(&centered, lag) / energy;
        if best.map_or(true, |(_, best_r)| r > best_r) {
            best = Some((lag, r));
        }
    }

    match best {
        Some((lag, r)) if r > 0.0 => {
            let bpm = (60.0 / (lag as f64 * hop_seconds)) as f32;
            log::debug!("Tempo: lag={} frames, r={:.3}, {:.2} BPM", lag, r, bpm);
            Ok(bpm.clamp(min_bpm, max_bpm))
        }
        _ => Err(insufficient),
    }
}

fn autocorrelation_at(centered: &[f64], lag: usize) -> f64 {
    centered
        .iter()
        .zip(&centered[lag..])
        .map(|(a, b)| a * b)
        .sum()
}
