use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::features::SpectralFrame;

/// Hann-windowed magnitude spectra every `hop` samples, fixed `fft_size`.
///
/// Frame `i` starts at sample `i * hop`, matching the envelope's frame clock.
/// The tail frame is zero-padded rather than dropped so late onsets still see
/// a spectrum.
pub fn compute_frames(
    samples: &[f32],
    sample_rate: u32,
    fft_size: usize,
    hop: usize,
) -> Vec<SpectralFrame> {
    if samples.is_empty() || sample_rate == 0 || fft_size < 2 || hop == 0 {
        return Vec::new();
    }
    let indices: Vec<usize> = (0..samples.len().div_ceil(hop)).collect();
    compute_frames_at(samples, sample_rate, fft_size, hop, &indices)
}

/// The frames of [`compute_frames`] with the given indices only, in the
/// order given. Out-of-range indices are skipped.
///
/// Sampling just the frames a chart reads keeps memory proportional to the
/// note count instead of the track length.
pub fn compute_frames_at(
    samples: &[f32],
    sample_rate: u32,
    fft_size: usize,
    hop: usize,
    indices: &[usize],
) -> Vec<SpectralFrame> {
    if samples.is_empty() || sample_rate == 0 || fft_size < 2 || hop == 0 {
        return Vec::new();
    }

    let total_frames = samples.len().div_ceil(hop);
    let hann = hann_window(fft_size);
    let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);

    log::debug!(
        "Spectra: {} of {} frames (fft={}, hop={})",
        indices.len(),
        total_frames,
        fft_size,
        hop
    );

    indices
        .par_iter()
        .filter(|&&frame_idx| frame_idx < total_frames)
        .map(|&frame_idx| spectral_frame(samples, sample_rate, &hann, &fft, frame_idx * hop))
        .collect()
}

/// Index of the frame on the `hop` clock whose start is nearest `time`;
/// ties go to the earlier frame.
pub fn frame_index_near(time: f64, sample_rate: u32, hop: usize, total_frames: usize) -> usize {
    if total_frames == 0 || hop == 0 {
        return 0;
    }
    let position = (time * sample_rate as f64 / hop as f64).max(0.0);
    let below = position.floor();
    let idx = if position - below > 0.5 { below + 1.0 } else { below };
    (idx as usize).min(total_frames - 1)
}

fn spectral_frame(
    samples: &[f32],
    sample_rate: u32,
    hann: &[f32],
    fft: &Arc<dyn Fft<f32>>,
    start: usize,
) -> SpectralFrame {
    let fft_size = hann.len();
    let end = (start + fft_size).min(samples.len());

    let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); fft_size];
    for (i, &s) in samples[start..end].iter().enumerate() {
        buffer[i] = Complex::new(s * hann[i], 0.0);
    }
    fft.process(&mut buffer);

    SpectralFrame {
        time: start as f64 / sample_rate as f64,
        magnitudes: buffer[..fft_size / 2].iter().map(|c| c.norm()).collect(),
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}
