//! Short-time RMS energy envelope.

/// RMS energy of `samples[i..i + window]` for `i = 0, hop, 2 * hop, …`.
///
/// Produces `floor((len - window) / hop)` frames; a buffer shorter than the
/// window (or a zero window/hop) yields an empty envelope rather than an error,
/// and every downstream stage accepts that.
pub fn extract_envelope(samples: &[f32], window: usize, hop: usize) -> Vec<f32> {
    if window == 0 || hop == 0 || samples.len() < window {
        return Vec::new();
    }

    let num_frames = (samples.len() - window) / hop;
    let envelope: Vec<f32> = (0..num_frames)
        .map(|frame| {
            let start = frame * hop;
            let sum_sq: f32 = samples[start..start + window].iter().map(|s| s * s).sum();
            (sum_sq / window as f32).sqrt()
        })
        .collect();

    log::debug!(
        "Envelope: {} frames from {} samples (window={}, hop={})",
        envelope.len(),
        samples.len(),
        window,
        hop
    );
    envelope
}

/// Seconds spanned by one envelope hop.
pub fn hop_seconds(hop: usize, sample_rate: u32) -> f64 {
    hop as f64 / sample_rate as f64
}
