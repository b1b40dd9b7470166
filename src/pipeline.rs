//! Track → chart orchestration.
//!
//! An [`AnalysisContext`] owns one loaded track and the tuning used to chart
//! it. Every call to [`AnalysisContext::analyze`] recomputes the derived
//! artifacts from scratch, so changing sensitivity or subdivision is just
//! another call.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::audio::decode::{AudioSource, SampleBuffer};
use crate::audio::envelope::{extract_envelope, hop_seconds};
use crate::audio::features::SpectralFrame;
use crate::audio::onset::{detect_onsets, OnsetParams};
use crate::audio::spectrum::{compute_frames_at, frame_index_near};
use crate::audio::tempo::estimate_tempo;
use crate::chart::grid::{build_grid, BeatGrid};
use crate::chart::lanes::mapper_for;
use crate::chart::synth::synthesize;
use crate::chart::Chart;
use crate::config::AnalysisConfig;
use crate::error::ChartError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoEstimate {
    pub bpm: f32,
    /// True when estimation failed and the configured default was used.
    pub fallback: bool,
}

/// Everything derived from one analysis run.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub envelope: Vec<f32>,
    pub onsets: Vec<f64>,
    pub tempo: TempoEstimate,
    pub grid: BeatGrid,
    pub chart: Arc<Chart>,
}

enum Spectra {
    Provided(Vec<SpectralFrame>),
    /// Sampled per analysis at the times the chart reads.
    OnDemand,
}

struct Track {
    buffer: SampleBuffer,
    spectra: Spectra,
}

pub struct AnalysisContext {
    config: AnalysisConfig,
    track: Option<Track>,
}

impl AnalysisContext {
    pub fn new(config: AnalysisConfig) -> Result<Self, ChartError> {
        config.validate()?;
        Ok(Self { config, track: None })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Replace the tuning; the next [`analyze`](Self::analyze) uses it.
    pub fn set_config(&mut self, config: AnalysisConfig) -> Result<(), ChartError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Load a track with externally computed spectra (may be empty, in which
    /// case every note falls back to lane 0).
    pub fn load(&mut self, buffer: SampleBuffer, spectra: Vec<SpectralFrame>) {
        log::debug!(
            "Loaded track: {:.1}s, {} spectral frames",
            buffer.duration(),
            spectra.len()
        );
        self.track = Some(Track { buffer, spectra: Spectra::Provided(spectra) });
    }

    /// Load a track whose spectra come from its own samples.
    ///
    /// Frames are taken on the envelope's clock, but only those nearest the
    /// onset (and gap-fill) times of each analysis are computed, so the full
    /// per-hop spectrogram is never held in memory.
    pub fn load_with_spectra(&mut self, buffer: SampleBuffer) {
        log::debug!("Loaded track: {:.1}s, spectra on demand", buffer.duration());
        self.track = Some(Track { buffer, spectra: Spectra::OnDemand });
    }

    pub fn unload(&mut self) {
        self.track = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.track.is_some()
    }

    pub fn analyze(&self) -> Result<Analysis, ChartError> {
        let track = self.track.as_ref().ok_or(ChartError::NotLoaded)?;
        let cfg = &self.config;
        let samples = track.buffer.samples();
        let sample_rate = track.buffer.sample_rate();
        if sample_rate == 0 {
            return Err(ChartError::InvalidConfig("sample rate must be > 0".to_string()));
        }

        let envelope = extract_envelope(samples, cfg.window_size, cfg.hop_size);

        let onset_params = OnsetParams {
            sensitivity: cfg.sensitivity,
            base_threshold: cfg.onset_threshold,
            min_gap: cfg.min_onset_gap,
        };
        let onsets = detect_onsets(&envelope, cfg.hop_size, sample_rate, &onset_params);

        let hop_s = hop_seconds(cfg.hop_size, sample_rate);
        let tempo = match estimate_tempo(&envelope, hop_s, cfg.min_bpm, cfg.max_bpm) {
            Ok(bpm) => TempoEstimate { bpm, fallback: false },
            Err(err) => {
                log::warn!("Tempo estimation failed ({}), using {} BPM", err, cfg.default_bpm);
                TempoEstimate { bpm: cfg.default_bpm, fallback: true }
            }
        };

        let grid = build_grid(tempo.bpm, cfg.subdivision, track.buffer.duration())?;
        let sampled;
        let frames: &[SpectralFrame] = match &track.spectra {
            Spectra::Provided(frames) => frames,
            Spectra::OnDemand => {
                sampled = self.sample_spectra(&track.buffer, &onsets, &grid);
                &sampled
            }
        };
        let mapper = mapper_for(cfg.lane_strategy, frames, cfg.lane_count);
        let chart = synthesize(&onsets, &grid, mapper.as_ref(), cfg.fill_gap);

        if onsets.is_empty() {
            log::warn!("No onsets detected; chart is empty");
        }
        log::info!(
            "Analysis: {} onsets, {:.2} BPM{}, {} notes",
            onsets.len(),
            tempo.bpm,
            if tempo.fallback { " (default)" } else { "" },
            chart.len()
        );

        Ok(Analysis {
            envelope,
            onsets,
            tempo,
            grid,
            chart: Arc::new(chart),
        })
    }

    /// Spectral frames nearest every time the lane mapper will be asked
    /// about: each onset, plus every grid point when gap filling is on.
    fn sample_spectra(
        &self,
        buffer: &SampleBuffer,
        onsets: &[f64],
        grid: &BeatGrid,
    ) -> Vec<SpectralFrame> {
        let cfg = &self.config;
        let sample_rate = buffer.sample_rate();
        let total_frames = buffer.samples().len().div_ceil(cfg.hop_size);
        let fill_times: &[f64] = if cfg.fill_gap > 0.0 { &grid.times } else { &[] };

        let indices: BTreeSet<usize> = onsets
            .iter()
            .chain(fill_times)
            .map(|&t| frame_index_near(t, sample_rate, cfg.hop_size, total_frames))
            .collect();
        let indices: Vec<usize> = indices.into_iter().collect();

        compute_frames_at(buffer.samples(), sample_rate, cfg.fft_size, cfg.hop_size, &indices)
    }
}
