use serde::Deserialize;
use std::path::Path;

use crate::error::ChartError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub judge: JudgeConfig,
}

/// Tuning for the offline chart pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// RMS window in samples
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Hop between envelope frames in samples
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
    /// Transform size for spectral frames
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    /// Onset threshold divisor; higher finds more onsets
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    /// Normalized flux threshold before sensitivity is applied
    #[serde(default = "default_onset_threshold")]
    pub onset_threshold: f32,
    /// Minimum spacing between accepted onsets (seconds)
    #[serde(default = "default_min_onset_gap")]
    pub min_onset_gap: f64,
    #[serde(default = "default_min_bpm")]
    pub min_bpm: f32,
    #[serde(default = "default_max_bpm")]
    pub max_bpm: f32,
    /// Used when tempo estimation fails
    #[serde(default = "default_bpm")]
    pub default_bpm: f32,
    /// Grid density: 4 = quarter notes, 8 = eighths, 16 = sixteenths
    #[serde(default = "default_subdivision")]
    pub subdivision: u32,
    #[serde(default = "default_lane_count")]
    pub lane_count: usize,
    #[serde(default)]
    pub lane_strategy: LaneStrategy,
    /// Silences longer than this (seconds) get on-beat filler notes; 0 disables
    #[serde(default)]
    pub fill_gap: f64,
}

/// Judgment windows (seconds, inclusive) and score awards.
#[derive(Debug, Clone, Deserialize)]
pub struct JudgeConfig {
    #[serde(default = "default_perfect_window")]
    pub perfect_window: f64,
    #[serde(default = "default_good_window")]
    pub good_window: f64,
    #[serde(default = "default_miss_window")]
    pub miss_window: f64,
    #[serde(default = "default_perfect_score")]
    pub perfect_score: u64,
    #[serde(default = "default_good_score")]
    pub good_score: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LaneStrategy {
    /// Loudest frequency band picks the lane
    #[default]
    Bands,
    /// Spectral centroid picks the lane
    Centroid,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            hop_size: default_hop_size(),
            fft_size: default_fft_size(),
            sensitivity: default_sensitivity(),
            onset_threshold: default_onset_threshold(),
            min_onset_gap: default_min_onset_gap(),
            min_bpm: default_min_bpm(),
            max_bpm: default_max_bpm(),
            default_bpm: default_bpm(),
            subdivision: default_subdivision(),
            lane_count: default_lane_count(),
            lane_strategy: LaneStrategy::default(),
            fill_gap: 0.0,
        }
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            perfect_window: default_perfect_window(),
            good_window: default_good_window(),
            miss_window: default_miss_window(),
            perfect_score: default_perfect_score(),
            good_score: default_good_score(),
        }
    }
}

fn default_window_size() -> usize { 1024 }
fn default_hop_size() -> usize { 512 }
fn default_fft_size() -> usize { 2048 }
fn default_sensitivity() -> f32 { 1.5 }
fn default_onset_threshold() -> f32 { 0.18 }
fn default_min_onset_gap() -> f64 { 0.12 }
fn default_min_bpm() -> f32 { 40.0 }
fn default_max_bpm() -> f32 { 220.0 }
fn default_bpm() -> f32 { 120.0 }
fn default_subdivision() -> u32 { 8 }
fn default_lane_count() -> usize { 4 }
fn default_perfect_window() -> f64 { 0.08 }
fn default_good_window() -> f64 { 0.18 }
fn default_miss_window() -> f64 { 0.30 }
fn default_perfect_score() -> u64 { 1000 }
fn default_good_score() -> u64 { 500 }

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ChartError> {
        let invalid = |msg: &str| Err(ChartError::InvalidConfig(msg.to_string()));
        if self.window_size == 0 || self.hop_size == 0 {
            return invalid("window_size and hop_size must be > 0");
        }
        if self.fft_size < 2 {
            return invalid("fft_size must be at least 2");
        }
        if !(self.sensitivity > 0.0) {
            return invalid("sensitivity must be > 0");
        }
        if !(self.min_bpm > 0.0 && self.min_bpm < self.max_bpm) {
            return invalid("bpm range must satisfy 0 < min_bpm < max_bpm");
        }
        if !(self.default_bpm > 0.0) {
            return invalid("default_bpm must be > 0");
        }
        if self.subdivision == 0 {
            return invalid("subdivision must be >= 1");
        }
        if self.lane_count < 2 {
            return invalid("lane_count must be >= 2");
        }
        if self.fill_gap < 0.0 || self.min_onset_gap < 0.0 {
            return invalid("fill_gap and min_onset_gap must not be negative");
        }
        Ok(())
    }
}

impl JudgeConfig {
    pub fn validate(&self) -> Result<(), ChartError> {
        let ordered = 0.0 <= self.perfect_window
            && self.perfect_window <= self.good_window
            && self.good_window <= self.miss_window;
        if !ordered {
            return Err(ChartError::InvalidConfig(
                "judge windows must satisfy 0 <= perfect <= good <= miss".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ChartError> {
        self.analysis.validate()?;
        self.judge.validate()
    }
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Malformed config {}: {}", path.display(), err);
            None
        }
    }
}
