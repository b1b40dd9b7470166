//! End-to-end checks on synthetic tracks.

use rand::distr::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use beatlane::audio::spectrum::compute_frames;
use beatlane::{
    AnalysisConfig, AnalysisContext, JudgeWindows, Judgment, LaneStrategy, PlaybackSession,
    SampleBuffer,
};

const SAMPLE_RATE: u32 = 44100;
const HOP: usize = 512;
/// 40 hops between clicks: 60 * 44100 / (40 * 512) ≈ 129.2 BPM.
const CLICK_PERIOD: usize = 40 * HOP;
/// One tone per lane band (lane 0 lowest).
const TONES_HZ: [f32; 4] = [1000.0, 8000.0, 14000.0, 19000.0];

fn click_track(seconds: f32) -> Vec<f32> {
    let len = (seconds * SAMPLE_RATE as f32) as usize;
    let mut samples = vec![0.0f32; len];
    let mut k = 0;
    while k * CLICK_PERIOD + HOP <= len {
        let freq = TONES_HZ[k % 4];
        let start = k * CLICK_PERIOD;
        for n in 0..HOP {
            let phase = 2.0 * std::f32::consts::PI * freq * n as f32 / SAMPLE_RATE as f32;
            samples[start + n] = 0.8 * phase.sin();
        }
        k += 1;
    }
    samples
}

/// Deterministic bursty noise for property checks.
fn noisy_track(seconds: f32, seed: u64) -> Vec<f32> {
    let len = (seconds * SAMPLE_RATE as f32) as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    let sample = Uniform::new(-1.0f32, 1.0).unwrap();
    let level = Uniform::new(0.0f32, 1.0).unwrap();
    let mut gain = 0.1f32;
    (0..len)
        .map(|i| {
            if i % 3000 == 0 {
                gain = level.sample(&mut rng);
            }
            sample.sample(&mut rng) * gain
        })
        .collect()
}

fn analyze(samples: Vec<f32>, config: AnalysisConfig) -> beatlane::Analysis {
    let mut ctx = AnalysisContext::new(config).unwrap();
    ctx.load_with_spectra(SampleBuffer::new(samples, SAMPLE_RATE));
    ctx.analyze().unwrap()
}

#[test]
fn click_track_tempo_onsets_and_lanes() {
    let config = AnalysisConfig { subdivision: 4, ..AnalysisConfig::default() };
    let analysis = analyze(click_track(12.0), config);

    let expected_bpm = 60.0 * SAMPLE_RATE as f32 / CLICK_PERIOD as f32;
    assert!(!analysis.tempo.fallback);
    assert!(
        (analysis.tempo.bpm - expected_bpm).abs() < 0.5,
        "bpm {} vs {}",
        analysis.tempo.bpm,
        expected_bpm
    );

    // The click at t=0 has no rising edge; clicks 1..=25 do.
    assert_eq!(analysis.onsets.len(), 25);
    for pair in analysis.onsets.windows(2) {
        assert!(pair[1] - pair[0] >= 0.12);
    }

    let chart = &analysis.chart;
    assert!(chart.is_well_formed());
    assert_eq!(chart.len(), 25);
    let spacing = analysis.grid.spacing();
    for (i, note) in chart.notes.iter().enumerate() {
        let k = i + 1;
        assert!((note.time - k as f64 * spacing).abs() < 1e-6);
        assert_eq!(note.lane, k % 4, "click {k}");
    }
}

#[test]
fn perfect_replay_scores_every_note() {
    let config = AnalysisConfig { subdivision: 4, ..AnalysisConfig::default() };
    let analysis = analyze(click_track(6.0), config);
    assert!(!analysis.chart.is_empty());

    let mut session = PlaybackSession::new(analysis.chart.clone(), JudgeWindows::default());
    for note in analysis.chart.notes.iter() {
        session.advance(note.time);
        assert_eq!(session.press(note.lane, note.time).judgment, Judgment::Perfect);
    }
    session.advance(f64::INFINITY);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.score, 1000 * analysis.chart.len() as u64);
    assert_eq!(snapshot.max_combo as usize, analysis.chart.len());
    assert_eq!(snapshot.tally.miss, 0);
    assert_eq!(snapshot.accuracy, 1.0);

    // Stopping hands back the same chart for another attempt.
    let chart = session.stop();
    let retry = PlaybackSession::new(chart, JudgeWindows::default());
    assert_eq!(retry.snapshot().remaining, analysis.chart.len());
}

#[test]
fn noisy_tracks_keep_invariants() {
    for seed in [1u64, 7, 42] {
        for strategy in [LaneStrategy::Bands, LaneStrategy::Centroid] {
            let config = AnalysisConfig {
                sensitivity: 3.0,
                subdivision: 16,
                lane_strategy: strategy,
                ..AnalysisConfig::default()
            };
            let analysis = analyze(noisy_track(8.0, seed), config);

            for pair in analysis.onsets.windows(2) {
                assert!(pair[1] - pair[0] >= 0.12);
            }
            let bpm = analysis.tempo.bpm;
            assert!(analysis.tempo.fallback || (40.0..=220.0).contains(&bpm));

            let spacing = 60.0 / bpm as f64 * 4.0 / 16.0;
            for pair in analysis.grid.times.windows(2) {
                assert!((pair[1] - pair[0] - spacing).abs() < 1e-9);
            }

            assert!(analysis.chart.is_well_formed());
            assert!(analysis.chart.notes.iter().all(|n| n.lane < 4));
        }
    }
}

#[test]
fn resynthesis_is_identical() {
    let samples = noisy_track(5.0, 99);
    let a = analyze(samples.clone(), AnalysisConfig::default());
    let b = analyze(samples, AnalysisConfig::default());
    assert_eq!(a.onsets, b.onsets);
    assert_eq!(a.tempo, b.tempo);
    assert_eq!(*a.chart, *b.chart);
}

#[test]
fn sensitivity_retune_changes_onset_count() {
    let samples = noisy_track(6.0, 3);
    let mut ctx = AnalysisContext::new(AnalysisConfig {
        sensitivity: 0.5,
        ..AnalysisConfig::default()
    })
    .unwrap();
    ctx.load_with_spectra(SampleBuffer::new(samples, SAMPLE_RATE));
    let strict = ctx.analyze().unwrap().onsets.len();

    ctx.set_config(AnalysisConfig { sensitivity: 8.0, ..AnalysisConfig::default() })
        .unwrap();
    let loose = ctx.analyze().unwrap().onsets.len();
    assert!(loose >= strict, "loose {loose} < strict {strict}");
}

#[test]
fn missing_spectra_map_everything_to_lane_zero() {
    let samples = click_track(4.0);
    let mut ctx = AnalysisContext::new(AnalysisConfig { subdivision: 4, ..AnalysisConfig::default() })
        .unwrap();
    ctx.load(SampleBuffer::new(samples.clone(), SAMPLE_RATE), Vec::new());
    let chart = ctx.analyze().unwrap().chart;
    assert!(!chart.is_empty());
    assert!(chart.notes.iter().all(|n| n.lane == 0));

    // Supplying the spectra explicitly matches load_with_spectra.
    let spectra = compute_frames(&samples, SAMPLE_RATE, 2048, HOP);
    ctx.load(SampleBuffer::new(samples, SAMPLE_RATE), spectra);
    let with_spectra = ctx.analyze().unwrap().chart;
    assert!(with_spectra.notes.iter().any(|n| n.lane != 0));
}
