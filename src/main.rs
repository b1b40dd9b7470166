mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

use beatlane::audio::decode::decode_audio;
use beatlane::config::{self, Config};
use beatlane::{AnalysisContext, Chart, InputEvent, JudgeWindows, PlaybackSession};
use cli::{ChartFormat, Cli};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    log::info!("beatlane - rhythm chart generator");
    log::info!("Input: {}", cli.input.display());
    log::info!(
        "Tuning: sensitivity={:.2}, 1/{} grid, {} lanes ({:?})",
        cfg.analysis.sensitivity,
        cfg.analysis.subdivision,
        cfg.analysis.lane_count,
        cfg.analysis.lane_strategy
    );

    // 1. Decode audio
    let buffer = decode_audio(&cli.input)?;

    // 2. Spectra, envelope, onsets, tempo, chart
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    spinner.set_message("Computing spectra...");
    let mut ctx = AnalysisContext::new(cfg.analysis.clone())?;
    ctx.load_with_spectra(buffer);

    spinner.set_message("Charting...");
    let analysis = ctx.analyze()?;
    spinner.finish_with_message(format!("Charted {} notes", analysis.chart.len()));

    // 3. Export
    write_chart(&analysis.chart, cli.format, cli.output.as_deref())?;

    // 4. Optional replay
    if let Some(ref path) = cli.replay {
        let windows = JudgeWindows::from(&cfg.judge);
        replay(path, analysis.chart.clone(), windows)?;
    }

    Ok(())
}

/// Config file (explicit, local, or per-user) with CLI flags layered on top.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let config_path = cli.config.clone().or_else(|| {
        let local = PathBuf::from("beatlane.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("beatlane").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("beatlane").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });

    let mut cfg = match config_path {
        Some(ref path) => match config::load_config(path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}, using defaults", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    };

    if let Some(sensitivity) = cli.sensitivity {
        cfg.analysis.sensitivity = sensitivity;
    }
    if let Some(subdivision) = cli.subdivision {
        cfg.analysis.subdivision = subdivision;
    }
    if let Some(lanes) = cli.lanes {
        cfg.analysis.lane_count = lanes;
    }
    if let Some(strategy) = cli.lane_strategy {
        cfg.analysis.lane_strategy = strategy;
    }
    if let Some(fill_gap) = cli.fill_gap {
        cfg.analysis.fill_gap = fill_gap;
    }

    cfg.validate().context("Invalid configuration")?;
    Ok(cfg)
}

fn write_chart(chart: &Chart, format: ChartFormat, output: Option<&Path>) -> Result<()> {
    let rendered = match format {
        ChartFormat::Json => chart.to_json().context("Failed to serialize chart")?,
        ChartFormat::Text => chart.to_string(),
    };

    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write chart: {}", path.display()))?;
            log::info!("Chart written to {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn replay(path: &Path, chart: std::sync::Arc<Chart>, windows: JudgeWindows) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay: {}", path.display()))?;
    let mut events: Vec<InputEvent> = serde_json::from_str(&content)
        .with_context(|| format!("Malformed replay: {}", path.display()))?;
    events.sort_by(|a, b| a.time().total_cmp(&b.time()));

    log::info!("Replaying {} input events", events.len());
    let mut session = PlaybackSession::new(chart, windows);

    for event in events {
        session.advance(event.time());
        if let Some(result) = session.handle(event) {
            log::debug!(
                "{:.3}s: {:?} (offset {})",
                event.time(),
                result.judgment,
                result
                    .offset
                    .map_or_else(|| "-".to_string(), |o| format!("{:+.3}s", o))
            );
        }
    }
    session.advance(f64::INFINITY);

    let snapshot = session.snapshot();
    log::info!(
        "Replay: score {}, max combo {}, {} perfect / {} good / {} unhit of {} notes, \
         {} missed presses, accuracy {:.1}%",
        snapshot.score,
        snapshot.max_combo,
        snapshot.tally.perfect,
        snapshot.tally.good,
        snapshot.tally.expired,
        snapshot.total,
        snapshot.tally.miss,
        snapshot.accuracy * 100.0
    );
    session.stop();
    Ok(())
}
