use beatlane::LaneStrategy;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "beatlane", about = "Generate rhythm-game charts from audio and replay inputs against them")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Write the chart here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Chart output format
    #[arg(short, long, value_enum, default_value_t = ChartFormat::Json)]
    pub format: ChartFormat,

    /// Config file (default: ./beatlane.toml, then the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Onset sensitivity; higher values find more onsets
    #[arg(short, long)]
    pub sensitivity: Option<f32>,

    /// Grid subdivision (4 = quarter, 8 = eighth, 16 = sixteenth)
    #[arg(long)]
    pub subdivision: Option<u32>,

    /// Number of lanes
    #[arg(long)]
    pub lanes: Option<usize>,

    /// Lane assignment strategy
    #[arg(long, value_enum)]
    pub lane_strategy: Option<LaneStrategy>,

    /// Fill silences longer than this many seconds with on-beat notes
    #[arg(long)]
    pub fill_gap: Option<f64>,

    /// JSON press log ([{"kind":"press","lane":0,"time":1.25}, ...]) to judge
    /// against the generated chart
    #[arg(long)]
    pub replay: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChartFormat {
    Json,
    Text,
}
