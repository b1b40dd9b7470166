use anyhow::{Context, Result};
use std::path::Path;
use symphonia::core::audio::SampleBuffer as DecodeBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Anything that can hand the analysis pipeline a mono track.
pub trait AudioSource {
    fn samples(&self) -> &[f32];
    fn sample_rate(&self) -> u32;

    fn duration(&self) -> f64 {
        if self.sample_rate() == 0 {
            return 0.0;
        }
        self.samples().len() as f64 / self.sample_rate() as f64
    }
}

/// Immutable mono samples plus their rate.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }
}

impl AudioSource for SampleBuffer {
    fn samples(&self) -> &[f32] {
        &self.samples
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Decode the first audio track of `path`, downmixed to mono.
pub fn decode_audio(path: &Path) -> Result<SampleBuffer> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe audio format")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .context("No audio tracks found")?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count()).max(1);
    let sample_rate = track.codec_params.sample_rate.context("Unknown sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create audio decoder")?;

    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(symphonia::core::errors::Error::DecodeError(msg)) => {
                log::debug!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        let mut interleaved = DecodeBuffer::<f32>::new(decoded.frames() as u64, spec);
        interleaved.copy_interleaved_ref(decoded);
        downmix_into(interleaved.samples(), channels, &mut mono);
    }

    let buffer = SampleBuffer::new(mono, sample_rate);
    log::info!(
        "Decoded {}: {} mono samples, {}Hz, {:.1}s",
        path.display(),
        buffer.samples().len(),
        sample_rate,
        buffer.duration()
    );

    Ok(buffer)
}

fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_from_length_and_rate() {
        let buffer = SampleBuffer::new(vec![0.0; 22050], 44100);
        assert!((buffer.duration() - 0.5).abs() < 1e-12);
        assert_eq!(SampleBuffer::new(vec![0.0; 10], 0).duration(), 0.0);
    }

    #[test]
    fn downmix_averages_channels() {
        let mut out = Vec::new();
        downmix_into(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2, &mut out);
        assert_eq!(out, vec![0.5, 0.5, 0.0]);

        let mut out = Vec::new();
        downmix_into(&[0.25, -0.25], 1, &mut out);
        assert_eq!(out, vec![0.25, -0.25]);
    }
}
