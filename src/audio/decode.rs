/// Unified sample loader.
///
/// Dispatches to the appropriate decoder based on file extension and
/// provides fallback search across formats (`.wav` → `.ogg` → `.mp3`).
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::audio::pcm::Pcm;

/// Supported sample extensions, in search priority order.
const SAMPLE_EXTENSIONS: &[&str] = &[".wav", ".ogg", ".mp3"];

/// Load a sample from a file path, dispatching to the correct decoder.
pub fn load_sample(path: &Path) -> Result<Pcm> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "wav" => decode_wav(path),
        "ogg" => decode_ogg(path),
        "mp3" => decode_mp3(path),
        _ => bail!("Unsupported sample format: .{ext}"),
    }
}

/// Resolve a sample path by trying alternative extensions.
///
/// Tries the name as given first, then swaps in each supported extension
/// in priority order.
pub fn resolve_sample_path(base: &Path, name: &str) -> Option<PathBuf> {
    let original = base.join(name);
    if original.exists() {
        return Some(original);
    }

    let stem = match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    };
    let original_ext = name.rfind('.').map(|idx| &name[idx..]);

    for &ext in SAMPLE_EXTENSIONS {
        if Some(ext) == original_ext {
            continue;
        }
        let candidate = base.join(format!("{stem}{ext}"));
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}

fn decode_wav(path: &Path) -> Result<Pcm> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .with_context(|| format!("Failed to decode WAV samples: {}", path.display()))?,
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<std::result::Result<_, _>>()
                .with_context(|| format!("Failed to decode WAV samples: {}", path.display()))?
        }
    };

    Ok(Pcm::new(samples, spec.channels, spec.sample_rate))
}

fn decode_ogg(path: &Path) -> Result<Pcm> {
    let mut reader = lewton::inside_ogg::OggStreamReader::new(
        std::fs::File::open(path)
            .with_context(|| format!("Failed to open OGG file: {}", path.display()))?,
    )
    .with_context(|| format!("Failed to parse OGG stream: {}", path.display()))?;

    let channels = reader.ident_hdr.audio_channels as u16;
    let sample_rate = reader.ident_hdr.audio_sample_rate;

    let mut all_samples: Vec<f32> = Vec::new();
    while let Some(packet) = reader
        .read_dec_packet_itl()
        .with_context(|| format!("Failed to decode OGG packet: {}", path.display()))?
    {
        // lewton returns interleaved i16 samples
        for &s in &packet {
            all_samples.push(s as f32 / i16::MAX as f32);
        }
    }

    Ok(Pcm::new(all_samples, channels, sample_rate))
}

fn decode_mp3(path: &Path) -> Result<Pcm> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read MP3 file: {}", path.display()))?;
    let mut decoder = minimp3::Decoder::new(std::io::Cursor::new(data));

    let mut all_samples: Vec<f32> = Vec::new();
    let mut channels: u16 = 0;
    let mut sample_rate: u32 = 0;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if channels == 0 {
                    channels = frame.channels as u16;
                    sample_rate = frame.sample_rate as u32;
                }
                for &s in &frame.data {
                    all_samples.push(s as f32 / i16::MAX as f32);
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::SkippedData) => continue,
            Err(e) => return Err(anyhow::anyhow!("MP3 decode error: {e:?}")),
        }
    }

    if channels == 0 || sample_rate == 0 {
        bail!("Failed to decode any MP3 frames: {}", path.display());
    }

    Ok(Pcm::new(all_samples, channels, sample_rate))
}

/// Decode collaborator used by the sample cache.
///
/// Kept behind a trait so tests can count decode calls and feed synthetic
/// buffers without touching the filesystem.
pub trait SampleDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Pcm>;
}

/// Filesystem-backed decoder used in production.
#[derive(Debug, Default)]
pub struct FsDecoder;

impl SampleDecoder for FsDecoder {
    fn decode(&self, path: &Path) -> Result<Pcm> {
        load_sample(path)
    }
}
