use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use kira::AudioManager;
use kira::AudioManagerSettings;
use kira::sound::static_sound::{StaticSoundData, StaticSoundHandle};
use tracing::warn;

use crate::audio::pcm::Pcm;

/// Handle to a loop instance attached to the output graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoopHandle(pub u64);

/// The audio output collaborator.
///
/// The core decides what to play and when; rendering belongs to the
/// implementation behind this trait. Failures are the implementation's to
/// log; playback degrades to "this one sound did not play".
pub trait OutputGraph: Send {
    /// Fire a one-shot sample.
    fn play_one_shot(&mut self, pcm: &Arc<Pcm>, volume: f32, balance: f32);

    /// Attach a continuously looping sound. `None` means the attach failed
    /// (already logged).
    fn attach_loop(&mut self, pcm: &Arc<Pcm>, volume: f32, balance: f32) -> Option<LoopHandle>;

    /// Adjust a playing loop in place.
    fn set_loop_volume(&mut self, handle: LoopHandle, volume: f32);
    fn set_loop_balance(&mut self, handle: LoopHandle, balance: f32);

    /// Detach and dispose a loop instance.
    fn detach_loop(&mut self, handle: LoopHandle);

    /// Stop every tracked sound immediately.
    fn stop_all(&mut self);
}

/// Convert Pcm (f32 interleaved) to WAV bytes in memory.
fn pcm_to_wav_bytes(pcm: &Pcm) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    let spec = hound::WavSpec {
        channels: pcm.channels,
        sample_rate: pcm.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    for &sample in &pcm.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(cursor.into_inner())
}

/// Map balance (-1..1) to kira's 0..1 panning.
fn kira_pan(balance: f32) -> f32 {
    ((balance + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// kira-backed output graph used in production.
pub struct KiraOutput {
    manager: AudioManager,
    /// Converted sound data keyed by buffer address, so repeated plays of
    /// the same cached Pcm skip the WAV re-encode.
    converted: HashMap<usize, StaticSoundData>,
    /// Active loop handles.
    loops: HashMap<u64, StaticSoundHandle>,
    next_id: u64,
}

impl KiraOutput {
    pub fn new() -> Result<Self> {
        let manager = AudioManager::new(AudioManagerSettings::default())
            .map_err(|e| anyhow!("Failed to create audio manager: {e}"))?;
        Ok(Self {
            manager,
            converted: HashMap::new(),
            loops: HashMap::new(),
            next_id: 1,
        })
    }

    fn sound_data(&mut self, pcm: &Arc<Pcm>) -> Result<StaticSoundData> {
        let key = Arc::as_ptr(pcm) as usize;
        if let Some(data) = self.converted.get(&key) {
            return Ok(data.clone());
        }
        let bytes = pcm_to_wav_bytes(pcm)?;
        let data = StaticSoundData::from_cursor(Cursor::new(bytes))
            .map_err(|e| anyhow!("Failed to create sound data: {e}"))?;
        self.converted.insert(key, data.clone());
        Ok(data)
    }
}

impl OutputGraph for KiraOutput {
    fn play_one_shot(&mut self, pcm: &Arc<Pcm>, volume: f32, balance: f32) {
        let data = match self.sound_data(pcm) {
            Ok(data) => data,
            Err(e) => {
                warn!("one-shot conversion failed: {e:#}");
                return;
            }
        };
        let data = data.volume(volume).panning(kira_pan(balance));
        if let Err(e) = self.manager.play(data) {
            warn!("failed to play one-shot: {e}");
        }
    }

    fn attach_loop(&mut self, pcm: &Arc<Pcm>, volume: f32, balance: f32) -> Option<LoopHandle> {
        let data = match self.sound_data(pcm) {
            Ok(data) => data,
            Err(e) => {
                warn!("loop conversion failed: {e:#}");
                return None;
            }
        };
        let data = data
            .volume(volume)
            .panning(kira_pan(balance))
            .loop_region(0.0..);
        match self.manager.play(data) {
            Ok(handle) => {
                let id = self.next_id;
                self.next_id += 1;
                self.loops.insert(id, handle);
                Some(LoopHandle(id))
            }
            Err(e) => {
                warn!("failed to attach loop: {e}");
                None
            }
        }
    }

    fn set_loop_volume(&mut self, handle: LoopHandle, volume: f32) {
        if let Some(h) = self.loops.get_mut(&handle.0) {
            h.set_volume(volume, Default::default());
        }
    }

    fn set_loop_balance(&mut self, handle: LoopHandle, balance: f32) {
        if let Some(h) = self.loops.get_mut(&handle.0) {
            h.set_panning(kira_pan(balance), Default::default());
        }
    }

    fn detach_loop(&mut self, handle: LoopHandle) {
        if let Some(mut h) = self.loops.remove(&handle.0) {
            h.stop(Default::default());
        }
    }

    fn stop_all(&mut self) {
        for (_, mut handle) in self.loops.drain() {
            handle.stop(Default::default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pan_mapping() {
        assert_eq!(kira_pan(-1.0), 0.0);
        assert_eq!(kira_pan(0.0), 0.5);
        assert_eq!(kira_pan(1.0), 1.0);
        assert_eq!(kira_pan(3.0), 1.0);
    }

    #[test]
    fn wav_bytes_round_trip() {
        let pcm = Pcm::new(vec![0.0, 0.25, -0.25, 0.5], 2, 44100);
        let bytes = pcm_to_wav_bytes(&pcm).unwrap();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        let samples: Vec<f32> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.0, 0.25, -0.25, 0.5]);
    }
}
