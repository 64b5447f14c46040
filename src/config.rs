use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::beatmap::compiler::{CompileOptions, SliderTailBehavior};
use crate::play::sequencer::SequencerOptions;

/// User settings for the hitsound player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSettings {
    /// Skip storyboard one-shot samples entirely.
    pub ignore_storyboard_samples: bool,
    /// Skip slider tick sounds.
    pub ignore_beatmap_slider_ticks: bool,
    /// What to do with a repeat-less slider's tail sound.
    pub slider_tail_behavior: SliderTailBehavior,
    /// Half-width of the interactive hit window, in milliseconds.
    pub key_hit_window_ms: u32,
    /// How far behind current time autoplay may fire before discarding.
    pub autoplay_latency_tolerance_ms: u32,
    /// Input-index → column mapping per column count.
    pub key_bindings: HashMap<u8, Vec<u8>>,
    /// Master volume applied on top of per-event volumes.
    pub master_volume: f32,
    /// User sample override folder (skin), probed first for variant events.
    pub override_samples_folder: Option<PathBuf>,
    /// Shipped default samples, the variant fallback.
    pub default_samples_folder: Option<PathBuf>,
    /// Requested device buffer size, passed through to the driver layer.
    pub force_buffer_size: Option<u32>,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            ignore_storyboard_samples: false,
            ignore_beatmap_slider_ticks: false,
            slider_tail_behavior: SliderTailBehavior::Normal,
            key_hit_window_ms: 150,
            autoplay_latency_tolerance_ms: 200,
            key_bindings: HashMap::new(),
            master_volume: 1.0,
            override_samples_folder: None,
            default_samples_folder: None,
            force_buffer_size: None,
        }
    }
}

impl PlayerSettings {
    /// Load settings from disk, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from_file().unwrap_or_default()
    }

    fn load_from_file() -> Result<Self> {
        let path = Self::settings_path()?;
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save settings to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn settings_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("com", "hitsync", "hitsync") {
            Ok(proj_dirs.config_dir().join("settings.json"))
        } else {
            Ok(PathBuf::from(".hitsync-settings.json"))
        }
    }

    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            ignore_storyboard_samples: self.ignore_storyboard_samples,
            ignore_slider_ticks: self.ignore_beatmap_slider_ticks,
            slider_tail_behavior: self.slider_tail_behavior,
        }
    }

    pub fn sequencer_options(&self, column_count: u8) -> SequencerOptions {
        SequencerOptions {
            hit_window_ms: self.key_hit_window_ms as f64,
            autoplay_tolerance_ms: self.autoplay_latency_tolerance_ms as f64,
            key_binding: self.key_bindings.get(&column_count).cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = PlayerSettings::default();
        assert_eq!(settings.key_hit_window_ms, 150);
        assert_eq!(settings.autoplay_latency_tolerance_ms, 200);
        assert_eq!(settings.slider_tail_behavior, SliderTailBehavior::Normal);
        assert!((settings.master_volume - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn json_round_trip() {
        let mut settings = PlayerSettings::default();
        settings.key_bindings.insert(4, vec![0, 1, 2, 3]);
        settings.force_buffer_size = Some(128);

        let json = serde_json::to_string(&settings).unwrap();
        let back: PlayerSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.key_bindings.get(&4), Some(&vec![0, 1, 2, 3]));
        assert_eq!(back.force_buffer_size, Some(128));
    }

    #[test]
    fn sequencer_options_pick_the_binding_for_the_column_count() {
        let mut settings = PlayerSettings::default();
        settings.key_bindings.insert(4, vec![3, 2, 1, 0]);

        assert_eq!(
            settings.sequencer_options(4).key_binding,
            Some(vec![3, 2, 1, 0])
        );
        assert_eq!(settings.sequencer_options(7).key_binding, None);
    }
}
