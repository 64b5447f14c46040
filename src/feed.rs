use std::path::PathBuf;

use crate::timing::Mods;

/// Screen the external game is currently showing.
///
/// Raw status values come out of process memory and are versioned by the
/// game; anything unrecognized maps to `SongSelect` so the player degrades
/// to browsing behavior instead of wedging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenStatus {
    NotRunning,
    MainMenu,
    SongSelect,
    Playing,
    ResultScreen,
}

impl ScreenStatus {
    /// Map a raw memory-read status value.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            -1 => ScreenStatus::NotRunning,
            0 => ScreenStatus::MainMenu,
            2 => ScreenStatus::Playing,
            5 | 4 | 11 | 12 => ScreenStatus::SongSelect,
            7 => ScreenStatus::ResultScreen,
            _ => ScreenStatus::SongSelect,
        }
    }
}

/// Identity of the beatmap the game currently has loaded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BeatmapIdentity {
    /// Folder containing the beatmap and its samples.
    pub folder: PathBuf,
    /// Difficulty file name within the folder.
    pub difficulty_file: String,
}

/// One push sample from the process-memory reader.
///
/// Delivered whenever any value changes; interval and jitter are
/// unspecified and must be tolerated downstream.
#[derive(Debug, Clone)]
pub struct ReaderSample {
    /// Playback position in milliseconds, if the game exposes one right now.
    pub position_ms: Option<f64>,
    /// Raw screen status value.
    pub status_raw: i32,
    /// Active gameplay modifiers.
    pub mods: Mods,
    /// Current combo counter.
    pub combo: i32,
    /// Currently selected beatmap, if any.
    pub beatmap: Option<BeatmapIdentity>,
}
