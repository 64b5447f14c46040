use std::path::{Path, PathBuf};

use bitflags::bitflags;
use thiserror::Error;

/// Game mode the beatmap targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Standard,
    Taiko,
    Catch,
    Mania,
}

impl GameMode {
    /// Per-column modes queue interactive events per lane.
    pub fn is_column_mode(self) -> bool {
        matches!(self, GameMode::Mania)
    }

    /// Taiko and mania play everything center-panned.
    pub fn ignores_balance(self) -> bool {
        matches!(self, GameMode::Taiko | GameMode::Mania)
    }
}

/// Sample bank a hitsound is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleBank {
    Normal,
    Soft,
    Drum,
}

impl SampleBank {
    pub fn prefix(self) -> &'static str {
        match self {
            SampleBank::Normal => "normal",
            SampleBank::Soft => "soft",
            SampleBank::Drum => "drum",
        }
    }
}

bitflags! {
    /// Addition bits on a hit object. The hit-normal always sounds and has
    /// no bit of its own here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Additions: u8 {
        const WHISTLE = 1 << 1;
        const FINISH  = 1 << 2;
        const CLAP    = 1 << 3;
    }
}

impl Additions {
    /// Suffix used in sample filenames for each addition bit.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        [
            (Additions::WHISTLE, "hitwhistle"),
            (Additions::FINISH, "hitfinish"),
            (Additions::CLAP, "hitclap"),
        ]
        .into_iter()
        .filter(move |(bit, _)| self.contains(*bit))
        .map(|(_, name)| name)
    }
}

/// Per-object sample overrides, parsed from the object's extras.
#[derive(Debug, Clone, Default)]
pub struct RawSampleInfo {
    /// Bank override for the hit-normal.
    pub normal_bank: Option<SampleBank>,
    /// Bank override for additions.
    pub addition_bank: Option<SampleBank>,
    /// Custom sample index override; 0 means "use the variant source".
    pub index: Option<u32>,
    /// Per-object volume override in 0.0..=1.0.
    pub volume: Option<f32>,
    /// Literal sample file overriding bank resolution entirely.
    pub filename: Option<String>,
}

/// Per-edge sound of a slider.
#[derive(Debug, Clone, Default)]
pub struct RawEdgeSound {
    pub additions: Additions,
    pub normal_bank: Option<SampleBank>,
    pub addition_bank: Option<SampleBank>,
}

/// Object-specific shape data.
#[derive(Debug, Clone)]
pub enum RawObjectKind {
    Circle,
    Slider {
        /// Repeats beyond the first traversal (0 = head-to-tail once).
        repeats: u32,
        /// Duration of one traversal in milliseconds.
        span_ms: f64,
        /// Tick spacing from the controlling timing point, in milliseconds.
        tick_interval_ms: f64,
        /// Sound override per edge; missing entries fall back to the
        /// object-level sound.
        edge_sounds: Vec<RawEdgeSound>,
    },
    Spinner {
        end_ms: i32,
    },
    Hold {
        end_ms: i32,
    },
}

/// One raw hit object as yielded by the external beatmap parser.
#[derive(Debug, Clone)]
pub struct RawHitObject {
    /// Horizontal position in 0..=512.
    pub x: f32,
    pub start_ms: i32,
    pub additions: Additions,
    pub sample: RawSampleInfo,
    pub kind: RawObjectKind,
}

impl RawHitObject {
    pub fn circle(x: f32, start_ms: i32) -> Self {
        Self {
            x,
            start_ms,
            additions: Additions::empty(),
            sample: RawSampleInfo::default(),
            kind: RawObjectKind::Circle,
        }
    }
}

/// One raw timing point: the sample defaults in effect from its offset on.
#[derive(Debug, Clone)]
pub struct RawTimingPoint {
    pub offset_ms: f64,
    pub bank: SampleBank,
    pub sample_index: u32,
    /// Volume in 0.0..=1.0.
    pub volume: f32,
}

/// A storyboard one-shot sample.
#[derive(Debug, Clone)]
pub struct RawStoryboardSample {
    pub offset_ms: i32,
    pub filename: String,
    pub volume: f32,
}

/// A parsed difficulty, ready for hitsound compilation.
#[derive(Debug, Clone)]
pub struct RawBeatmap {
    pub mode: GameMode,
    /// Lane count for per-column modes; ignored elsewhere.
    pub column_count: u8,
    /// Hit objects ordered by start time.
    pub hit_objects: Vec<RawHitObject>,
    /// Timing points ordered by offset.
    pub timing_points: Vec<RawTimingPoint>,
    pub storyboard_samples: Vec<RawStoryboardSample>,
}

/// Beatmap loading failures that abort a session start.
#[derive(Debug, Error)]
pub enum BeatmapError {
    #[error("no beatmap selected")]
    NothingSelected,

    #[error("beatmap folder not found: {path}")]
    FolderNotFound { path: PathBuf },

    #[error("no parseable difficulty {file} in {folder}")]
    NoDifficulty { folder: PathBuf, file: String },

    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },
}

/// External beatmap parser collaborator.
///
/// Returns the ordered raw records for a named difficulty file; the core
/// treats the result as read-only input.
pub trait BeatmapParser: Send {
    fn parse(&self, folder: &Path, difficulty_file: &str) -> Result<RawBeatmap, BeatmapError>;
}
