pub mod compiler;
pub mod raw;

pub use compiler::{CompileOptions, HitsoundCompiler, SliderTailBehavior};
pub use raw::{BeatmapError, BeatmapParser, GameMode, RawBeatmap};
