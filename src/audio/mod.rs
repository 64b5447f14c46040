//! Audio subsystem: decoding, caching, loop channels, and the kira-backed
//! output graph.

pub mod cache;
pub mod decode;
pub mod loop_channel;
pub mod output;
pub mod pcm;

pub use cache::SampleCache;
pub use decode::{FsDecoder, SampleDecoder};
pub use loop_channel::LoopChannelManager;
pub use output::{KiraOutput, LoopHandle, OutputGraph};
pub use pcm::{Pcm, TargetFormat};
