pub mod queue;
pub mod sequencer;

pub use queue::HitQueue;
pub use sequencer::{HitsoundSequencer, PlaybackSound, SequencerOptions};
