use uuid::Uuid;

/// Playback priority of a compiled hitsound event.
///
/// `Primary` events are the ones players interact with; everything else is
/// played automatically by the tick loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Key-press matched events (circle hits, slider heads, mania notes).
    Primary,
    /// Later slider edges played back automatically.
    Secondary,
    /// Slider ticks and other ambient effects.
    Effects,
    /// Storyboard one-shot samples.
    Sampling,
}

/// A playable one-shot sample at a beatmap-relative offset.
#[derive(Debug, Clone)]
pub struct SampleEvent {
    /// Offset in milliseconds, relative to the beatmap timeline.
    pub offset_ms: i32,
    /// Chord-group identity: events sharing a guid are judged together.
    pub guid: Uuid,
    pub priority: Priority,
    /// Sample filename without folder (e.g. `soft-hitclap2.wav`).
    pub filename: String,
    /// Resolve from the override source before the beatmap folder.
    pub use_variant_source: bool,
    /// Volume in 0.0..=1.0.
    pub volume: f32,
    /// Stereo position in -1.0 (left) ..= 1.0 (right).
    pub balance: f32,
    /// Column index for per-column modes; 0 elsewhere.
    pub column: u8,
}

impl SampleEvent {
    pub fn new(offset_ms: i32, priority: Priority, filename: impl Into<String>) -> Self {
        Self {
            offset_ms,
            guid: Uuid::new_v4(),
            priority,
            filename: filename.into(),
            use_variant_source: false,
            volume: 1.0,
            balance: 0.0,
            column: 0,
        }
    }
}

/// Loop channel identifier.
///
/// The set of concurrently looping sounds is closed: a slider drives at most
/// one slide loop and one whistle loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopChannel {
    Slide,
    Whistle,
}

impl LoopChannel {
    pub const ALL: [LoopChannel; 2] = [LoopChannel::Slide, LoopChannel::Whistle];
}

/// Payload of a loop control event.
#[derive(Debug, Clone)]
pub enum ControlKind {
    StartLoop {
        filename: String,
        use_variant_source: bool,
        volume: f32,
        balance: f32,
    },
    StopLoop,
    ChangeLoopVolume(f32),
    ChangeLoopBalance(f32),
}

/// A loop lifecycle event emitted by the compiler and consumed by the
/// loop channel manager.
#[derive(Debug, Clone)]
pub struct ControlEvent {
    pub offset_ms: i32,
    pub channel: LoopChannel,
    pub kind: ControlKind,
}

/// A compiled playback event: either a one-shot sample or a loop control.
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    Sample(SampleEvent),
    Control(ControlEvent),
}

impl PlaybackEvent {
    pub fn offset_ms(&self) -> i32 {
        match self {
            PlaybackEvent::Sample(s) => s.offset_ms,
            PlaybackEvent::Control(c) => c.offset_ms,
        }
    }
}

/// Compiler output: the interactive key list and the auto-only playback list.
///
/// Both lists are sorted by offset at construction and never re-sorted.
#[derive(Debug, Clone, Default)]
pub struct HitsoundList {
    /// Primary events the player interacts with.
    pub key_events: Vec<SampleEvent>,
    /// Secondary/effects/sampling events and loop controls, auto-only.
    pub playback_events: Vec<PlaybackEvent>,
}

impl HitsoundList {
    /// Sort both lists by offset. Stable, so chord ordering is preserved.
    pub fn sort(&mut self) {
        self.key_events.sort_by_key(|e| e.offset_ms);
        self.playback_events.sort_by_key(|e| e.offset_ms());
    }
}
