use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::audio::cache::{self, PRECACHE_STEP_MS, PRECACHE_WINDOW_MS, SampleCache};
use crate::audio::decode::{FsDecoder, SampleDecoder};
use crate::audio::loop_channel::LoopChannelManager;
use crate::audio::output::OutputGraph;
use crate::audio::pcm::TargetFormat;
use crate::beatmap::compiler::HitsoundCompiler;
use crate::beatmap::raw::{BeatmapError, BeatmapParser};
use crate::config::PlayerSettings;
use crate::event::PlaybackEvent;
use crate::feed::{BeatmapIdentity, ReaderSample, ScreenStatus};
use crate::game::machine::{GameScreen, StateMachine};
use crate::play::sequencer::HitsoundSequencer;
use crate::timing::{Mods, SyncContext};

/// Combos at or above this length trigger the break cue when they drop.
const COMBO_BREAK_MIN: i32 = 20;

/// One play session: compiled hitsounds plus rolling-prefetch bookkeeping.
struct Session {
    sequencer: HitsoundSequencer,
    /// All compiled events, kept for precache window scheduling.
    precache_events: Vec<PlaybackEvent>,
    next_precache_boundary: f64,
    beatmap: BeatmapIdentity,
}

/// Orchestrates every subsystem behind three entry points:
/// `on_reader_sample` (push feed), `tick` (≈500 Hz sequencing thread) and
/// `on_key` (input callback).
///
/// There are no ambient singletons: the player owns the sync context, cache,
/// sequencer, loop manager, and the output/parser collaborators outright.
pub struct HitsoundPlayer {
    settings: PlayerSettings,
    sync: SyncContext,
    cache: SampleCache,
    loops: LoopChannelManager,
    machine: StateMachine,
    output: Box<dyn OutputGraph>,
    parser: Box<dyn BeatmapParser>,
    session: Option<Session>,
    /// Latest beatmap identity seen on the feed.
    pending_beatmap: Option<BeatmapIdentity>,
    last_session_error: Option<BeatmapError>,
    mods: Mods,
    prev_combo: i32,
}

impl HitsoundPlayer {
    pub fn new(
        settings: PlayerSettings,
        parser: Box<dyn BeatmapParser>,
        output: Box<dyn OutputGraph>,
    ) -> Self {
        Self::with_decoder(settings, parser, output, Arc::new(FsDecoder), None)
    }

    /// Construct with an explicit decode collaborator and target format.
    pub fn with_decoder(
        settings: PlayerSettings,
        parser: Box<dyn BeatmapParser>,
        output: Box<dyn OutputGraph>,
        decoder: Arc<dyn SampleDecoder>,
        target: Option<TargetFormat>,
    ) -> Self {
        let cache = SampleCache::new(decoder, target);
        if let Some(folder) = &settings.default_samples_folder {
            cache.set_default_folder(folder);
        }
        Self {
            settings,
            sync: SyncContext::new(),
            cache,
            loops: LoopChannelManager::new(),
            machine: StateMachine::new(),
            output,
            parser,
            session: None,
            pending_beatmap: None,
            last_session_error: None,
            mods: Mods::empty(),
            prev_combo: 0,
        }
    }

    pub fn current_screen(&self) -> GameScreen {
        self.machine.current()
    }

    pub fn session_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn last_session_error(&self) -> Option<&BeatmapError> {
        self.last_session_error.as_ref()
    }

    pub fn cache(&self) -> &SampleCache {
        &self.cache
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    /// Current reconciled playback time, for display and diagnostics.
    pub fn current_time(&mut self) -> f64 {
        self.sync.current_time()
    }

    pub fn on_reader_sample(&mut self, sample: &ReaderSample) {
        self.on_reader_sample_at(sample, Instant::now());
    }

    /// Handle one push sample from the process-memory reader.
    pub fn on_reader_sample_at(&mut self, sample: &ReaderSample, now: Instant) {
        self.sync.set_mods_at(sample.mods, now);
        self.mods = sample.mods;

        if sample.beatmap.is_some() {
            self.pending_beatmap = sample.beatmap.clone();
        }
        if let Some(position) = sample.position_ms {
            self.sync.set_raw_position_at(position, now);
        }

        let status = ScreenStatus::from_raw(sample.status_raw);
        if status != self.sync.status() {
            self.sync.set_status_at(status, now);
            if let Some(transition) = self.machine.apply_status(status) {
                self.exit_screen(transition.from);
                self.enter_screen(transition.to, now);
            }
        }

        self.update_combo(sample.combo);
    }

    fn exit_screen(&mut self, from: GameScreen) {
        if from == GameScreen::Playing {
            self.stop_session();
        }
    }

    fn enter_screen(&mut self, to: GameScreen, now: Instant) {
        match to {
            GameScreen::Playing => {
                if let Err(e) = self.start_session(now) {
                    warn!("session start aborted: {e}");
                    self.session = None;
                    self.last_session_error = Some(e);
                }
            }
            GameScreen::NotRunning => {
                // The game went away; free everything.
                self.cache.clear();
            }
            GameScreen::Browsing | GameScreen::Results => {}
        }
    }

    fn start_session(&mut self, now: Instant) -> Result<(), BeatmapError> {
        let beatmap = self
            .pending_beatmap
            .clone()
            .ok_or(BeatmapError::NothingSelected)?;
        if !beatmap.folder.exists() {
            return Err(BeatmapError::FolderNotFound {
                path: beatmap.folder,
            });
        }

        let raw = self.parser.parse(&beatmap.folder, &beatmap.difficulty_file)?;
        let list = HitsoundCompiler::compile(&raw, &self.settings.compile_options());
        let precache_events: Vec<PlaybackEvent> = list
            .key_events
            .iter()
            .cloned()
            .map(PlaybackEvent::Sample)
            .chain(list.playback_events.iter().cloned())
            .collect();

        if self.cache.base_folder() != beatmap.folder {
            self.cache.clear();
        }
        self.cache.set_context(
            &beatmap.folder,
            self.settings.override_samples_folder.clone(),
        );
        self.cache.precache_ambient();

        let current = self.sync.current_time_at(now);
        let mut sequencer = HitsoundSequencer::new(
            raw.mode,
            raw.column_count,
            list,
            self.settings.sequencer_options(raw.column_count),
        );
        sequencer.reset_to(current);
        self.cache
            .precache_range(current, current + PRECACHE_WINDOW_MS, &precache_events);

        info!(
            folder = %beatmap.folder.display(),
            difficulty = %beatmap.difficulty_file,
            start_ms = current,
            "session started"
        );
        self.session = Some(Session {
            sequencer,
            precache_events,
            next_precache_boundary: current + PRECACHE_STEP_MS,
            beatmap,
        });
        self.last_session_error = None;
        Ok(())
    }

    fn stop_session(&mut self) {
        self.loops.stop_all(self.output.as_mut());
        self.cache.cancel_prefetch();
        if let Some(session) = self.session.take() {
            info!(folder = %session.beatmap.folder.display(), "session stopped");
        }
        self.prev_combo = 0;
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// One fixed-rate sequencing step: advance autoplay, feed loop controls,
    /// and roll the prefetch window.
    pub fn tick_at(&mut self, now: Instant) {
        if self.machine.current() != GameScreen::Playing {
            return;
        }
        let Some(session) = &mut self.session else {
            return;
        };

        let now_ms = self.sync.current_time_at(now);
        let autoplay = self.mods.contains(Mods::AUTOPLAY);

        let mut sounds = Vec::new();
        let mut controls = Vec::new();
        session
            .sequencer
            .process_auto_play(now_ms, autoplay, &self.cache, &mut sounds, &mut controls);

        for control in &controls {
            self.loops.apply(control, &self.cache, self.output.as_mut());
        }
        let master = self.settings.master_volume;
        for sound in &sounds {
            self.output
                .play_one_shot(&sound.pcm, sound.volume * master, sound.balance);
        }

        if now_ms >= session.next_precache_boundary {
            self.cache.precache_range(
                session.next_precache_boundary,
                session.next_precache_boundary + PRECACHE_WINDOW_MS,
                &session.precache_events,
            );
            session.next_precache_boundary += PRECACHE_STEP_MS;
        }
    }

    pub fn on_key(&mut self, input_index: usize, input_total: usize) {
        self.on_key_at(input_index, input_total, Instant::now());
    }

    /// Input-callback entry: match the press against the interactive queue.
    ///
    /// Consults cached buffers only; a miss skips the sound and schedules
    /// its decode in the background.
    pub fn on_key_at(&mut self, input_index: usize, input_total: usize, now: Instant) {
        if self.machine.current() != GameScreen::Playing || self.mods.contains(Mods::AUTOPLAY) {
            return;
        }
        let Some(session) = &mut self.session else {
            return;
        };

        let now_ms = self.sync.current_time_at(now);
        let mut sounds = Vec::new();
        session.sequencer.process_interaction(
            now_ms,
            input_index,
            input_total,
            &self.cache,
            &mut sounds,
        );

        let master = self.settings.master_volume;
        for sound in &sounds {
            self.output
                .play_one_shot(&sound.pcm, sound.volume * master, sound.balance);
        }
    }

    /// Play the combo-break cue when a long combo collapses.
    fn update_combo(&mut self, combo: i32) {
        if self.machine.current() == GameScreen::Playing
            && self.prev_combo >= COMBO_BREAK_MIN
            && combo < self.prev_combo
        {
            match self.cache.try_get_ambient(cache::combo_break_cue()) {
                Some(pcm) => {
                    let master = self.settings.master_volume;
                    self.output.play_one_shot(&pcm, master, 0.0);
                }
                None => warn!("combo break cue not cached"),
            }
        }
        self.prev_combo = combo;
    }
}
