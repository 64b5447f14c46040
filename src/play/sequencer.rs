use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::audio::cache::SampleCache;
use crate::audio::pcm::Pcm;
use crate::beatmap::raw::GameMode;
use crate::event::{ControlEvent, HitsoundList, PlaybackEvent, SampleEvent};
use crate::play::queue::HitQueue;

/// A resolved sound ready to hand to the output graph.
#[derive(Debug, Clone)]
pub struct PlaybackSound {
    pub pcm: Arc<Pcm>,
    pub volume: f32,
    pub balance: f32,
}

/// Sequencer knobs taken from the player settings.
#[derive(Debug, Clone)]
pub struct SequencerOptions {
    /// Half-width of the interactive hit window, in milliseconds.
    pub hit_window_ms: f64,
    /// How far behind current time an autoplay event may fire before it is
    /// discarded instead.
    pub autoplay_tolerance_ms: f64,
    /// Input-index → column mapping for per-column modes; identity when
    /// absent.
    pub key_binding: Option<Vec<u8>>,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            hit_window_ms: 150.0,
            autoplay_tolerance_ms: 200.0,
            key_binding: None,
        }
    }
}

/// Interactive queue storage, per game mode.
enum KeyQueues {
    /// One queue for the whole playfield.
    Single(HitQueue),
    /// One queue per column, with the use-first-or-cached replay node.
    Columns {
        queues: Vec<HitQueue>,
        cached: Vec<Option<SampleEvent>>,
        binding: Vec<u8>,
    },
}

/// Matches compiled hitsound events against the reconciled current time.
///
/// Two entry points: `process_auto_play` from the tick thread and
/// `process_interaction` from the input callback. Neither blocks on I/O;
/// cache misses degrade to a skipped sound plus an async decode request.
pub struct HitsoundSequencer {
    auto: VecDeque<PlaybackEvent>,
    keys: KeyQueues,
    options: SequencerOptions,
}

impl HitsoundSequencer {
    pub fn new(
        mode: GameMode,
        column_count: u8,
        list: HitsoundList,
        options: SequencerOptions,
    ) -> Self {
        let keys = if mode.is_column_mode() {
            let count = column_count.max(1) as usize;
            let mut per_column: Vec<Vec<SampleEvent>> = vec![Vec::new(); count];
            for ev in list.key_events {
                let col = (ev.column as usize).min(count - 1);
                per_column[col].push(ev);
            }
            let binding = match &options.key_binding {
                Some(b) if b.len() == count => b.clone(),
                _ => (0..count as u8).collect(),
            };
            KeyQueues::Columns {
                queues: per_column.into_iter().map(HitQueue::new).collect(),
                cached: vec![None; count],
                binding,
            }
        } else {
            KeyQueues::Single(HitQueue::new(list.key_events))
        };

        Self {
            auto: list.playback_events.into(),
            keys,
            options,
        }
    }

    /// Remaining interactive events across all queues.
    pub fn key_events_remaining(&self) -> usize {
        match &self.keys {
            KeyQueues::Single(q) => q.len(),
            KeyQueues::Columns { queues, .. } => queues.iter().map(HitQueue::len).sum(),
        }
    }

    pub fn auto_events_remaining(&self) -> usize {
        self.auto.len()
    }

    /// Drop every sample scheduled before `now` and clear cached nodes.
    ///
    /// Used when a session (re)starts mid-timeline. Elapsed loop controls
    /// are kept: replaying them in order on the first tick reconstructs the
    /// correct loop state (a slider already in progress starts sliding).
    pub fn reset_to(&mut self, now: f64) {
        self.auto.retain(|ev| match ev {
            PlaybackEvent::Sample(s) => s.offset_ms as f64 >= now,
            PlaybackEvent::Control(_) => true,
        });
        match &mut self.keys {
            KeyQueues::Single(q) => {
                q.drop_before(now);
            }
            KeyQueues::Columns { queues, cached, .. } => {
                for q in queues.iter_mut() {
                    q.drop_before(now);
                }
                cached.fill(None);
            }
        }
    }

    fn emit(
        event: &SampleEvent,
        cache: &SampleCache,
        sounds: &mut Vec<PlaybackSound>,
    ) {
        match cache.try_get_cached(event) {
            Some(pcm) => sounds.push(PlaybackSound {
                pcm,
                volume: event.volume,
                balance: event.balance,
            }),
            None => {
                // Resource absence is not fatal: skip this one and let the
                // decode land for the next occurrence.
                warn!(filename = %event.filename, offset = event.offset_ms, "sample not cached, skipping");
                cache.request_async(event);
            }
        }
    }

    /// Advance autoplay up to `now`.
    ///
    /// Due sample events within the latency tolerance are emitted; staler
    /// ones are discarded rather than played late. Loop controls are always
    /// forwarded in order: skipping a stale StopLoop would leak a loop.
    pub fn process_auto_play(
        &mut self,
        now: f64,
        use_key_queue_as_auto: bool,
        cache: &SampleCache,
        sounds: &mut Vec<PlaybackSound>,
        controls: &mut Vec<ControlEvent>,
    ) {
        let tolerance = self.options.autoplay_tolerance_ms;
        while let Some(head) = self.auto.front() {
            if head.offset_ms() as f64 > now {
                break;
            }
            match self.auto.pop_front().unwrap() {
                PlaybackEvent::Control(c) => controls.push(c),
                PlaybackEvent::Sample(s) => {
                    if now - s.offset_ms as f64 <= tolerance {
                        Self::emit(&s, cache, sounds);
                    } else {
                        debug!(offset = s.offset_ms, "discarding stale autoplay event");
                    }
                }
            }
        }

        if use_key_queue_as_auto {
            let drain = |q: &mut HitQueue, sounds: &mut Vec<PlaybackSound>| {
                while let Some(head) = q.peek() {
                    if head.offset_ms as f64 > now {
                        break;
                    }
                    let ev = q.pop().unwrap();
                    if now - ev.offset_ms as f64 <= tolerance {
                        Self::emit(&ev, cache, sounds);
                    }
                }
            };
            match &mut self.keys {
                KeyQueues::Single(q) => drain(q, sounds),
                KeyQueues::Columns { queues, .. } => {
                    for q in queues.iter_mut() {
                        drain(q, sounds);
                    }
                }
            }
        }
    }

    /// React to one key press.
    ///
    /// Missed heads are discarded while the same press keeps evaluating the
    /// next head; a too-early head holds the queue; an in-window head drains
    /// its whole chord group.
    pub fn process_interaction(
        &mut self,
        now: f64,
        input_index: usize,
        _input_total: usize,
        cache: &SampleCache,
        sounds: &mut Vec<PlaybackSound>,
    ) {
        let window = self.options.hit_window_ms;
        match &mut self.keys {
            KeyQueues::Single(q) => {
                Self::interact(q, None, now, window, cache, sounds);
            }
            KeyQueues::Columns {
                queues,
                cached,
                binding,
            } => {
                let Some(&col) = binding.get(input_index) else {
                    return;
                };
                let col = col as usize;
                if col >= queues.len() {
                    return;
                }
                Self::interact(
                    &mut queues[col],
                    Some(&mut cached[col]),
                    now,
                    window,
                    cache,
                    sounds,
                );
            }
        }
    }

    fn interact(
        queue: &mut HitQueue,
        mut cached: Option<&mut Option<SampleEvent>>,
        now: f64,
        window: f64,
        cache: &SampleCache,
        sounds: &mut Vec<PlaybackSound>,
    ) {
        loop {
            let Some(head) = queue.peek() else {
                // Column modes replay the already-consumed node so an
                // empty queue still gives key feedback.
                if let Some(slot) = cached {
                    if let Some(ev) = slot.as_ref() {
                        Self::emit(ev, cache, sounds);
                    }
                }
                return;
            };
            let offset = head.offset_ms as f64;

            if now > offset + window {
                // Missed: discard, then evaluate the next head against the
                // same press.
                let dropped = queue.pop();
                if let Some(slot) = cached.as_deref_mut() {
                    *slot = dropped;
                }
                continue;
            }

            if now < offset - window {
                // Too early: hold position. Column modes reuse the cached
                // node instead of consuming a future note.
                if let Some(slot) = cached {
                    if let Some(ev) = slot.as_ref() {
                        Self::emit(ev, cache, sounds);
                    }
                }
                return;
            }

            // In window: the whole chord group fires from one press.
            let guid = head.guid;
            while queue.peek().is_some_and(|e| e.guid == guid) {
                let ev = queue.pop().unwrap();
                Self::emit(&ev, cache, sounds);
                if let Some(slot) = cached.as_deref_mut() {
                    *slot = Some(ev);
                }
            }
            return;
        }
    }
}
