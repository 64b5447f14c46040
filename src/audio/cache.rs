use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::audio::decode::{SampleDecoder, resolve_sample_path};
use crate::audio::pcm::{Pcm, TargetFormat};
use crate::event::{ControlKind, PlaybackEvent, SampleEvent};

/// Rolling prefetch: a new batch is scheduled every time playback crosses
/// this boundary...
pub const PRECACHE_STEP_MS: f64 = 10_000.0;
/// ...covering this much of the timeline ahead.
pub const PRECACHE_WINDOW_MS: f64 = 13_000.0;

/// Always-needed cues resolved from the variant source.
const AMBIENT_ASSETS: &[&str] = &["combobreak.wav"];

/// Cache key: the primary probe path plus the variant flag.
///
/// Derived without touching the filesystem so the hot read path stays free
/// of I/O; actual extension probing happens on the decode worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleKey {
    path: PathBuf,
    variant: bool,
}

#[derive(Debug, Clone)]
enum CacheSlot {
    /// A worker owns the decode for this key.
    Pending,
    Ready(Arc<Pcm>),
    /// Negative cache: resolution or decoding failed once, don't retry.
    Missing,
}

/// Folders a sample name resolves against.
#[derive(Debug, Clone, Default)]
struct CacheContext {
    /// Beatmap folder.
    base_folder: PathBuf,
    /// User override source probed first for variant events.
    override_folder: Option<PathBuf>,
    /// Shipped default samples, the variant fallback.
    default_folder: Option<PathBuf>,
}

struct CacheShared {
    slots: RwLock<HashMap<SampleKey, CacheSlot>>,
    decoder: Arc<dyn SampleDecoder>,
    target: Option<TargetFormat>,
}

impl CacheShared {
    fn key_for(&self, ctx: &CacheContext, filename: &str, variant: bool) -> SampleKey {
        let folder: &Path = if variant {
            ctx.override_folder
                .as_deref()
                .or(ctx.default_folder.as_deref())
                .unwrap_or(&ctx.base_folder)
        } else {
            &ctx.base_folder
        };
        SampleKey {
            path: folder.join(filename),
            variant,
        }
    }

    fn resolve(&self, ctx: &CacheContext, filename: &str, variant: bool) -> Option<PathBuf> {
        if variant {
            if let Some(folder) = &ctx.override_folder {
                if let Some(path) = resolve_sample_path(folder, filename) {
                    return Some(path);
                }
            }
            if let Some(folder) = &ctx.default_folder {
                if let Some(path) = resolve_sample_path(folder, filename) {
                    return Some(path);
                }
            }
            None
        } else {
            resolve_sample_path(&ctx.base_folder, filename)
        }
    }

    /// Decode a key at most once, whatever thread gets here first.
    fn ensure_decoded(&self, ctx: &CacheContext, filename: &str, variant: bool) {
        let key = self.key_for(ctx, filename, variant);
        {
            let mut slots = self.slots.write().unwrap();
            if slots.contains_key(&key) {
                return;
            }
            slots.insert(key.clone(), CacheSlot::Pending);
        }

        let slot = match self.resolve(ctx, filename, variant) {
            None => {
                debug!(filename, variant, "sample not found, caching as missing");
                CacheSlot::Missing
            }
            Some(path) => match self.decoder.decode(&path) {
                Ok(pcm) => {
                    let pcm = match self.target {
                        Some(target) => pcm.into_format(target),
                        None => pcm,
                    };
                    CacheSlot::Ready(Arc::new(pcm))
                }
                Err(e) => {
                    warn!(path = %path.display(), "failed to decode sample: {e:#}");
                    CacheSlot::Missing
                }
            },
        };

        self.slots.write().unwrap().insert(key, slot);
    }
}

/// Maps sample names to decoded buffers, with background rolling prefetch.
///
/// Reads are lock-cheap and never perform I/O; decoding happens on worker
/// threads with at-most-once semantics per key.
pub struct SampleCache {
    shared: Arc<CacheShared>,
    context: RwLock<CacheContext>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    cancel: Mutex<Arc<AtomicBool>>,
}

impl SampleCache {
    pub fn new(decoder: Arc<dyn SampleDecoder>, target: Option<TargetFormat>) -> Self {
        Self {
            shared: Arc::new(CacheShared {
                slots: RwLock::new(HashMap::new()),
                decoder,
                target,
            }),
            context: RwLock::new(CacheContext::default()),
            workers: Mutex::new(Vec::new()),
            cancel: Mutex::new(Arc::new(AtomicBool::new(false))),
        }
    }

    /// Point variant-source fallback at the shipped default samples.
    pub fn set_default_folder(&self, folder: impl Into<PathBuf>) {
        self.context.write().unwrap().default_folder = Some(folder.into());
    }

    /// Swap the beatmap and override folders the cache resolves against.
    pub fn set_context(&self, base_folder: impl Into<PathBuf>, override_folder: Option<PathBuf>) {
        let mut ctx = self.context.write().unwrap();
        ctx.base_folder = base_folder.into();
        ctx.override_folder = override_folder;
    }

    /// Cached buffer for an event, if a decode already completed.
    ///
    /// Never blocks on I/O: pending, missing, and never-requested keys all
    /// come back `None`.
    pub fn try_get_cached(&self, event: &SampleEvent) -> Option<Arc<Pcm>> {
        let ctx = self.context.read().unwrap();
        let key = self
            .shared
            .key_for(&ctx, &event.filename, event.use_variant_source);
        drop(ctx);
        match self.shared.slots.read().unwrap().get(&key) {
            Some(CacheSlot::Ready(pcm)) => Some(pcm.clone()),
            _ => None,
        }
    }

    /// Cached buffer for a bare name resolved from the variant source.
    pub fn try_get_ambient(&self, filename: &str) -> Option<Arc<Pcm>> {
        let ctx = self.context.read().unwrap();
        let key = self.shared.key_for(&ctx, filename, true);
        drop(ctx);
        match self.shared.slots.read().unwrap().get(&key) {
            Some(CacheSlot::Ready(pcm)) => Some(pcm.clone()),
            _ => None,
        }
    }

    /// Kick off a background decode for a single event.
    ///
    /// Used by the input path on a cache miss: the press itself stays
    /// silent, but a repeat of the same sample soon after will hit.
    pub fn request_async(&self, event: &SampleEvent) {
        self.spawn_batch(vec![(event.filename.clone(), event.use_variant_source)]);
    }

    /// Fire-and-forget decode of every event in `[start_ms, end_ms)`.
    ///
    /// One worker per call; decoding within the batch is serialized so a
    /// large window cannot starve the machine.
    pub fn precache_range(&self, start_ms: f64, end_ms: f64, events: &[PlaybackEvent]) {
        let mut requests: Vec<(String, bool)> = Vec::new();
        let mut push = |filename: &str, variant: bool| {
            let entry = (filename.to_string(), variant);
            if !requests.contains(&entry) {
                requests.push(entry);
            }
        };

        for event in events {
            let offset = event.offset_ms() as f64;
            if offset >= end_ms {
                continue;
            }
            match event {
                PlaybackEvent::Sample(s) => {
                    if offset >= start_ms {
                        push(&s.filename, s.use_variant_source);
                    }
                }
                // Loop starts are kept without a lower bound: a loop that
                // began before the window can still be running inside it.
                PlaybackEvent::Control(c) => {
                    if let ControlKind::StartLoop {
                        filename,
                        use_variant_source,
                        ..
                    } = &c.kind
                    {
                        push(filename, *use_variant_source);
                    }
                }
            }
        }

        debug!(
            start_ms,
            end_ms,
            count = requests.len(),
            "scheduling precache batch"
        );
        self.spawn_batch(requests);
    }

    /// Decode the fixed set of always-needed cues.
    pub fn precache_ambient(&self) {
        self.spawn_batch(
            AMBIENT_ASSETS
                .iter()
                .map(|name| (name.to_string(), true))
                .collect(),
        );
    }

    fn spawn_batch(&self, requests: Vec<(String, bool)>) {
        if requests.is_empty() {
            return;
        }
        let shared = self.shared.clone();
        let ctx = self.context.read().unwrap().clone();
        let cancel = self.cancel.lock().unwrap().clone();

        let handle = std::thread::spawn(move || {
            for (filename, variant) in requests {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                shared.ensure_decoded(&ctx, &filename, variant);
            }
        });
        self.workers.lock().unwrap().push(handle);
    }

    /// Join all outstanding decode workers.
    pub fn wait_idle(&self) {
        let handles: Vec<_> = self.workers.lock().unwrap().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Cancel in-flight batches (best-effort, completed decodes are kept)
    /// without dropping any cached buffers.
    pub fn cancel_prefetch(&self) {
        let fresh = Arc::new(AtomicBool::new(false));
        let old = std::mem::replace(&mut *self.cancel.lock().unwrap(), fresh);
        old.store(true, Ordering::Relaxed);
        self.wait_idle();
    }

    /// Cancel everything and drop all cached buffers.
    pub fn clear(&self) {
        self.cancel_prefetch();
        self.shared.slots.write().unwrap().clear();
    }

    /// Number of resident decoded buffers.
    pub fn cached_count(&self) -> usize {
        self.shared
            .slots
            .read()
            .unwrap()
            .values()
            .filter(|slot| matches!(slot, CacheSlot::Ready(_)))
            .count()
    }

    /// Base folder currently set as cache context.
    pub fn base_folder(&self) -> PathBuf {
        self.context.read().unwrap().base_folder.clone()
    }
}

/// Ambient cue names, exposed for the player.
pub fn combo_break_cue() -> &'static str {
    AMBIENT_ASSETS[0]
}
