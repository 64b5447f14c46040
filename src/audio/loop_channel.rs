use std::collections::HashMap;

use tracing::{debug, warn};

use crate::audio::cache::SampleCache;
use crate::audio::output::{LoopHandle, OutputGraph};
use crate::event::{ControlEvent, ControlKind, LoopChannel, Priority, SampleEvent};

/// A loop currently attached to the output graph.
#[derive(Debug)]
struct ActiveLoop {
    handle: LoopHandle,
    volume: f32,
    balance: f32,
}

/// Owns the lifecycle of continuously looping sounds (slider slides).
///
/// Each channel is either idle or looping; StartLoop on a looping channel
/// tears the old instance down first, volume/balance changes mutate in
/// place, and a full session stop force-stops everything.
#[derive(Debug, Default)]
pub struct LoopChannelManager {
    channels: HashMap<LoopChannel, ActiveLoop>,
}

impl LoopChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one sequencer-emitted control event.
    pub fn apply(&mut self, event: &ControlEvent, cache: &SampleCache, out: &mut dyn OutputGraph) {
        match &event.kind {
            ControlKind::StartLoop {
                filename,
                use_variant_source,
                volume,
                balance,
            } => {
                self.stop_channel(event.channel, out);

                // Loop sources go through the same cache as one-shots.
                let mut probe = SampleEvent::new(event.offset_ms, Priority::Effects, filename.clone());
                probe.use_variant_source = *use_variant_source;
                let Some(pcm) = cache.try_get_cached(&probe) else {
                    debug!(filename, "loop sample not cached, skipping start");
                    cache.request_async(&probe);
                    return;
                };

                match out.attach_loop(&pcm, *volume, *balance) {
                    Some(handle) => {
                        self.channels.insert(
                            event.channel,
                            ActiveLoop {
                                handle,
                                volume: *volume,
                                balance: *balance,
                            },
                        );
                    }
                    None => warn!(filename, "loop attach failed"),
                }
            }
            ControlKind::StopLoop => self.stop_channel(event.channel, out),
            ControlKind::ChangeLoopVolume(volume) => {
                if let Some(active) = self.channels.get_mut(&event.channel) {
                    active.volume = *volume;
                    out.set_loop_volume(active.handle, *volume);
                }
            }
            ControlKind::ChangeLoopBalance(balance) => {
                if let Some(active) = self.channels.get_mut(&event.channel) {
                    active.balance = *balance;
                    out.set_loop_balance(active.handle, *balance);
                }
            }
        }
    }

    fn stop_channel(&mut self, channel: LoopChannel, out: &mut dyn OutputGraph) {
        if let Some(active) = self.channels.remove(&channel) {
            out.detach_loop(active.handle);
        }
    }

    /// Force-stop every channel regardless of state.
    pub fn stop_all(&mut self, out: &mut dyn OutputGraph) {
        for channel in LoopChannel::ALL {
            self.stop_channel(channel, out);
        }
    }

    pub fn active_count(&self) -> usize {
        self.channels.len()
    }

    /// Current volume of a looping channel, if active.
    pub fn channel_volume(&self, channel: LoopChannel) -> Option<f32> {
        self.channels.get(&channel).map(|a| a.volume)
    }
}
