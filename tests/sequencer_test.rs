mod common;

use std::sync::Arc;

use hitsync::audio::{FsDecoder, SampleCache};
use hitsync::beatmap::GameMode;
use hitsync::event::{HitsoundList, Priority, SampleEvent};
use hitsync::play::sequencer::SequencerOptions;
use hitsync::play::HitsoundSequencer;

struct Fixture {
    cache: SampleCache,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    common::write_test_wav(&dir.path().join("soft-hitnormal.wav"), 64);
    let cache = SampleCache::new(Arc::new(FsDecoder), None);
    cache.set_context(dir.path(), None);
    let probe = SampleEvent::new(0, Priority::Primary, "soft-hitnormal.wav");
    cache.request_async(&probe);
    cache.wait_idle();
    Fixture { cache, _dir: dir }
}

fn sequencer(key_events: Vec<SampleEvent>, hit_window_ms: f64) -> HitsoundSequencer {
    HitsoundSequencer::new(
        GameMode::Standard,
        0,
        HitsoundList {
            key_events,
            playback_events: Vec::new(),
        },
        SequencerOptions {
            hit_window_ms,
            ..Default::default()
        },
    )
}

#[test]
fn one_press_fires_both_chord_members() {
    let fx = fixture();
    // Two primaries 5ms apart sharing a chord guid.
    let a = SampleEvent::new(500, Priority::Primary, "soft-hitnormal.wav");
    let mut b = SampleEvent::new(505, Priority::Primary, "soft-hitnormal.wav");
    b.guid = a.guid;

    let mut seq = sequencer(vec![a, b], 50.0);
    let mut sounds = Vec::new();
    seq.process_interaction(520.0, 0, 1, &fx.cache, &mut sounds);

    assert_eq!(sounds.len(), 2, "one press plays the whole chord");
    assert_eq!(seq.key_events_remaining(), 0, "queue advanced past both");
}

#[test]
fn chord_drain_stops_at_the_next_guid() {
    let fx = fixture();
    let a = SampleEvent::new(500, Priority::Primary, "soft-hitnormal.wav");
    let mut b = SampleEvent::new(500, Priority::Primary, "soft-hitnormal.wav");
    b.guid = a.guid;
    // Same offset, different chord: must not fire from the same press.
    let c = SampleEvent::new(500, Priority::Primary, "soft-hitnormal.wav");

    let mut seq = sequencer(vec![a, b, c], 50.0);
    let mut sounds = Vec::new();
    seq.process_interaction(500.0, 0, 1, &fx.cache, &mut sounds);

    assert_eq!(sounds.len(), 2);
    assert_eq!(seq.key_events_remaining(), 1);
}

#[test]
fn press_after_window_discards_and_evaluates_next() {
    let fx = fixture();
    let stale = SampleEvent::new(100, Priority::Primary, "soft-hitnormal.wav");
    let due = SampleEvent::new(600, Priority::Primary, "soft-hitnormal.wav");

    let mut seq = sequencer(vec![stale, due], 150.0);
    let mut sounds = Vec::new();
    // 100's window ended at 250; 600 is in window at 550.
    seq.process_interaction(550.0, 0, 1, &fx.cache, &mut sounds);

    assert_eq!(sounds.len(), 1, "the same press catches the next event");
    assert_eq!(seq.key_events_remaining(), 0);
}

#[test]
fn press_before_window_emits_nothing_and_holds() {
    let fx = fixture();
    let future = SampleEvent::new(2_000, Priority::Primary, "soft-hitnormal.wav");

    let mut seq = sequencer(vec![future], 150.0);
    let mut sounds = Vec::new();
    seq.process_interaction(100.0, 0, 1, &fx.cache, &mut sounds);

    assert!(sounds.is_empty());
    assert_eq!(seq.key_events_remaining(), 1, "future note not consumed");
}
