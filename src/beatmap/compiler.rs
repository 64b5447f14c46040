use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::beatmap::raw::{
    Additions, GameMode, RawBeatmap, RawEdgeSound, RawHitObject, RawObjectKind, RawSampleInfo,
    RawTimingPoint,
};
use crate::event::{
    ControlEvent, ControlKind, HitsoundList, LoopChannel, PlaybackEvent, Priority, SampleEvent,
};

/// What to do with the single tail sound of a repeat-less slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliderTailBehavior {
    /// Drop a lone Secondary tail right after the head.
    Normal,
    /// Keep reverse/tail edges even when there is only one.
    KeepReverse,
}

/// Compiler knobs taken from the player settings.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub ignore_storyboard_samples: bool,
    pub ignore_slider_ticks: bool,
    pub slider_tail_behavior: SliderTailBehavior,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            ignore_storyboard_samples: false,
            ignore_slider_ticks: false,
            slider_tail_behavior: SliderTailBehavior::Normal,
        }
    }
}

/// Sample defaults used when a beatmap has no timing points at all.
const FALLBACK_TIMING_POINT: RawTimingPoint = RawTimingPoint {
    offset_ms: f64::MIN,
    bank: crate::beatmap::raw::SampleBank::Normal,
    sample_index: 0,
    volume: 1.0,
};

/// Offsets closer than this count as coinciding (tick vs. edge).
const COINCIDENCE_EPSILON_MS: f64 = 1.0;

/// A resolved sample source: filename plus where to look for it.
#[derive(Debug, Clone, PartialEq)]
struct ResolvedSample {
    filename: String,
    use_variant_source: bool,
    volume: f32,
}

/// Build the sample filename for a bank/kind/index triple.
///
/// Index 0 resolves from the variant source and index 1 is the bare name;
/// higher indices get a numeric suffix (`soft-hitclap2.wav`).
pub fn sample_name(bank: crate::beatmap::raw::SampleBank, kind: &str, index: u32) -> String {
    if index >= 2 {
        format!("{}-{}{}.wav", bank.prefix(), kind, index)
    } else {
        format!("{}-{}.wav", bank.prefix(), kind)
    }
}

/// Converts raw hit objects and timing points into the flat, time-ordered
/// hitsound lists the sequencers consume.
pub struct HitsoundCompiler<'a> {
    beatmap: &'a RawBeatmap,
    options: &'a CompileOptions,
    out: HitsoundList,
}

impl<'a> HitsoundCompiler<'a> {
    pub fn compile(beatmap: &'a RawBeatmap, options: &'a CompileOptions) -> HitsoundList {
        let mut compiler = Self {
            beatmap,
            options,
            out: HitsoundList::default(),
        };
        for obj in &beatmap.hit_objects {
            compiler.compile_object(obj);
        }
        if !options.ignore_storyboard_samples {
            for sb in &beatmap.storyboard_samples {
                let mut ev = SampleEvent::new(sb.offset_ms, Priority::Sampling, sb.filename.clone());
                ev.volume = sb.volume.clamp(0.0, 1.0);
                compiler.out.playback_events.push(PlaybackEvent::Sample(ev));
            }
        }
        compiler.out.sort();
        compiler.out
    }

    /// Timing point controlling the given time: the last one at or before
    /// it, or the first one for times before the whole list.
    fn timing_point_at(&self, time_ms: f64) -> &RawTimingPoint {
        let points = &self.beatmap.timing_points;
        points
            .iter()
            .rev()
            .find(|tp| tp.offset_ms <= time_ms)
            .or_else(|| points.first())
            .unwrap_or(&FALLBACK_TIMING_POINT)
    }

    fn balance(&self, x: f32) -> f32 {
        if self.beatmap.mode.ignores_balance() {
            0.0
        } else {
            (x / 512.0 * 2.0 - 1.0).clamp(-1.0, 1.0)
        }
    }

    fn column(&self, x: f32) -> u8 {
        if self.beatmap.mode != GameMode::Mania {
            return 0;
        }
        let count = self.beatmap.column_count.max(1) as f32;
        (x * count / 512.0).floor().clamp(0.0, count - 1.0) as u8
    }

    /// Resolve the full set of one-shot samples for a hit at `time_ms`.
    ///
    /// Precedence: edge override > object override > controlling timing
    /// point. A custom per-object filename short-circuits bank resolution.
    fn resolve_hit(
        &self,
        time_ms: f64,
        additions: Additions,
        sample: &RawSampleInfo,
        edge: Option<&RawEdgeSound>,
    ) -> Vec<ResolvedSample> {
        let tp = self.timing_point_at(time_ms);
        let volume = sample.volume.unwrap_or(tp.volume).clamp(0.0, 1.0);

        if let Some(name) = &sample.filename {
            return vec![ResolvedSample {
                filename: name.clone(),
                use_variant_source: false,
                volume,
            }];
        }

        let normal_bank = edge
            .and_then(|e| e.normal_bank)
            .or(sample.normal_bank)
            .unwrap_or(tp.bank);
        let addition_bank = edge
            .and_then(|e| e.addition_bank)
            .or(sample.addition_bank)
            .unwrap_or(normal_bank);
        let index = sample.index.unwrap_or(tp.sample_index);
        let use_variant = index == 0;

        let mut resolved = vec![ResolvedSample {
            filename: sample_name(normal_bank, "hitnormal", index),
            use_variant_source: use_variant,
            volume,
        }];
        for name in additions.names() {
            resolved.push(ResolvedSample {
                filename: sample_name(addition_bank, name, index),
                use_variant_source: use_variant,
                volume,
            });
        }
        resolved
    }

    /// Emit one chord group (shared guid) of sample events.
    fn push_chord(
        &mut self,
        offset_ms: i32,
        priority: Priority,
        resolved: Vec<ResolvedSample>,
        balance: f32,
        column: u8,
    ) {
        let guid = Uuid::new_v4();
        for r in resolved {
            let ev = SampleEvent {
                offset_ms,
                guid,
                priority,
                filename: r.filename,
                use_variant_source: r.use_variant_source,
                volume: r.volume,
                balance,
                column,
            };
            match priority {
                Priority::Primary => self.out.key_events.push(ev),
                _ => self.out.playback_events.push(PlaybackEvent::Sample(ev)),
            }
        }
    }

    fn compile_object(&mut self, obj: &RawHitObject) {
        let balance = self.balance(obj.x);
        let column = self.column(obj.x);

        match &obj.kind {
            RawObjectKind::Circle | RawObjectKind::Hold { .. } => {
                let resolved =
                    self.resolve_hit(obj.start_ms as f64, obj.additions, &obj.sample, None);
                self.push_chord(obj.start_ms, Priority::Primary, resolved, balance, column);
            }
            RawObjectKind::Spinner { end_ms } => {
                // The spinner bonus sound fires on completion, not on a
                // discrete press.
                let resolved = self.resolve_hit(*end_ms as f64, obj.additions, &obj.sample, None);
                self.push_chord(*end_ms, Priority::Secondary, resolved, balance, column);
            }
            RawObjectKind::Slider {
                repeats,
                span_ms,
                tick_interval_ms,
                edge_sounds,
            } => {
                self.compile_slider(
                    obj,
                    *repeats,
                    *span_ms,
                    *tick_interval_ms,
                    edge_sounds,
                    balance,
                    column,
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn compile_slider(
        &mut self,
        obj: &RawHitObject,
        repeats: u32,
        span_ms: f64,
        tick_interval_ms: f64,
        edge_sounds: &[RawEdgeSound],
        balance: f32,
        column: u8,
    ) {
        let edge_count = repeats + 1;
        let end_ms = obj.start_ms as f64 + span_ms * edge_count as f64;

        // One event chord per edge: the head is interactive, the rest are
        // played back automatically.
        for edge in 0..=edge_count {
            let time = obj.start_ms as f64 + span_ms * edge as f64;
            let edge_sound = edge_sounds.get(edge as usize);
            let additions = edge_sound.map(|e| e.additions).unwrap_or(obj.additions);
            let resolved = self.resolve_hit(time, additions, &obj.sample, edge_sound);

            if edge == 0 {
                self.push_chord(obj.start_ms, Priority::Primary, resolved, balance, column);
            } else {
                // A lone tail right after the head is dropped under Normal
                // tail behavior; repeat runs are always kept.
                if edge_count == 1
                    && self.options.slider_tail_behavior == SliderTailBehavior::Normal
                {
                    continue;
                }
                self.push_chord(
                    time.round() as i32,
                    Priority::Secondary,
                    resolved,
                    balance,
                    column,
                );
            }
        }

        if !self.options.ignore_slider_ticks && tick_interval_ms > 0.0 {
            self.compile_ticks(obj, edge_count, span_ms, tick_interval_ms, balance, column);
        }

        self.compile_slide_loop(obj, end_ms, "sliderslide", LoopChannel::Slide, balance);
        if obj.additions.contains(Additions::WHISTLE) {
            self.compile_slide_loop(obj, end_ms, "sliderwhistle", LoopChannel::Whistle, balance);
        }
    }

    /// Tick sounds inside each traversal, skipping offsets that coincide
    /// with an edge.
    fn compile_ticks(
        &mut self,
        obj: &RawHitObject,
        edge_count: u32,
        span_ms: f64,
        tick_interval_ms: f64,
        balance: f32,
        column: u8,
    ) {
        for span in 0..edge_count {
            let span_start = obj.start_ms as f64 + span_ms * span as f64;
            let mut k = 1;
            loop {
                let rel = tick_interval_ms * k as f64;
                if rel >= span_ms - COINCIDENCE_EPSILON_MS {
                    break;
                }
                let time = span_start + rel;
                let tp = self.timing_point_at(time);
                let bank = obj.sample.normal_bank.unwrap_or(tp.bank);
                let index = obj.sample.index.unwrap_or(tp.sample_index);
                let volume = obj.sample.volume.unwrap_or(tp.volume).clamp(0.0, 1.0);
                self.push_chord(
                    time.round() as i32,
                    Priority::Effects,
                    vec![ResolvedSample {
                        filename: sample_name(bank, "slidertick", index),
                        use_variant_source: index == 0,
                        volume,
                    }],
                    balance,
                    column,
                );
                k += 1;
            }
        }
    }

    /// Resolve the looping slide sample in effect at `time_ms`.
    fn resolve_loop(&self, obj: &RawHitObject, kind: &str, time_ms: f64) -> ResolvedSample {
        let tp = self.timing_point_at(time_ms);
        let bank = obj.sample.normal_bank.unwrap_or(tp.bank);
        let index = obj.sample.index.unwrap_or(tp.sample_index);
        ResolvedSample {
            filename: sample_name(bank, kind, index),
            use_variant_source: index == 0,
            volume: obj.sample.volume.unwrap_or(tp.volume).clamp(0.0, 1.0),
        }
    }

    /// Emit the StartLoop/ChangeLoopVolume/StopLoop sequence spanning the
    /// slide duration. Timing-point boundaries inside the span only
    /// re-trigger the loop when the resolved sample actually changes;
    /// volume-only changes mutate in place.
    fn compile_slide_loop(
        &mut self,
        obj: &RawHitObject,
        end_ms: f64,
        kind: &str,
        channel: LoopChannel,
        balance: f32,
    ) {
        let start = obj.start_ms as f64;
        let mut current = self.resolve_loop(obj, kind, start);

        self.out
            .playback_events
            .push(PlaybackEvent::Control(ControlEvent {
                offset_ms: obj.start_ms,
                channel,
                kind: ControlKind::StartLoop {
                    filename: current.filename.clone(),
                    use_variant_source: current.use_variant_source,
                    volume: current.volume,
                    balance,
                },
            }));

        for tp in &self.beatmap.timing_points {
            if tp.offset_ms <= start || tp.offset_ms >= end_ms {
                continue;
            }
            let next = self.resolve_loop(obj, kind, tp.offset_ms);
            let offset = tp.offset_ms.round() as i32;
            if next.filename != current.filename
                || next.use_variant_source != current.use_variant_source
            {
                self.out
                    .playback_events
                    .push(PlaybackEvent::Control(ControlEvent {
                        offset_ms: offset,
                        channel,
                        kind: ControlKind::StopLoop,
                    }));
                self.out
                    .playback_events
                    .push(PlaybackEvent::Control(ControlEvent {
                        offset_ms: offset,
                        channel,
                        kind: ControlKind::StartLoop {
                            filename: next.filename.clone(),
                            use_variant_source: next.use_variant_source,
                            volume: next.volume,
                            balance,
                        },
                    }));
            } else if (next.volume - current.volume).abs() > f32::EPSILON {
                self.out
                    .playback_events
                    .push(PlaybackEvent::Control(ControlEvent {
                        offset_ms: offset,
                        channel,
                        kind: ControlKind::ChangeLoopVolume(next.volume),
                    }));
            }
            current = next;
        }

        self.out
            .playback_events
            .push(PlaybackEvent::Control(ControlEvent {
                offset_ms: end_ms.round() as i32,
                channel,
                kind: ControlKind::StopLoop,
            }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beatmap::raw::{RawStoryboardSample, SampleBank};

    fn soft_tp(offset_ms: f64, volume: f32) -> RawTimingPoint {
        RawTimingPoint {
            offset_ms,
            bank: SampleBank::Soft,
            sample_index: 1,
            volume,
        }
    }

    fn beatmap(objects: Vec<RawHitObject>, points: Vec<RawTimingPoint>) -> RawBeatmap {
        RawBeatmap {
            mode: GameMode::Standard,
            column_count: 0,
            hit_objects: objects,
            timing_points: points,
            storyboard_samples: Vec::new(),
        }
    }

    fn compile(map: &RawBeatmap) -> HitsoundList {
        HitsoundCompiler::compile(map, &CompileOptions::default())
    }

    fn control_kinds(list: &HitsoundList, channel: LoopChannel) -> Vec<&ControlKind> {
        list.playback_events
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Control(c) if c.channel == channel => Some(&c.kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn circle_resolves_timing_point_defaults() {
        let map = beatmap(
            vec![RawHitObject::circle(256.0, 1000)],
            vec![soft_tp(0.0, 0.7)],
        );
        let list = compile(&map);

        assert_eq!(list.key_events.len(), 1);
        let ev = &list.key_events[0];
        assert_eq!(ev.filename, "soft-hitnormal.wav");
        assert!(!ev.use_variant_source);
        assert!((ev.volume - 0.7).abs() < 1e-6);
        assert!(ev.balance.abs() < 1e-6);
    }

    #[test]
    fn additions_share_the_chord_guid() {
        let mut obj = RawHitObject::circle(256.0, 1000);
        obj.additions = Additions::WHISTLE | Additions::CLAP;
        let map = beatmap(vec![obj], vec![soft_tp(0.0, 1.0)]);
        let list = compile(&map);

        assert_eq!(list.key_events.len(), 3);
        let guid = list.key_events[0].guid;
        assert!(list.key_events.iter().all(|e| e.guid == guid));
        let names: Vec<_> = list.key_events.iter().map(|e| e.filename.as_str()).collect();
        assert!(names.contains(&"soft-hitwhistle.wav"));
        assert!(names.contains(&"soft-hitclap.wav"));
    }

    #[test]
    fn sample_index_zero_uses_variant_source() {
        let mut map = beatmap(vec![RawHitObject::circle(0.0, 0)], vec![soft_tp(0.0, 1.0)]);
        map.timing_points[0].sample_index = 0;
        let list = compile(&map);
        assert!(list.key_events[0].use_variant_source);
        assert_eq!(list.key_events[0].filename, "soft-hitnormal.wav");
    }

    #[test]
    fn sample_index_suffix_naming() {
        assert_eq!(sample_name(SampleBank::Soft, "hitclap", 0), "soft-hitclap.wav");
        assert_eq!(sample_name(SampleBank::Soft, "hitclap", 1), "soft-hitclap.wav");
        assert_eq!(sample_name(SampleBank::Drum, "hitclap", 3), "drum-hitclap3.wav");
    }

    #[test]
    fn custom_filename_short_circuits() {
        let mut obj = RawHitObject::circle(256.0, 500);
        obj.additions = Additions::FINISH;
        obj.sample.filename = Some("custom.wav".into());
        let map = beatmap(vec![obj], vec![soft_tp(0.0, 1.0)]);
        let list = compile(&map);

        assert_eq!(list.key_events.len(), 1);
        assert_eq!(list.key_events[0].filename, "custom.wav");
        assert!(!list.key_events[0].use_variant_source);
    }

    #[test]
    fn balance_maps_x_linearly() {
        let map = beatmap(vec![RawHitObject::circle(0.0, 0)], vec![soft_tp(0.0, 1.0)]);
        let list = compile(&map);
        assert!((list.key_events[0].balance + 1.0).abs() < 1e-6);

        let map = beatmap(vec![RawHitObject::circle(512.0, 0)], vec![soft_tp(0.0, 1.0)]);
        let list = compile(&map);
        assert!((list.key_events[0].balance - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mania_assigns_columns_and_centers_balance() {
        let mut map = beatmap(
            vec![
                RawHitObject::circle(64.0, 0),
                RawHitObject::circle(448.0, 0),
            ],
            vec![soft_tp(0.0, 1.0)],
        );
        map.mode = GameMode::Mania;
        map.column_count = 4;
        let list = compile(&map);

        assert_eq!(list.key_events[0].column, 0);
        assert_eq!(list.key_events[1].column, 3);
        assert!(list.key_events.iter().all(|e| e.balance == 0.0));
    }

    fn slider(start: i32, repeats: u32, span_ms: f64, tick_interval_ms: f64) -> RawHitObject {
        RawHitObject {
            x: 256.0,
            start_ms: start,
            additions: Additions::empty(),
            sample: RawSampleInfo::default(),
            kind: RawObjectKind::Slider {
                repeats,
                span_ms,
                tick_interval_ms,
                edge_sounds: Vec::new(),
            },
        }
    }

    #[test]
    fn repeatless_slider_tail_is_dropped_under_normal() {
        let map = beatmap(vec![slider(1000, 0, 400.0, 0.0)], vec![soft_tp(0.0, 1.0)]);
        let list = compile(&map);

        assert_eq!(list.key_events.len(), 1);
        let samples: Vec<_> = list
            .playback_events
            .iter()
            .filter(|e| matches!(e, PlaybackEvent::Sample(_)))
            .collect();
        assert!(samples.is_empty(), "tail should be discarded: {samples:?}");
    }

    #[test]
    fn keep_reverse_retains_the_tail() {
        let map = beatmap(vec![slider(1000, 0, 400.0, 0.0)], vec![soft_tp(0.0, 1.0)]);
        let options = CompileOptions {
            slider_tail_behavior: SliderTailBehavior::KeepReverse,
            ..Default::default()
        };
        let list = HitsoundCompiler::compile(&map, &options);

        let tails: Vec<_> = list
            .playback_events
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Sample(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(tails.len(), 1);
        assert_eq!(tails[0].offset_ms, 1400);
        assert_eq!(tails[0].priority, Priority::Secondary);
    }

    #[test]
    fn repeat_slider_keeps_all_edges() {
        let map = beatmap(vec![slider(0, 2, 300.0, 0.0)], vec![soft_tp(0.0, 1.0)]);
        let list = compile(&map);

        assert_eq!(list.key_events.len(), 1);
        let edge_offsets: Vec<_> = list
            .playback_events
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Sample(s) if s.priority == Priority::Secondary => Some(s.offset_ms),
                _ => None,
            })
            .collect();
        assert_eq!(edge_offsets, vec![300, 600, 900]);
    }

    #[test]
    fn ticks_exclude_edge_coincidence() {
        // Span of 400ms with 100ms ticks: ticks at +100/+200/+300 per span,
        // never at 0 or 400 (those are edges).
        let map = beatmap(vec![slider(0, 1, 400.0, 100.0)], vec![soft_tp(0.0, 1.0)]);
        let list = compile(&map);

        let tick_offsets: Vec<_> = list
            .playback_events
            .iter()
            .filter_map(|e| match e {
                PlaybackEvent::Sample(s) if s.priority == Priority::Effects => Some(s.offset_ms),
                _ => None,
            })
            .collect();
        assert_eq!(tick_offsets, vec![100, 200, 300, 500, 600, 700]);
        assert!(
            list.playback_events
                .iter()
                .filter_map(|e| match e {
                    PlaybackEvent::Sample(s) if s.priority == Priority::Effects =>
                        Some(s.filename.as_str()),
                    _ => None,
                })
                .all(|n| n == "soft-slidertick.wav")
        );
    }

    #[test]
    fn slide_loop_spans_the_slider() {
        let map = beatmap(vec![slider(1000, 0, 500.0, 0.0)], vec![soft_tp(0.0, 1.0)]);
        let list = compile(&map);

        let kinds = control_kinds(&list, LoopChannel::Slide);
        assert_eq!(kinds.len(), 2);
        assert!(matches!(kinds[0], ControlKind::StartLoop { filename, .. }
            if filename == "soft-sliderslide.wav"));
        assert!(matches!(kinds[1], ControlKind::StopLoop));
    }

    #[test]
    fn volume_only_boundary_collapses_to_volume_change() {
        let map = beatmap(
            vec![slider(0, 0, 1000.0, 0.0)],
            vec![soft_tp(0.0, 1.0), soft_tp(500.0, 0.4)],
        );
        let list = compile(&map);

        let kinds = control_kinds(&list, LoopChannel::Slide);
        assert_eq!(kinds.len(), 3);
        assert!(matches!(kinds[0], ControlKind::StartLoop { .. }));
        assert!(matches!(kinds[1], ControlKind::ChangeLoopVolume(v) if (v - 0.4).abs() < 1e-6));
        assert!(matches!(kinds[2], ControlKind::StopLoop));
    }

    #[test]
    fn bank_change_boundary_retriggers_loop() {
        let mut second = soft_tp(500.0, 1.0);
        second.bank = SampleBank::Drum;
        let map = beatmap(vec![slider(0, 0, 1000.0, 0.0)], vec![soft_tp(0.0, 1.0), second]);
        let list = compile(&map);

        let kinds = control_kinds(&list, LoopChannel::Slide);
        assert_eq!(kinds.len(), 4);
        assert!(matches!(kinds[1], ControlKind::StopLoop));
        assert!(matches!(kinds[2], ControlKind::StartLoop { filename, .. }
            if filename == "drum-sliderslide.wav"));
        assert!(matches!(kinds[3], ControlKind::StopLoop));
    }

    #[test]
    fn whistle_addition_adds_a_second_loop() {
        let mut obj = slider(0, 0, 500.0, 0.0);
        obj.additions = Additions::WHISTLE;
        let map = beatmap(vec![obj], vec![soft_tp(0.0, 1.0)]);
        let list = compile(&map);

        let kinds = control_kinds(&list, LoopChannel::Whistle);
        assert_eq!(kinds.len(), 2);
        assert!(matches!(kinds[0], ControlKind::StartLoop { filename, .. }
            if filename == "soft-sliderwhistle.wav"));
    }

    #[test]
    fn storyboard_samples_are_sampling_priority() {
        let mut map = beatmap(vec![], vec![soft_tp(0.0, 1.0)]);
        map.storyboard_samples.push(RawStoryboardSample {
            offset_ms: 1234,
            filename: "sb/boom.wav".into(),
            volume: 0.5,
        });
        let list = compile(&map);

        assert_eq!(list.playback_events.len(), 1);
        match &list.playback_events[0] {
            PlaybackEvent::Sample(s) => {
                assert_eq!(s.priority, Priority::Sampling);
                assert_eq!(s.filename, "sb/boom.wav");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let options = CompileOptions {
            ignore_storyboard_samples: true,
            ..Default::default()
        };
        let list = HitsoundCompiler::compile(&map, &options);
        assert!(list.playback_events.is_empty());
    }

    #[test]
    fn output_is_offset_sorted() {
        let map = beatmap(
            vec![
                RawHitObject::circle(256.0, 2000),
                RawHitObject::circle(256.0, 500),
                slider(1000, 1, 200.0, 0.0),
            ],
            vec![soft_tp(0.0, 1.0)],
        );
        let list = compile(&map);

        let mut last = i32::MIN;
        for ev in &list.key_events {
            assert!(ev.offset_ms >= last);
            last = ev.offset_ms;
        }
        let mut last = i32::MIN;
        for ev in &list.playback_events {
            assert!(ev.offset_ms() >= last);
            last = ev.offset_ms();
        }
    }
}
