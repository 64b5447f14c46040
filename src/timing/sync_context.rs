use std::time::{Duration, Instant};

use tracing::debug;

use crate::feed::ScreenStatus;
use crate::timing::Mods;

/// Extrapolation horizon: beyond this the feed has stalled and prediction
/// holds instead of running away.
const EXTRAPOLATION_CAP_MS: f64 = 100.0;

/// Backward drops larger than this are seeks/retries and accepted at once.
const BACKWARD_SEEK_MS: f64 = 100.0;

/// How long a small backward drop is held steady before force-accepting.
const FREEZE_WINDOW: Duration = Duration::from_millis(200);

/// Raw samples diverging from the prediction by more than this (scaled by
/// the effective rate) hard-reset the anchor.
const RESYNC_BASE_MS: f64 = 50.0;

/// Converts sparse raw position samples into a monotonic, extrapolated,
/// rate-aware current time.
///
/// Readers call `current_time()` at high frequency; the memory reader pushes
/// `set_raw_position` / `set_mods` / `set_status` whenever it has news. All
/// mutating and reading operations have `_at(now)` variants so tests drive
/// the wall clock explicitly.
#[derive(Debug)]
pub struct SyncContext {
    /// Wall-clock snapshot the anchor was taken at.
    anchor_tick: Instant,
    /// Game time at the anchor, in milliseconds.
    anchor_ms: f64,
    /// True once at least one raw sample has arrived.
    anchored: bool,
    /// Rate derived from the active mods.
    rate: f64,
    status: ScreenStatus,
    /// Monotonic floor; None after a guard reset.
    last_returned: Option<f64>,
    /// Deadline of the active freeze window, if any.
    freeze_until: Option<Instant>,
}

impl SyncContext {
    pub fn new() -> Self {
        Self {
            anchor_tick: Instant::now(),
            anchor_ms: 0.0,
            anchored: false,
            rate: 1.0,
            status: ScreenStatus::NotRunning,
            last_returned: None,
            freeze_until: None,
        }
    }

    /// Rate actually applied to extrapolation right now.
    ///
    /// Mods only speed up the timeline while the game is in a playing
    /// screen; menus and results tick at wall-clock rate.
    fn effective_rate(&self) -> f64 {
        if self.status == ScreenStatus::Playing {
            self.rate
        } else {
            1.0
        }
    }

    /// Raw extrapolation from the anchor, without monotonicity guards.
    fn predict(&self, now: Instant) -> f64 {
        if !self.anchored {
            return self.last_returned.unwrap_or(0.0);
        }
        let elapsed_ms = now.duration_since(self.anchor_tick).as_secs_f64() * 1000.0;
        self.anchor_ms + elapsed_ms.min(EXTRAPOLATION_CAP_MS) * self.effective_rate()
    }

    pub fn current_time(&mut self) -> f64 {
        self.current_time_at(Instant::now())
    }

    /// Extrapolated current time with anti-rollback guards applied.
    pub fn current_time_at(&mut self, now: Instant) -> f64 {
        let predicted = self.predict(now);

        let Some(last) = self.last_returned else {
            self.last_returned = Some(predicted);
            return predicted;
        };

        if predicted >= last {
            self.freeze_until = None;
            self.last_returned = Some(predicted);
            return predicted;
        }

        let drop = last - predicted;
        if drop > BACKWARD_SEEK_MS {
            // Large backward jump: a legitimate seek or retry.
            debug!(from = last, to = predicted, "accepting backward seek");
            self.freeze_until = None;
            self.last_returned = Some(predicted);
            return predicted;
        }

        // Small backward drop: likely read jitter. Hold the last value
        // for a short window before giving in.
        match self.freeze_until {
            None => {
                self.freeze_until = Some(now + FREEZE_WINDOW);
                last
            }
            Some(deadline) if now < deadline => last,
            Some(_) => {
                debug!(from = last, to = predicted, "freeze window expired, force-accepting");
                self.freeze_until = None;
                self.last_returned = Some(predicted);
                predicted
            }
        }
    }

    pub fn set_raw_position(&mut self, ms: f64) {
        self.set_raw_position_at(ms, Instant::now());
    }

    /// Accept a fresh raw position sample from the reader.
    pub fn set_raw_position_at(&mut self, ms: f64, now: Instant) {
        if self.anchored {
            let diff = ms - self.predict(now);
            let threshold = RESYNC_BASE_MS * self.effective_rate();
            if diff.abs() <= threshold || (-BACKWARD_SEEK_MS..0.0).contains(&diff) {
                // Within tolerance, or a backward drop small enough to be
                // read jitter: re-anchor but keep the monotonic floor so
                // the returned time freezes instead of rewinding.
                self.anchor_tick = now;
                self.anchor_ms = ms;
                return;
            }
            debug!(
                raw = ms,
                predicted = self.predict(now),
                "raw sample discontinuity, hard reset"
            );
        }
        self.anchor_tick = now;
        self.anchor_ms = ms;
        self.anchored = true;
        self.freeze_until = None;
        self.last_returned = Some(ms);
    }

    pub fn set_mods(&mut self, mods: Mods) {
        self.set_mods_at(mods, Instant::now());
    }

    /// Apply a mods change, re-basing the anchor at the current predicted
    /// time so playback stays continuous across the rate change.
    pub fn set_mods_at(&mut self, mods: Mods, now: Instant) {
        let new_rate = mods.playback_rate();
        if new_rate == self.rate {
            return;
        }
        if self.anchored {
            self.anchor_ms = self.predict(now);
            self.anchor_tick = now;
        }
        self.rate = new_rate;
    }

    pub fn set_status(&mut self, status: ScreenStatus) {
        self.set_status_at(status, Instant::now());
    }

    /// Apply a screen-status change. Screen transitions legitimately jump
    /// time, so all guards reset.
    pub fn set_status_at(&mut self, status: ScreenStatus, now: Instant) {
        if status == self.status {
            return;
        }
        if self.anchored {
            self.anchor_ms = self.predict(now);
            self.anchor_tick = now;
        }
        self.status = status;
        self.freeze_until = None;
        self.last_returned = None;
    }

    pub fn playback_rate(&self) -> f64 {
        self.rate
    }

    pub fn status(&self) -> ScreenStatus {
        self.status
    }
}

impl Default for SyncContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_context(start: Instant) -> SyncContext {
        let mut ctx = SyncContext::new();
        ctx.set_status_at(ScreenStatus::Playing, start);
        ctx.set_raw_position_at(1000.0, start);
        ctx
    }

    #[test]
    fn extrapolates_between_samples() {
        let t0 = Instant::now();
        let mut ctx = playing_context(t0);

        let t1 = t0 + Duration::from_millis(50);
        assert!((ctx.current_time_at(t1) - 1050.0).abs() < 1.0);
    }

    #[test]
    fn extrapolation_is_capped() {
        let t0 = Instant::now();
        let mut ctx = playing_context(t0);

        // Feed stalled for 500ms: prediction holds at anchor + cap.
        let t1 = t0 + Duration::from_millis(500);
        assert!((ctx.current_time_at(t1) - 1100.0).abs() < 1.0);
    }

    #[test]
    fn double_time_scales_extrapolation() {
        let t0 = Instant::now();
        let mut ctx = playing_context(t0);
        ctx.set_mods_at(Mods::DOUBLE_TIME, t0);

        let t1 = t0 + Duration::from_millis(100);
        assert!((ctx.current_time_at(t1) - 1150.0).abs() < 1.0);
    }

    #[test]
    fn rate_not_applied_outside_playing() {
        let t0 = Instant::now();
        let mut ctx = SyncContext::new();
        ctx.set_status_at(ScreenStatus::SongSelect, t0);
        ctx.set_mods_at(Mods::DOUBLE_TIME, t0);
        ctx.set_raw_position_at(1000.0, t0);

        let t1 = t0 + Duration::from_millis(100);
        assert!((ctx.current_time_at(t1) - 1100.0).abs() < 1.0);
    }

    #[test]
    fn small_backward_jitter_is_frozen() {
        let t0 = Instant::now();
        let mut ctx = playing_context(t0);

        let t1 = t0 + Duration::from_millis(80);
        let v1 = ctx.current_time_at(t1);

        // Reader jitters 30ms backwards; within the freeze window the
        // returned value holds steady.
        ctx.set_raw_position_at(v1 - 30.0, t1);
        let t2 = t1 + Duration::from_millis(10);
        assert_eq!(ctx.current_time_at(t2), v1);
    }

    #[test]
    fn freeze_window_expiry_force_accepts() {
        let t0 = Instant::now();
        let mut ctx = playing_context(t0);

        let t1 = t0 + Duration::from_millis(80);
        let v1 = ctx.current_time_at(t1);

        // The upstream position stalls 80ms behind and keeps reporting it.
        let stalled = v1 - 80.0;
        ctx.set_raw_position_at(stalled, t1);
        let t2 = t1 + Duration::from_millis(10);
        assert_eq!(ctx.current_time_at(t2), v1, "held during the freeze window");

        for step in [40u64, 70, 100, 130, 160, 190, 220] {
            ctx.set_raw_position_at(stalled, t1 + Duration::from_millis(step));
        }
        assert_eq!(ctx.current_time_at(t1 + Duration::from_millis(200)), v1);

        // Window expires without recovery: the lower value wins.
        let t3 = t1 + Duration::from_millis(240);
        let forced = ctx.current_time_at(t3);
        assert!(forced < v1, "expected force-accept below {v1}, got {forced}");
    }

    #[test]
    fn large_backward_jump_is_a_seek() {
        let t0 = Instant::now();
        let mut ctx = playing_context(t0);

        let t1 = t0 + Duration::from_millis(50);
        ctx.current_time_at(t1);

        // Retry: position snaps back to zero.
        ctx.set_raw_position_at(0.0, t1);
        let t2 = t1 + Duration::from_millis(5);
        assert!(ctx.current_time_at(t2) < 100.0);
    }

    #[test]
    fn monotonic_without_discontinuities() {
        let t0 = Instant::now();
        let mut ctx = playing_context(t0);

        let mut last = ctx.current_time_at(t0);
        for i in 1..100 {
            let now = t0 + Duration::from_millis(i * 7);
            if i % 10 == 0 {
                // Raw samples alternately slightly ahead of and behind the
                // prediction.
                let jitter = if i % 20 == 0 { -20.0 } else { 15.0 };
                ctx.set_raw_position_at(1000.0 + (i * 7) as f64 + jitter, now);
            }
            let v = ctx.current_time_at(now);
            assert!(v >= last, "time went backwards: {v} < {last}");
            last = v;
        }
    }

    #[test]
    fn status_change_resets_guards() {
        let t0 = Instant::now();
        let mut ctx = playing_context(t0);

        let t1 = t0 + Duration::from_millis(50);
        let before = ctx.current_time_at(t1);
        assert!(before > 1000.0);

        // Back to song select: a much earlier preview time is acceptable
        // immediately.
        ctx.set_status_at(ScreenStatus::SongSelect, t1);
        ctx.set_raw_position_at(980.0, t1);
        let t2 = t1 + Duration::from_millis(5);
        assert!(ctx.current_time_at(t2) < before);
    }

    #[test]
    fn divergent_raw_sample_hard_resets() {
        let t0 = Instant::now();
        let mut ctx = playing_context(t0);

        let t1 = t0 + Duration::from_millis(20);
        ctx.set_raw_position_at(5000.0, t1);
        let t2 = t1 + Duration::from_millis(5);
        let v = ctx.current_time_at(t2);
        assert!((v - 5005.0).abs() < 5.0);
    }
}
