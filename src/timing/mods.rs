use bitflags::bitflags;

bitflags! {
    /// Gameplay modifier bitmask as read out of process memory.
    ///
    /// Only the rate-affecting bits matter to timing; the rest are carried
    /// so feed samples round-trip without loss.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mods: u32 {
        const NO_FAIL     = 1 << 0;
        const EASY        = 1 << 1;
        const HIDDEN      = 1 << 3;
        const HARD_ROCK   = 1 << 4;
        const SUDDEN_DEATH = 1 << 5;
        const DOUBLE_TIME = 1 << 6;
        const RELAX       = 1 << 7;
        const HALF_TIME   = 1 << 8;
        /// Always set together with DOUBLE_TIME by the game.
        const NIGHTCORE   = 1 << 9;
        const FLASHLIGHT  = 1 << 10;
        const AUTOPLAY    = 1 << 11;
    }
}

impl Mods {
    /// Effective playback rate for the active modifiers.
    pub fn playback_rate(self) -> f64 {
        if self.intersects(Mods::DOUBLE_TIME | Mods::NIGHTCORE) {
            1.5
        } else if self.contains(Mods::HALF_TIME) {
            0.75
        } else {
            1.0
        }
    }
}
