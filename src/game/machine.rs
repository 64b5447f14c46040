use crate::feed::ScreenStatus;

/// Coarse game screen the player reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameScreen {
    NotRunning,
    /// Menus, song select, and any unrecognized screen.
    Browsing,
    Playing,
    Results,
}

impl GameScreen {
    /// Map an external screen status; unrecognized statuses already fold
    /// into SongSelect upstream, so everything lands somewhere sensible.
    pub fn from_status(status: ScreenStatus) -> Self {
        match status {
            ScreenStatus::NotRunning => GameScreen::NotRunning,
            ScreenStatus::MainMenu | ScreenStatus::SongSelect => GameScreen::Browsing,
            ScreenStatus::Playing => GameScreen::Playing,
            ScreenStatus::ResultScreen => GameScreen::Results,
        }
    }
}

/// A completed screen transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: GameScreen,
    pub to: GameScreen,
}

/// Tracks the current screen and reports transitions.
///
/// Transitions are driven solely by external status changes; the owner runs
/// exit effects for `from` and enter effects for `to` on every transition.
#[derive(Debug)]
pub struct StateMachine {
    current: GameScreen,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: GameScreen::NotRunning,
        }
    }

    pub fn current(&self) -> GameScreen {
        self.current
    }

    /// Apply a status change. Returns the transition if the screen changed.
    pub fn apply_status(&mut self, status: ScreenStatus) -> Option<Transition> {
        let to = GameScreen::from_status(status);
        if to == self.current {
            return None;
        }
        let from = std::mem::replace(&mut self.current, to);
        Some(Transition { from, to })
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
