pub mod machine;
pub mod player;

pub use machine::{GameScreen, StateMachine, Transition};
pub use player::HitsoundPlayer;
