//! HUD presentation model
//!
//! Every string the page shows, derived from the round. The host copies these
//! into the DOM; nothing here touches it.

use crate::sim::{RoundController, RoundState, ShapeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudView {
    /// "Time Left: N" or "Time's Up!"
    pub timer: String,
    /// "Locked in: N", shown only during the grace window
    pub lock_in: Option<String>,
    /// "Shapes in Box: N" while playing, "Final Count: N" once locked
    pub shapes: String,
    pub score: String,
    pub high_score: String,
    /// Preview of the next drop
    pub next_kind: ShapeKind,
    pub new_record: bool,
    pub show_instructions: bool,
}

impl HudView {
    pub fn from_controller(round: &RoundController) -> Self {
        let state = round.state();

        let timer = match state {
            RoundState::Idle | RoundState::Dropping => {
                format!("Time Left: {}", round.countdown())
            }
            RoundState::TimeUp | RoundState::Locked => "Time's Up!".to_string(),
        };

        let lock_in = (state == RoundState::TimeUp)
            .then(|| format!("Locked in: {}", round.grace_remaining()));

        let shapes = match round.final_score() {
            Some(score) => format!("Final Count: {}", score),
            None => format!("Shapes in Box: {}", round.shapes_in_box()),
        };

        Self {
            timer,
            lock_in,
            shapes,
            score: format!("Score: {}", round.final_score().unwrap_or(0)),
            high_score: format!("High Score: {}", round.high_score()),
            next_kind: round.next_kind(),
            new_record: round.is_new_record(),
            show_instructions: state == RoundState::Idle,
        }
    }
}
