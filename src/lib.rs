//! Shape Stacker - drop shapes into a box before the clock runs out
//!
//! Core modules:
//! - `sim`: Round state machine, field geometry, shapes and the rapier stacking world
//! - `highscores`: Local best score persistence
//! - `leaderboard`: Remote top-10 board (entries, initials, REST client)
//! - `hud`: Presentation model derived from the round
//! - `session`: One playable game wiring the pieces together
//! - `renderer`: Shape outlines and the 2D canvas renderer
//! - `config`: Data-driven timings, layout and endpoint

pub mod config;
pub mod highscores;
pub mod hud;
pub mod leaderboard;
pub mod renderer;
pub mod session;
pub mod sim;

pub use config::GameConfig;
pub use highscores::{HighScoreStore, LocalHighScore, MemoryHighScore};
pub use leaderboard::{Initials, LeaderboardClient, LeaderboardView, ScoreEntry};
pub use session::Session;
pub use sim::{RoundController, RoundEvent, RoundState};

/// Game configuration constants
pub mod consts {
    /// Main countdown length in seconds
    pub const COUNTDOWN_SECS: u32 = 30;
    /// Lock-in grace window after the countdown, in seconds
    pub const GRACE_SECS: u32 = 15;
    /// Timer tick interval (1 Hz)
    pub const TICK_INTERVAL_MS: i32 = 1000;

    /// Largest playfield the game will size itself to
    pub const MAX_VIEWPORT_WIDTH: f32 = 800.0;
    pub const MAX_VIEWPORT_HEIGHT: f32 = 600.0;
    /// Box size as a fraction of the viewport
    pub const BOX_FRACTION: f32 = 0.84;
    /// Drop guide line height above the box, as a fraction of viewport height
    pub const DROP_LINE_FRACTION: f32 = 0.08;

    /// Fixed physics timestep (60 Hz)
    pub const PHYSICS_DT: f32 = 1.0 / 60.0;
    /// Maximum physics substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Downward acceleration, pixels/s²
    pub const GRAVITY: f32 = 980.0;

    /// Entries shown on the leaderboard
    pub const LEADERBOARD_LIMIT: usize = 10;
    /// Longest accepted initials
    pub const MAX_INITIALS: usize = 3;

    /// LocalStorage keys
    pub const HIGH_SCORE_KEY: &str = "ShapeStackerHighScore";
    pub const CONFIG_KEY: &str = "ShapeStackerConfig";
}
