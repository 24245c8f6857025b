//! One playable game
//!
//! Wires the round to its collaborators: commands go to the physics world,
//! positions come back, new records are persisted and the initials prompt is
//! tracked. A reset throws the round and the world away and builds new ones.

use glam::Vec2;
use thiserror::Error;

use crate::config::{GameConfig, Viewport};
use crate::consts::{MAX_SUBSTEPS, PHYSICS_DT};
use crate::highscores::HighScoreStore;
use crate::hud::HudView;
use crate::leaderboard::{Initials, InitialsError, ScoreEntry};
use crate::sim::{
    PhysicsWorld, RoundConfig, RoundController, RoundEvent, RoundState, ShapeId, StackPhysics,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no score is waiting for initials")]
    NoPrompt,
    #[error(transparent)]
    Initials(#[from] InitialsError),
}

pub struct Session<S: HighScoreStore> {
    config: GameConfig,
    round: RoundController,
    physics: StackPhysics,
    store: S,
    accumulator: f32,
    prompt_open: bool,
    /// Bumped on every reset so hosts can tell stale timers apart
    generation: u32,
    /// Routed events for the presentation layer
    notices: Vec<RoundEvent>,
}

impl<S: HighScoreStore> Session<S> {
    pub fn new(config: GameConfig, store: S, seed: u64) -> Self {
        let round_config = RoundConfig::from(&config);
        let round = RoundController::new(round_config, seed, store.load_high_score());
        let physics = StackPhysics::new(&round_config.field);
        log::info!("Session created with seed: {}", seed);
        Self {
            config,
            round,
            physics,
            store,
            accumulator: 0.0,
            prompt_open: false,
            generation: 0,
            notices: Vec::new(),
        }
    }

    /// Discard the round and start over in Idle
    pub fn reset(&mut self, seed: u64) {
        let round_config = RoundConfig::from(&self.config);
        self.round = RoundController::new(round_config, seed, self.store.load_high_score());
        self.physics = StackPhysics::new(&round_config.field);
        self.accumulator = 0.0;
        self.prompt_open = false;
        self.notices.clear();
        self.generation = self.generation.wrapping_add(1);
        log::info!("Session reset with seed: {}", seed);
    }

    /// New playfield size; the field is rebuilt from it on the next reset
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.config.viewport != viewport {
            log::info!("Viewport now {}x{}", viewport.width, viewport.height);
            self.config.viewport = viewport;
        }
    }

    /// Pointer down at `pos` (playfield coordinates)
    pub fn tap(&mut self, pos: Vec2) -> Option<ShapeId> {
        let id = self.round.request_spawn(pos);
        self.route_events();
        id
    }

    /// One 1 Hz timer tick
    pub fn tick(&mut self) {
        self.round.tick();
        self.route_events();
    }

    /// Advance physics by a frame's worth of time and report positions back
    pub fn update(&mut self, dt: f32) {
        self.accumulator += dt.min(0.1);

        let mut substeps = 0;
        while self.accumulator >= PHYSICS_DT && substeps < MAX_SUBSTEPS {
            self.physics.step(PHYSICS_DT);
            self.accumulator -= PHYSICS_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            self.accumulator = 0.0;
        }

        if substeps > 0 {
            self.round.sync_positions(self.physics.positions());
            self.route_events();
        }
    }

    fn route_events(&mut self) {
        for event in self.round.drain_events() {
            match &event {
                RoundEvent::ShapeSpawned { id, kind, pos } => self.physics.spawn(*id, *kind, *pos),
                RoundEvent::ShapeLeftBox(id) => self.physics.remove(*id),
                RoundEvent::FreezeShape(id) => self.physics.freeze(*id),
                RoundEvent::NewRecord { score } => self.store.save_high_score(*score),
                RoundEvent::PromptInitials => self.prompt_open = true,
                _ => {}
            }
            self.notices.push(event);
        }
    }

    /// Events since the last call, for sounds, badges and the like
    pub fn drain_notices(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.notices)
    }

    /// Turn the player's input into a leaderboard entry.
    ///
    /// Bad input leaves the prompt open; a good entry closes it.
    pub fn submit_initials(&mut self, raw: &str) -> Result<ScoreEntry, SessionError> {
        if !self.prompt_open {
            return Err(SessionError::NoPrompt);
        }
        let score = self.round.final_score().ok_or(SessionError::NoPrompt)?;
        let initials = Initials::parse(raw)?;
        self.prompt_open = false;
        Ok(ScoreEntry::new(&initials, score))
    }

    pub fn prompt_open(&self) -> bool {
        self.prompt_open
    }

    pub fn hud(&self) -> HudView {
        HudView::from_controller(&self.round)
    }

    pub fn state(&self) -> RoundState {
        self.round.state()
    }

    pub fn round(&self) -> &RoundController {
        &self.round
    }

    pub fn physics(&self) -> &StackPhysics {
        &self.physics
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}
