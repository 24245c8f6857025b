//! Round state machine
//!
//! A round runs Idle → Dropping → TimeUp → Locked. The controller never talks to
//! physics or the page directly: it queues [`RoundEvent`]s that the host drains
//! and applies, and it learns where shapes ended up through
//! [`RoundController::sync_positions`].

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::field::Field;
use super::shape::{Shape, ShapeId, ShapeKind};
use crate::config::GameConfig;
use crate::consts::{COUNTDOWN_SECS, GRACE_SECS};

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    /// Waiting for the first tap above the box
    Idle,
    /// Countdown running, taps drop shapes
    Dropping,
    /// Countdown over, shapes settle during the grace window
    TimeUp,
    /// Score is final, shapes are frozen
    Locked,
}

/// Commands and notifications for the host
#[derive(Debug, Clone, PartialEq)]
pub enum RoundEvent {
    /// First accepted tap; start the 1 Hz ticker
    TimerStarted,
    /// Add a body for this shape to the physics world
    ShapeSpawned { id: ShapeId, kind: ShapeKind, pos: Vec2 },
    /// Preview of the shape the next tap will drop
    NextKind(ShapeKind),
    /// Shape fell out of the box; its body can be removed
    ShapeLeftBox(ShapeId),
    /// Countdown seconds remaining
    CountdownTick(u32),
    /// Countdown hit zero; the grace window starts
    TimeUp,
    /// Grace seconds remaining
    GraceTick(u32),
    /// Make this shape's body static
    FreezeShape(ShapeId),
    /// Round over
    Locked { final_score: u32 },
    /// Final score beat the stored high score
    NewRecord { score: u32 },
    /// Ask the player for initials
    PromptInitials,
}

/// Round timings and geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub countdown_secs: u32,
    pub grace_secs: u32,
    pub field: Field,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            countdown_secs: COUNTDOWN_SECS,
            grace_secs: GRACE_SECS,
            field: Field::default(),
        }
    }
}

impl From<&GameConfig> for RoundConfig {
    fn from(config: &GameConfig) -> Self {
        Self {
            countdown_secs: config.countdown_secs,
            grace_secs: config.grace_secs,
            field: Field::from_viewport(config.viewport),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoundController {
    config: RoundConfig,
    seed: u64,
    rng: Pcg32,
    state: RoundState,
    countdown: u32,
    grace: u32,
    /// Live shapes, in spawn order
    shapes: Vec<Shape>,
    next_kind: ShapeKind,
    next_id: ShapeId,
    high_score: u32,
    final_score: Option<u32>,
    new_record: bool,
    events: Vec<RoundEvent>,
}

impl RoundController {
    /// Create a round in Idle. `high_score` is the stored best to beat.
    pub fn new(config: RoundConfig, seed: u64, high_score: u32) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let next_kind = ShapeKind::pick(&mut rng);
        Self {
            config,
            seed,
            rng,
            state: RoundState::Idle,
            countdown: config.countdown_secs,
            grace: config.grace_secs,
            shapes: Vec::new(),
            next_kind,
            next_id: 1,
            high_score,
            final_score: None,
            new_record: false,
            events: Vec::new(),
        }
    }

    /// Back to Idle with fresh timers, no shapes and a re-rolled next kind.
    /// The high score carries over.
    pub fn reset(&mut self, seed: u64) {
        *self = Self::new(self.config, seed, self.high_score);
    }

    /// Handle a tap. Returns the spawned shape's id, or None if the tap was ignored.
    pub fn request_spawn(&mut self, pos: Vec2) -> Option<ShapeId> {
        if !self.config.field.is_drop_zone(pos) {
            return None;
        }

        match self.state {
            RoundState::Idle => {
                self.state = RoundState::Dropping;
                self.events.push(RoundEvent::TimerStarted);
                log::debug!("Round started (seed {})", self.seed);
            }
            RoundState::Dropping => {}
            RoundState::TimeUp | RoundState::Locked => return None,
        }

        let id = self.next_id;
        self.next_id += 1;
        let kind = self.next_kind;
        let spawn = self.config.field.spawn_point(pos);
        self.shapes.push(Shape::new(id, kind, spawn));
        self.events.push(RoundEvent::ShapeSpawned {
            id,
            kind,
            pos: spawn,
        });

        self.next_kind = ShapeKind::pick(&mut self.rng);
        self.events.push(RoundEvent::NextKind(self.next_kind));

        Some(id)
    }

    /// Advance the active 1 Hz ticker. No-op in Idle and Locked.
    pub fn tick(&mut self) {
        match self.state {
            RoundState::Idle | RoundState::Locked => {}
            RoundState::Dropping => {
                self.countdown = self.countdown.saturating_sub(1);
                self.events.push(RoundEvent::CountdownTick(self.countdown));
                if self.countdown == 0 {
                    self.state = RoundState::TimeUp;
                    self.events.push(RoundEvent::TimeUp);
                    log::debug!("Time's up, {} shapes in box", self.shapes_in_box());
                }
            }
            RoundState::TimeUp => {
                self.grace = self.grace.saturating_sub(1);
                self.events.push(RoundEvent::GraceTick(self.grace));
                if self.grace == 0 {
                    self.finalize();
                }
            }
        }
    }

    /// Lock the round now: count, freeze, check the record.
    ///
    /// Acts from Dropping or TimeUp; a no-op in Idle (nothing was played) and
    /// once Locked.
    pub fn finalize(&mut self) {
        if !matches!(self.state, RoundState::Dropping | RoundState::TimeUp) {
            return;
        }

        let final_score = self.shapes_in_box();

        for shape in &mut self.shapes {
            shape.is_static = true;
            self.events.push(RoundEvent::FreezeShape(shape.id));
        }

        self.state = RoundState::Locked;
        self.final_score = Some(final_score);
        self.events.push(RoundEvent::Locked { final_score });

        if final_score > self.high_score {
            self.high_score = final_score;
            self.new_record = true;
            self.events.push(RoundEvent::NewRecord { score: final_score });
            self.events.push(RoundEvent::PromptInitials);
            log::info!("New record: {}", final_score);
        } else {
            log::info!("Round locked with {} (best {})", final_score, self.high_score);
        }
    }

    /// Apply positions reported by the physics world.
    ///
    /// Ignored unless shapes are still moving (Dropping/TimeUp). Shapes that have
    /// left the box are dropped from the round and reported via
    /// [`RoundEvent::ShapeLeftBox`]. Returns how many left.
    pub fn sync_positions<I>(&mut self, positions: I) -> usize
    where
        I: IntoIterator<Item = (ShapeId, Vec2)>,
    {
        if !matches!(self.state, RoundState::Dropping | RoundState::TimeUp) {
            return 0;
        }

        for (id, pos) in positions {
            if let Some(shape) = self.shapes.iter_mut().find(|s| s.id == id) {
                if !shape.is_static {
                    shape.pos = pos;
                }
            }
        }

        let field = self.config.field;
        let before = self.shapes.len();
        let events = &mut self.events;
        self.shapes.retain(|shape| {
            let keep = field.holds(shape.pos.y);
            if !keep {
                events.push(RoundEvent::ShapeLeftBox(shape.id));
            }
            keep
        });
        before - self.shapes.len()
    }

    /// Take the queued events
    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    /// Shapes currently inside the box
    pub fn shapes_in_box(&self) -> u32 {
        let field = &self.config.field;
        self.shapes.iter().filter(|s| field.holds(s.pos.y)).count() as u32
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    /// Main countdown seconds remaining
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Grace window seconds remaining
    pub fn grace_remaining(&self) -> u32 {
        self.grace
    }

    pub fn next_kind(&self) -> ShapeKind {
        self.next_kind
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Set once the round is Locked
    pub fn final_score(&self) -> Option<u32> {
        self.final_score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// This round set a new high score
    pub fn is_new_record(&self) -> bool {
        self.new_record
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn field(&self) -> &Field {
        &self.config.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn short_round(countdown_secs: u32, grace_secs: u32) -> RoundController {
        let config = RoundConfig {
            countdown_secs,
            grace_secs,
            ..Default::default()
        };
        RoundController::new(config, 12345, 0)
    }

    fn tap() -> Vec2 {
        Vec2::new(300.0, 10.0)
    }

    #[test]
    fn test_starts_idle_and_ticks_do_nothing() {
        let mut round = short_round(3, 2);
        assert_eq!(round.state(), RoundState::Idle);
        for _ in 0..10 {
            round.tick();
        }
        assert_eq!(round.state(), RoundState::Idle);
        assert_eq!(round.countdown(), 3);
        assert_eq!(round.grace_remaining(), 2);
        assert!(round.drain_events().is_empty());
    }

    #[test]
    fn test_tap_below_drop_zone_is_ignored() {
        let mut round = short_round(3, 2);
        let inside_box = Vec2::new(300.0, round.field().top + 10.0);
        assert_eq!(round.request_spawn(inside_box), None);
        assert_eq!(round.state(), RoundState::Idle);
        assert!(round.shapes().is_empty());
    }

    #[test]
    fn test_first_tap_starts_timer_once() {
        let mut round = short_round(5, 2);
        let first_next = round.next_kind();

        let id = round.request_spawn(tap()).unwrap();
        assert_eq!(round.state(), RoundState::Dropping);
        assert_eq!(round.shapes()[0].kind, first_next);
        assert_eq!(round.shapes()[0].id, id);

        round.request_spawn(tap()).unwrap();
        round.request_spawn(tap()).unwrap();

        let started = round
            .drain_events()
            .iter()
            .filter(|e| **e == RoundEvent::TimerStarted)
            .count();
        assert_eq!(started, 1);
        assert_eq!(round.shapes().len(), 3);
    }

    #[test]
    fn test_spawn_uses_preview_then_rolls_next() {
        let mut round = short_round(5, 2);
        for _ in 0..20 {
            let expected = round.next_kind();
            let id = round.request_spawn(tap()).unwrap();
            let shape = round.shapes().iter().find(|s| s.id == id).unwrap();
            assert_eq!(shape.kind, expected);
        }
        let events = round.drain_events();
        let previews = events
            .iter()
            .filter(|e| matches!(e, RoundEvent::NextKind(_)))
            .count();
        assert_eq!(previews, 20);
    }

    #[test]
    fn test_spawn_point_is_clamped_to_box_top() {
        let mut round = short_round(5, 2);
        round.request_spawn(Vec2::new(-50.0, 5.0)).unwrap();
        let field = *round.field();
        assert_eq!(round.shapes()[0].pos, Vec2::new(field.left, field.top));
    }

    #[test]
    fn test_no_spawns_after_time_up() {
        let mut round = short_round(1, 3);
        round.request_spawn(tap()).unwrap();
        round.tick();
        assert_eq!(round.state(), RoundState::TimeUp);
        assert_eq!(round.request_spawn(tap()), None);
        assert_eq!(round.shapes().len(), 1);
    }

    #[test]
    fn test_scenario_single_shape_stays() {
        let mut round = short_round(2, 1);
        let a = round.request_spawn(tap()).unwrap();
        assert_eq!(round.state(), RoundState::Dropping);

        round.tick();
        assert_eq!(round.countdown(), 1);
        assert_eq!(round.state(), RoundState::Dropping);
        round.tick();
        assert_eq!(round.countdown(), 0);
        assert_eq!(round.state(), RoundState::TimeUp);

        round.sync_positions([(a, Vec2::new(300.0, 500.0))]);
        round.tick();
        assert_eq!(round.grace_remaining(), 0);
        assert_eq!(round.state(), RoundState::Locked);
        assert_eq!(round.final_score(), Some(1));
    }

    #[test]
    fn test_scenario_single_shape_falls_out() {
        let mut round = short_round(2, 1);
        let a = round.request_spawn(tap()).unwrap();
        round.tick();
        round.tick();
        round.sync_positions([(a, Vec2::new(300.0, 900.0))]);
        round.tick();
        assert_eq!(round.state(), RoundState::Locked);
        assert_eq!(round.final_score(), Some(0));
    }

    #[test]
    fn test_only_remaining_shape_scores() {
        let mut round = short_round(2, 2);
        let a = round.request_spawn(tap()).unwrap();
        let b = round.request_spawn(tap()).unwrap();
        round.drain_events();

        let kill = round.field().kill_line;
        let left = round.sync_positions([
            (a, Vec2::new(200.0, 520.0)),
            (b, Vec2::new(750.0, kill + 1.0)),
        ]);
        assert_eq!(left, 1);
        assert_eq!(round.drain_events(), vec![RoundEvent::ShapeLeftBox(b)]);
        assert_eq!(round.shapes_in_box(), 1);

        for _ in 0..4 {
            round.tick();
        }
        assert_eq!(round.state(), RoundState::Locked);
        assert_eq!(round.final_score(), Some(1));
    }

    #[test]
    fn test_shape_exactly_on_kill_line_is_out() {
        let mut round = short_round(1, 1);
        let a = round.request_spawn(tap()).unwrap();
        let kill = round.field().kill_line;
        round.sync_positions([(a, Vec2::new(300.0, kill))]);
        round.tick();
        round.tick();
        assert_eq!(round.final_score(), Some(0));
    }

    #[test]
    fn test_locked_freezes_shapes() {
        let mut round = short_round(1, 1);
        let a = round.request_spawn(tap()).unwrap();
        round.sync_positions([(a, Vec2::new(300.0, 500.0))]);
        round.tick();
        round.tick();
        assert_eq!(round.state(), RoundState::Locked);
        assert!(round.shapes().iter().all(|s| s.is_static));

        let events = round.drain_events();
        assert!(events.contains(&RoundEvent::FreezeShape(a)));

        // Positions no longer move, score stays put
        assert_eq!(round.sync_positions([(a, Vec2::new(300.0, 9999.0))]), 0);
        assert_eq!(round.shapes()[0].pos, Vec2::new(300.0, 500.0));
        assert_eq!(round.final_score(), Some(1));
    }

    #[test]
    fn test_lock_event_order() {
        let mut round = short_round(1, 1);
        let a = round.request_spawn(tap()).unwrap();
        round.tick();
        round.drain_events();
        round.tick();
        assert_eq!(
            round.drain_events(),
            vec![
                RoundEvent::GraceTick(0),
                RoundEvent::FreezeShape(a),
                RoundEvent::Locked { final_score: 1 },
                RoundEvent::NewRecord { score: 1 },
                RoundEvent::PromptInitials,
            ]
        );
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut round = short_round(1, 1);
        round.request_spawn(tap()).unwrap();
        round.tick();
        round.tick();
        round.drain_events();

        round.finalize();
        round.finalize();
        round.tick();
        assert!(round.drain_events().is_empty());
        assert_eq!(round.final_score(), Some(1));
        assert_eq!(round.high_score(), 1);
    }

    #[test]
    fn test_finalize_in_idle_is_noop() {
        let mut round = short_round(1, 1);
        round.finalize();
        assert_eq!(round.state(), RoundState::Idle);
        assert_eq!(round.final_score(), None);
    }

    #[test]
    fn test_no_record_when_not_beaten() {
        let config = RoundConfig {
            countdown_secs: 1,
            grace_secs: 1,
            ..Default::default()
        };
        let mut round = RoundController::new(config, 1, 2);
        round.request_spawn(tap()).unwrap();
        round.request_spawn(tap()).unwrap();
        round.tick();
        round.tick();

        assert_eq!(round.final_score(), Some(2));
        assert_eq!(round.high_score(), 2);
        assert!(!round.is_new_record());
        let events = round.drain_events();
        assert!(!events.contains(&RoundEvent::PromptInitials));
        assert!(!events.iter().any(|e| matches!(e, RoundEvent::NewRecord { .. })));
    }

    #[test]
    fn test_record_when_beaten() {
        let config = RoundConfig {
            countdown_secs: 1,
            grace_secs: 1,
            ..Default::default()
        };
        let mut round = RoundController::new(config, 1, 1);
        round.request_spawn(tap()).unwrap();
        round.request_spawn(tap()).unwrap();
        round.tick();
        round.tick();

        assert!(round.is_new_record());
        assert_eq!(round.high_score(), 2);
        let events = round.drain_events();
        let records = events
            .iter()
            .filter(|e| matches!(e, RoundEvent::NewRecord { .. }))
            .count();
        assert_eq!(records, 1);
        assert!(events.contains(&RoundEvent::PromptInitials));
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut round = short_round(2, 2);
        round.request_spawn(tap()).unwrap();
        round.tick();
        round.tick();
        round.tick();
        round.tick();
        assert_eq!(round.state(), RoundState::Locked);

        round.reset(777);
        assert_eq!(round.state(), RoundState::Idle);
        assert_eq!(round.countdown(), 2);
        assert_eq!(round.grace_remaining(), 2);
        assert!(round.shapes().is_empty());
        assert_eq!(round.final_score(), None);
        assert_eq!(round.seed(), 777);
        assert_eq!(round.high_score(), 1);
        assert!(round.drain_events().is_empty());
    }

    #[test]
    fn test_determinism() {
        let mut a = short_round(5, 5);
        let mut b = short_round(5, 5);
        for _ in 0..10 {
            a.request_spawn(tap());
            b.request_spawn(tap());
        }
        let kinds_a: Vec<_> = a.shapes().iter().map(|s| s.kind).collect();
        let kinds_b: Vec<_> = b.shapes().iter().map(|s| s.kind).collect();
        assert_eq!(kinds_a, kinds_b);
        assert_eq!(a.next_kind(), b.next_kind());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Tap(f32, f32),
        Tick,
        Move(u32, f32),
        Finalize,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.0f32..800.0, 0.0f32..600.0).prop_map(|(x, y)| Op::Tap(x, y)),
            Just(Op::Tick),
            (1u32..8, 0.0f32..900.0).prop_map(|(id, y)| Op::Move(id, y)),
            Just(Op::Finalize),
        ]
    }

    proptest! {
        #[test]
        fn prop_timers_never_increase(ops in prop::collection::vec(op(), 0..200)) {
            let mut round = short_round(4, 3);
            let mut countdown = round.countdown();
            let mut grace = round.grace_remaining();
            let mut started = 0;

            for op in ops {
                match op {
                    Op::Tap(x, y) => { round.request_spawn(Vec2::new(x, y)); }
                    Op::Tick => round.tick(),
                    Op::Move(id, y) => { round.sync_positions([(id, Vec2::new(300.0, y))]); }
                    Op::Finalize => round.finalize(),
                }
                prop_assert!(round.countdown() <= countdown);
                prop_assert!(round.grace_remaining() <= grace);
                countdown = round.countdown();
                grace = round.grace_remaining();

                started += round
                    .drain_events()
                    .iter()
                    .filter(|e| **e == RoundEvent::TimerStarted)
                    .count();
                prop_assert!(started <= 1);
            }
        }

        #[test]
        fn prop_final_score_counts_shapes_in_box(ys in prop::collection::vec(0.0f32..900.0, 1..8)) {
            let mut round = short_round(1, 1);
            let ids: Vec<_> = ys.iter().filter_map(|_| round.request_spawn(tap())).collect();
            let kill = round.field().kill_line;
            round.sync_positions(ids.iter().copied().zip(ys.iter().map(|&y| Vec2::new(300.0, y))));
            round.tick();
            round.tick();
            let expected = ys.iter().filter(|&&y| y < kill).count() as u32;
            prop_assert_eq!(round.final_score(), Some(expected));
        }
    }
}
