//! Pursuing agent: a pursue / patrol / retreat state machine over the
//! collision grid.
//!
//! One pursuer owns its world position, its current path, and a
//! tagged-union behavior state; the wait phases and targets live
//! inside the state variants so a "patrolling without a target"
//! combination cannot be expressed. Cross-agent coordination happens
//! only through the shared [`AlertEpoch`](crate::context::AlertEpoch):
//! contact anywhere bumps the epoch, and every pursuer that sees a
//! value it has not observed yet breaks off into retreat.

use crate::context::{HitCause, SceneEvent, TickContext};
use crate::grid::{Position, TileGrid, Vec2};
use crate::nav::{self, Path};

use super::{Aabb, Footprint, Steer, steer_toward};

/// Pursuers occupy a single tile.
const FOOTPRINT: Footprint = Footprint::new(1.0, 1.0);

/// Countdown spent standing at a patrol or retreat tile.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WaitTimer {
    elapsed: f32,
    duration: f32,
}

impl WaitTimer {
    pub fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration,
        }
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Advances the timer; true once the full duration has elapsed.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        self.elapsed >= self.duration
    }
}

/// Behavior state of a pursuer.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PursuerState {
    /// Chasing the protagonist's current tile.
    Pursuing,
    /// Wandering to a random free tile, pausing between legs.
    Patrolling {
        target: Position,
        wait: Option<WaitTimer>,
    },
    /// Fleeing to a random free tile after contact or an alert.
    Retreating {
        target: Position,
        wait: Option<WaitTimer>,
    },
}

impl PursuerState {
    pub fn kind(&self) -> PursuerStateKind {
        match self {
            Self::Pursuing => PursuerStateKind::Pursuing,
            Self::Patrolling { .. } => PursuerStateKind::Patrolling,
            Self::Retreating { .. } => PursuerStateKind::Retreating,
        }
    }

    pub fn is_retreating(&self) -> bool {
        matches!(self, Self::Retreating { .. })
    }

    /// True while standing out a patrol or retreat wait.
    pub fn is_waiting(&self) -> bool {
        matches!(
            self,
            Self::Patrolling { wait: Some(_), .. } | Self::Retreating { wait: Some(_), .. }
        )
    }
}

/// Discriminant of [`PursuerState`], convenient for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum PursuerStateKind {
    Pursuing,
    Patrolling,
    Retreating,
}

/// One pursuing agent.
#[derive(Clone, Debug)]
pub struct Pursuer {
    position: Vec2,
    state: PursuerState,
    path: Path,
    cursor: usize,
    recalc_cooldown: f32,
    /// Goal of the last computed path; a differing goal forces a
    /// replan even inside the cooldown window.
    last_goal: Option<Position>,
    /// Alert epoch this agent has acknowledged.
    seen_epoch: u32,
    /// Seconds since the protagonist was last in sight while pursuing.
    lost_sight: f32,
    /// Total seconds spent in the current retreat, wait included.
    retreat_elapsed: f32,
    sprinting: bool,
    sprint_elapsed: f32,
}

impl Pursuer {
    /// Creates a pursuer at a world position. `seen_epoch` seeds the
    /// local alert bookmark so a freshly spawned agent does not react
    /// to contacts that happened before it existed.
    pub fn new(position: Vec2, seen_epoch: u32) -> Self {
        Self {
            position,
            state: PursuerState::Pursuing,
            path: Path::new(),
            cursor: 0,
            recalc_cooldown: 0.0,
            last_goal: None,
            seen_epoch,
            lost_sight: 0.0,
            retreat_elapsed: 0.0,
            sprinting: false,
            sprint_elapsed: 0.0,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn tile(&self) -> Position {
        self.position.tile()
    }

    pub fn state(&self) -> &PursuerState {
        &self.state
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, FOOTPRINT)
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    /// Per-frame decision and movement step.
    pub fn update(&mut self, ctx: &mut TickContext<'_>, dt: f32) {
        // A contact anywhere in the scene retreats every pursuer that
        // is not already doing so.
        if self.seen_epoch != ctx.alert.value() {
            self.seen_epoch = ctx.alert.value();
            if !self.state.is_retreating() {
                self.enter_retreating(ctx);
            }
        }

        // Retreats are capped in total, wait phase included.
        if self.state.is_retreating() {
            self.retreat_elapsed += dt;
            if self.retreat_elapsed >= ctx.config.retreat_max_duration {
                self.enter_patrolling(ctx);
                return;
            }
        }

        if let Some(finished) = self.advance_wait(dt) {
            if finished {
                self.enter_patrolling(ctx);
            }
            return;
        }

        match self.state.kind() {
            PursuerStateKind::Patrolling => {
                if self.can_see_protagonist(ctx) {
                    self.enter_pursuing();
                } else if self.leg_complete(ctx.config.center_eps) {
                    self.begin_patrol_wait(ctx);
                    return;
                }
            }
            PursuerStateKind::Pursuing => {
                if self.can_see_protagonist(ctx) {
                    self.lost_sight = 0.0;
                    if !self.sprinting {
                        self.sprinting = true;
                        self.sprint_elapsed = 0.0;
                    }
                } else {
                    self.lost_sight += dt;
                    if self.lost_sight >= ctx.config.lost_sight_give_up {
                        self.enter_retreating(ctx);
                        return;
                    }
                }
            }
            PursuerStateKind::Retreating => {
                if self.leg_complete(ctx.config.center_eps) {
                    self.begin_retreat_wait(ctx);
                    return;
                }
            }
        }

        self.replan_if_due(ctx, dt);
        self.follow_path(ctx, dt);
    }

    /// Invoked by the scene when this pursuer overlaps the
    /// protagonist. Applies the damage contract and triggers the
    /// global retreat.
    pub fn contact(&mut self, ctx: &mut TickContext<'_>) {
        if !ctx.protagonist.present || ctx.protagonist.stunned || self.state.is_retreating() {
            return;
        }
        ctx.emit(SceneEvent::SirenCue);
        ctx.emit(SceneEvent::ProtagonistHit {
            amount: ctx.config.pursuer_damage,
            cause: HitCause::Pursuer,
        });
        ctx.alert.raise();
        ctx.emit(SceneEvent::AlertRaised {
            epoch: ctx.alert.value(),
        });
        // The hit starts the invulnerability window immediately so a
        // second overlap in the same sweep cannot damage again.
        ctx.protagonist.stunned = true;
        self.seen_epoch = ctx.alert.value();
        self.enter_retreating(ctx);
    }

    /// Chebyshev range gate plus a Bresenham line walk across the
    /// collision grid; any blocked tile past the start breaks sight.
    fn can_see_protagonist(&self, ctx: &TickContext<'_>) -> bool {
        if !ctx.protagonist.present {
            return false;
        }
        let dims = ctx.grid.dimensions();
        let start = dims.tile_at(self.position);
        let goal = dims.tile_at(ctx.protagonist.position);
        if start.chebyshev(goal) > ctx.config.vision_range_tiles.max(1) {
            return false;
        }

        let dx = (goal.x - start.x).abs();
        let dy = (goal.y - start.y).abs();
        let sx = if start.x < goal.x { 1 } else { -1 };
        let sy = if start.y < goal.y { 1 } else { -1 };
        let mut err = dx - dy;
        let mut current = start;

        loop {
            if current != start && ctx.grid.is_blocked(current) {
                return false;
            }
            if current == goal {
                return true;
            }
            let doubled = 2 * err;
            if doubled > -dy {
                err -= dy;
                current.x += sx;
            }
            if doubled < dx {
                err += dx;
                current.y += sy;
            }
        }
    }

    /// True when a non-empty path has been fully consumed and the
    /// agent sits centered on its tile.
    fn leg_complete(&mut self, center_eps: f32) -> bool {
        !self.path.is_empty() && self.cursor >= self.path.len() && self.centered(center_eps)
    }

    /// Centered check with snap: within epsilon on both axes counts,
    /// and the position is pinned to the exact center so the error
    /// cannot accumulate across frames.
    fn centered(&mut self, eps: f32) -> bool {
        let target = self.tile().center();
        if (target.x - self.position.x).abs() < eps && (target.y - self.position.y).abs() < eps {
            self.position = target;
            true
        } else {
            false
        }
    }

    fn current_goal(&self, ctx: &TickContext<'_>) -> Option<Position> {
        let dims = ctx.grid.dimensions();
        match &self.state {
            PursuerState::Pursuing => ctx
                .protagonist
                .present
                .then(|| dims.tile_at(ctx.protagonist.position)),
            PursuerState::Patrolling { target, .. } | PursuerState::Retreating { target, .. } => {
                Some(dims.clamp(*target))
            }
        }
    }

    /// Replans at most once per cooldown interval, only while
    /// centered on a tile, and only when the path ran out or the goal
    /// tile moved.
    fn replan_if_due(&mut self, ctx: &mut TickContext<'_>, dt: f32) {
        self.recalc_cooldown -= dt;
        if self.recalc_cooldown > 0.0 || !self.centered(ctx.config.center_eps) {
            return;
        }
        let Some(goal) = self.current_goal(ctx) else {
            return;
        };
        let exhausted = self.cursor >= self.path.len();
        if self.path.is_empty() || exhausted || self.last_goal != Some(goal) {
            let start = ctx.grid.dimensions().tile_at(self.position);
            self.path = nav::find_path(ctx.grid, start, goal);
            self.cursor = 0;
            self.last_goal = Some(goal);
            self.recalc_cooldown = ctx.config.path_recalc_interval;
        }
    }

    fn follow_path(&mut self, ctx: &TickContext<'_>, dt: f32) {
        if self.sprinting {
            self.sprint_elapsed += dt;
            if self.sprint_elapsed >= ctx.config.sprint_duration {
                self.sprinting = false;
                self.sprint_elapsed = 0.0;
            }
        }
        let config = ctx.config;

        if self.cursor >= self.path.len() {
            // No waypoint left: settle onto the current tile center so
            // a path never ends with the agent straddling a boundary.
            let target = self.tile().center();
            if let Steer::Arrived =
                steer_toward(&mut self.position, target, config.pursuer_speed * dt, config.target_eps)
            {
                self.position = target;
            }
            return;
        }

        let target = self.path[self.cursor].center();
        let mut scale = match self.state.kind() {
            PursuerStateKind::Pursuing => 1.0,
            _ => config.patrol_speed_scale,
        };
        if self.sprinting && self.state.kind() == PursuerStateKind::Pursuing {
            scale *= config.sprint_multiplier;
        }
        let max_step = config.pursuer_speed * scale * dt;
        if let Steer::Arrived = steer_toward(&mut self.position, target, max_step, config.target_eps)
        {
            self.cursor += 1;
        }
    }

    /// Wait-phase tick; `Some(finished)` while a wait is active.
    fn advance_wait(&mut self, dt: f32) -> Option<bool> {
        match &mut self.state {
            PursuerState::Patrolling { wait: Some(w), .. }
            | PursuerState::Retreating { wait: Some(w), .. } => Some(w.advance(dt)),
            _ => None,
        }
    }

    fn enter_retreating(&mut self, ctx: &mut TickContext<'_>) {
        let target = ctx.random_free_tile(Some(self.tile()));
        self.state = PursuerState::Retreating { target, wait: None };
        self.retreat_elapsed = 0.0;
        self.lost_sight = 0.0;
        self.stop_sprinting();
        self.reset_pathing();
    }

    fn enter_patrolling(&mut self, ctx: &mut TickContext<'_>) {
        let target = ctx.random_free_tile(None);
        self.state = PursuerState::Patrolling { target, wait: None };
        self.retreat_elapsed = 0.0;
        self.lost_sight = 0.0;
        self.stop_sprinting();
        self.reset_pathing();
    }

    fn enter_pursuing(&mut self) {
        self.state = PursuerState::Pursuing;
        self.retreat_elapsed = 0.0;
        self.lost_sight = 0.0;
        self.reset_pathing();
    }

    fn begin_patrol_wait(&mut self, ctx: &mut TickContext<'_>) {
        let duration = ctx
            .rng
            .range_f32(ctx.config.patrol_wait_min, ctx.config.patrol_wait_max);
        if let PursuerState::Patrolling { wait, .. } = &mut self.state {
            *wait = Some(WaitTimer::new(duration));
        }
        self.stop_sprinting();
        self.recalc_cooldown = 0.0;
    }

    fn begin_retreat_wait(&mut self, ctx: &TickContext<'_>) {
        let duration = ctx.config.retreat_wait;
        if let PursuerState::Retreating { wait, .. } = &mut self.state {
            *wait = Some(WaitTimer::new(duration));
        }
        self.stop_sprinting();
        self.recalc_cooldown = 0.0;
    }

    fn stop_sprinting(&mut self) {
        self.sprinting = false;
        self.sprint_elapsed = 0.0;
    }

    fn reset_pathing(&mut self) {
        self.path.clear();
        self.cursor = 0;
        self.recalc_cooldown = 0.0;
        self.last_goal = None;
    }
}
