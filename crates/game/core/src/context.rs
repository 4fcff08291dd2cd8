//! Per-tick shared context handed to every agent update.
//!
//! The scene builds one [`TickContext`] per tick: read-only grid
//! views, a snapshot of the protagonist and of occupied cells, the
//! shared alert epoch, and the RNG. Agents push [`SceneEvent`]s into
//! it instead of mutating the scene directly; the scene drains and
//! applies them after the sweep. Updates are strictly sequential, so
//! none of this needs locking.

use std::collections::HashSet;

use crate::config::SimConfig;
use crate::grid::{Position, TileGrid, Vec2};
use crate::rng::RngOracle;

/// Monotonically increasing contact counter.
///
/// Raised whenever any pursuer makes contact with the protagonist.
/// Every pursuer remembers the last value it observed; a mismatch is
/// the signal to abandon whatever it is doing and retreat, which is
/// how one contact sends every pursuer fleeing without the agents
/// referencing each other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlertEpoch(u32);

impl AlertEpoch {
    pub fn value(self) -> u32 {
        self.0
    }

    pub fn raise(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// What an agent is allowed to know about the protagonist this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProtagonistView {
    /// World-space center position.
    pub position: Vec2,
    /// Invulnerable window after a hit; contact damage is skipped.
    pub stunned: bool,
    /// False when the protagonist has left the scene entirely.
    pub present: bool,
}

impl ProtagonistView {
    pub fn absent() -> Self {
        Self {
            position: Vec2::default(),
            stunned: false,
            present: false,
        }
    }
}

/// Read-only set of cells occupied by live entities, computed once
/// per tick. Random free-tile selection rejects against this instead
/// of scanning the scene's entity list per draw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OccupancySnapshot {
    cells: HashSet<Position>,
}

impl OccupancySnapshot {
    pub fn insert(&mut self, position: Position) {
        self.cells.insert(position);
    }

    pub fn contains(&self, position: Position) -> bool {
        self.cells.contains(&position)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl FromIterator<Position> for OccupancySnapshot {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl Extend<Position> for OccupancySnapshot {
    fn extend<I: IntoIterator<Item = Position>>(&mut self, iter: I) {
        self.cells.extend(iter);
    }
}

/// Source of a protagonist hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum HitCause {
    Pursuer,
    Vehicle,
    Explosion,
}

/// Effect an agent asks the scene to apply once the sweep finishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneEvent {
    /// Protagonist took contact or blast damage.
    ProtagonistHit { amount: u32, cause: HitCause },
    /// A pursuer made contact; the siren audio cue should play.
    SirenCue,
    /// The alert epoch advanced to `epoch`.
    AlertRaised { epoch: u32 },
    /// A vehicle drove over a pursuer; the agent was removed for good.
    PursuerRunOver { tile: Position },
}

/// Everything one agent update is allowed to see and emit.
pub struct TickContext<'a> {
    /// Collision view pursuers search and sample against.
    pub grid: &'a dyn TileGrid,
    /// Road view vehicles search against.
    pub road: &'a dyn TileGrid,
    /// All road tiles, cached once per grid, for random goal picks.
    pub road_tiles: &'a [Position],
    /// Protagonist snapshot. Mutable so the first contact of a tick
    /// flips `stunned` and gates the rest of the sweep, matching the
    /// invulnerability the scene applies when the event lands.
    pub protagonist: ProtagonistView,
    /// Cells occupied by live entities at tick start.
    pub occupancy: &'a OccupancySnapshot,
    /// Shared contact counter; bumps are visible to later agents in
    /// the same sweep.
    pub alert: &'a mut AlertEpoch,
    pub rng: &'a mut dyn RngOracle,
    pub config: &'a SimConfig,
    events: Vec<SceneEvent>,
}

impl<'a> TickContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        grid: &'a dyn TileGrid,
        road: &'a dyn TileGrid,
        road_tiles: &'a [Position],
        protagonist: ProtagonistView,
        occupancy: &'a OccupancySnapshot,
        alert: &'a mut AlertEpoch,
        rng: &'a mut dyn RngOracle,
        config: &'a SimConfig,
    ) -> Self {
        Self {
            grid,
            road,
            road_tiles,
            protagonist,
            occupancy,
            alert,
            rng,
            config,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: SceneEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Random walkable, unoccupied tile.
    ///
    /// Rejection sampling with a bounded number of draws; when every
    /// draw fails, an exhaustive row-major scan picks the first
    /// acceptable tile, and when even that fails the origin is the
    /// last resort so callers always get *some* tile back.
    pub fn random_free_tile(&mut self, exclude: Option<Position>) -> Position {
        let dims = self.grid.dimensions();
        if dims.area() == 0 {
            return Position::ORIGIN;
        }
        let attempts = (dims.area() as usize).max(16);
        for _ in 0..attempts {
            let candidate = Position::new(
                self.rng.range_u32(0, dims.width - 1) as i32,
                self.rng.range_u32(0, dims.height - 1) as i32,
            );
            if self.tile_is_free(candidate, exclude) {
                return candidate;
            }
        }
        for y in 0..dims.height as i32 {
            for x in 0..dims.width as i32 {
                let candidate = Position::new(x, y);
                if self.tile_is_free(candidate, exclude) {
                    return candidate;
                }
            }
        }
        Position::ORIGIN
    }

    fn tile_is_free(&self, position: Position, exclude: Option<Position>) -> bool {
        if exclude == Some(position) {
            return false;
        }
        self.grid.is_walkable(position) && !self.occupancy.contains(position)
    }

    /// Random road tile to drive toward, `None` on a road-less map.
    pub fn random_road_goal(&mut self) -> Option<Position> {
        let index = self.rng.pick_index(self.road_tiles.len())?;
        Some(self.road_tiles[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CollisionView, FlagGrid, RoadView};
    use crate::rng::PcgRng;

    fn context_parts(grid: &FlagGrid) -> (Vec<Position>, OccupancySnapshot) {
        (grid.road_tiles(), OccupancySnapshot::default())
    }

    #[test]
    fn alert_epoch_mismatch_after_raise() {
        let mut epoch = AlertEpoch::default();
        let seen = epoch.value();
        epoch.raise();
        assert_ne!(seen, epoch.value());
    }

    #[test]
    fn random_free_tile_avoids_blocked_and_occupied() {
        let grid = FlagGrid::parse(&["#.", ".."]).unwrap();
        let (road_tiles, mut occupancy) = context_parts(&grid);
        occupancy.insert(Position::new(1, 1));
        let collision = CollisionView::new(&grid, None);
        let road = RoadView::new(&grid);
        let mut alert = AlertEpoch::default();
        let mut rng = PcgRng::from_seed(5);
        let config = SimConfig::default();
        let mut ctx = TickContext::new(
            &collision,
            &road,
            &road_tiles,
            ProtagonistView::absent(),
            &occupancy,
            &mut alert,
            &mut rng,
            &config,
        );
        for _ in 0..32 {
            let tile = ctx.random_free_tile(None);
            assert_ne!(tile, Position::new(0, 1), "blocked tile drawn");
            assert_ne!(tile, Position::new(1, 1), "occupied tile drawn");
        }
    }

    #[test]
    fn random_free_tile_honors_exclusion() {
        let grid = FlagGrid::parse(&["##", "#."]).unwrap();
        let (road_tiles, occupancy) = context_parts(&grid);
        let collision = CollisionView::new(&grid, None);
        let road = RoadView::new(&grid);
        let mut alert = AlertEpoch::default();
        let mut rng = PcgRng::from_seed(9);
        let config = SimConfig::default();
        let mut ctx = TickContext::new(
            &collision,
            &road,
            &road_tiles,
            ProtagonistView::absent(),
            &occupancy,
            &mut alert,
            &mut rng,
            &config,
        );
        // The only free tile is excluded, so the origin fallback fires.
        assert_eq!(
            ctx.random_free_tile(Some(Position::new(1, 0))),
            Position::ORIGIN
        );
    }

    #[test]
    fn random_road_goal_requires_roads() {
        let grid = FlagGrid::parse(&["..", ".."]).unwrap();
        let (road_tiles, occupancy) = context_parts(&grid);
        let collision = CollisionView::new(&grid, None);
        let road = RoadView::new(&grid);
        let mut alert = AlertEpoch::default();
        let mut rng = PcgRng::from_seed(1);
        let config = SimConfig::default();
        let mut ctx = TickContext::new(
            &collision,
            &road,
            &road_tiles,
            ProtagonistView::absent(),
            &occupancy,
            &mut alert,
            &mut rng,
            &config,
        );
        assert_eq!(ctx.random_road_goal(), None);
    }
}
