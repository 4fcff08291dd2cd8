//! Road vehicle: drives between random road tiles, reorienting its
//! footprint to the travel axis, and flattens the protagonist on
//! overlap. Vehicle-vehicle crashes are resolved by the scene; this
//! module only exposes the overlap test and the removal flag.

use crate::context::{HitCause, SceneEvent, TickContext};
use crate::grid::{Position, TileGrid, Vec2};
use crate::nav::{self, Path};

use super::{Aabb, Footprint, Steer, steer_toward};

/// Footprint while driving along the x axis.
const HORIZONTAL: Footprint = Footprint::new(2.0, 1.0);
/// Footprint while driving along the y axis.
const VERTICAL: Footprint = Footprint::new(1.0, 2.0);

/// One road-bound vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    position: Vec2,
    footprint: Footprint,
    path: Path,
    cursor: usize,
    pending_removal: bool,
}

impl Vehicle {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            footprint: HORIZONTAL,
            path: Path::new(),
            cursor: 0,
            pending_removal: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, self.footprint)
    }

    pub fn overlaps(&self, other: &Vehicle) -> bool {
        self.bounds().overlaps(&other.bounds())
    }

    /// Marks this vehicle for removal at the end of the tick. The
    /// scene uses pending vehicles only as crash sites; they no longer
    /// move or deal damage.
    pub fn mark_for_removal(&mut self) {
        self.pending_removal = true;
    }

    pub fn pending_removal(&self) -> bool {
        self.pending_removal
    }

    pub fn update(&mut self, ctx: &mut TickContext<'_>, dt: f32) {
        if self.pending_removal || ctx.road_tiles.is_empty() {
            return;
        }
        if (self.path.is_empty() || self.cursor >= self.path.len())
            && self.centered(ctx.config.center_eps)
        {
            self.replan(ctx);
        }
        self.follow_path(ctx, dt);
    }

    /// Invoked by the scene when this vehicle overlaps the
    /// protagonist.
    pub fn contact(&mut self, ctx: &mut TickContext<'_>) {
        if !ctx.protagonist.present || ctx.protagonist.stunned || self.pending_removal {
            return;
        }
        ctx.emit(SceneEvent::ProtagonistHit {
            amount: ctx.config.vehicle_damage,
            cause: HitCause::Vehicle,
        });
        ctx.protagonist.stunned = true;
    }

    /// Picks a fresh random road goal and routes to it over the road
    /// network. An unreachable goal leaves an empty path, which simply
    /// retries on a later tick.
    fn replan(&mut self, ctx: &mut TickContext<'_>) {
        let Some(goal) = ctx.random_road_goal() else {
            return;
        };
        let start = ctx.road.dimensions().tile_at(self.position);
        self.path = nav::find_path(ctx.road, start, goal);
        self.cursor = 0;
    }

    fn follow_path(&mut self, ctx: &TickContext<'_>, dt: f32) {
        let config = ctx.config;
        if self.cursor >= self.path.len() {
            let target = self.position.tile().center();
            if let Steer::Arrived =
                steer_toward(&mut self.position, target, config.vehicle_speed * dt, config.target_eps)
            {
                self.position = target;
            }
            return;
        }
        let target = self.path[self.cursor].center();
        self.orient_toward(target);
        let max_step = config.vehicle_speed * dt;
        if let Steer::Arrived = steer_toward(&mut self.position, target, max_step, config.target_eps)
        {
            self.cursor += 1;
        }
    }

    /// Aligns the footprint with the dominant travel axis. The center
    /// stays fixed, so reorienting never moves the vehicle.
    fn orient_toward(&mut self, target: Vec2) {
        let dx = target.x - self.position.x;
        let dy = target.y - self.position.y;
        if dy.abs() > dx.abs() && dy.abs() > 0.0 {
            self.footprint = VERTICAL;
        } else if dx.abs() > 0.0 {
            self.footprint = HORIZONTAL;
        }
    }

    fn centered(&mut self, eps: f32) -> bool {
        let target = self.position.tile().center();
        if (target.x - self.position.x).abs() < eps && (target.y - self.position.y).abs() < eps {
            self.position = target;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::context::{AlertEpoch, OccupancySnapshot, ProtagonistView};
    use crate::grid::{CollisionView, FlagGrid, RoadView};
    use crate::rng::PcgRng;

    struct World {
        grid: FlagGrid,
        road_tiles: Vec<Position>,
        occupancy: OccupancySnapshot,
        alert: AlertEpoch,
        rng: PcgRng,
        config: SimConfig,
    }

    impl World {
        fn from_sketch(rows: &[&str]) -> Self {
            let grid = FlagGrid::parse(rows).unwrap();
            let road_tiles = grid.road_tiles();
            Self {
                grid,
                road_tiles,
                occupancy: OccupancySnapshot::default(),
                alert: AlertEpoch::default(),
                rng: PcgRng::from_seed(7),
                config: SimConfig::default(),
            }
        }

        fn with_ctx<R>(
            &mut self,
            protagonist: ProtagonistView,
            f: impl FnOnce(&mut TickContext<'_>) -> R,
        ) -> R {
            let collision = CollisionView::new(&self.grid, None);
            let road = RoadView::new(&self.grid);
            let mut ctx = TickContext::new(
                &collision,
                &road,
                &self.road_tiles,
                protagonist,
                &self.occupancy,
                &mut self.alert,
                &mut self.rng,
                &self.config,
            );
            f(&mut ctx)
        }
    }

    #[test]
    fn stays_on_road_tiles_while_driving() {
        let mut world = World::from_sketch(&[
            "rrrrr", //
            "....r", //
            "....r",
        ]);
        let mut vehicle = Vehicle::new(Vec2::new(0.5, 2.5));
        for _ in 0..200 {
            world.with_ctx(ProtagonistView::absent(), |ctx| vehicle.update(ctx, 0.02));
            let tile = vehicle.position().tile();
            assert!(
                world.grid.flags(tile).contains(crate::grid::TileFlags::ROAD),
                "vehicle left the road at {tile:?}"
            );
        }
    }

    #[test]
    fn footprint_follows_travel_axis() {
        let mut vehicle = Vehicle::new(Vec2::new(0.5, 0.5));
        vehicle.orient_toward(Vec2::new(0.5, 3.5));
        assert_eq!(vehicle.bounds().width, 1.0);
        assert_eq!(vehicle.bounds().height, 2.0);
        vehicle.orient_toward(Vec2::new(4.5, 0.5));
        assert_eq!(vehicle.bounds().width, 2.0);
        assert_eq!(vehicle.bounds().height, 1.0);
    }

    #[test]
    fn reorienting_keeps_the_center_fixed() {
        let mut vehicle = Vehicle::new(Vec2::new(2.5, 2.5));
        vehicle.orient_toward(Vec2::new(2.5, 5.5));
        assert_eq!(vehicle.position(), Vec2::new(2.5, 2.5));
    }

    #[test]
    fn contact_applies_vehicle_damage_once() {
        let mut world = World::from_sketch(&["rrr"]);
        let mut vehicle = Vehicle::new(Vec2::new(1.5, 0.5));
        let view = ProtagonistView {
            position: Vec2::new(1.5, 0.5),
            stunned: false,
            present: true,
        };
        let events = world.with_ctx(view, |ctx| {
            vehicle.contact(ctx);
            vehicle.contact(ctx);
            ctx.take_events()
        });
        assert_eq!(
            events,
            vec![SceneEvent::ProtagonistHit {
                amount: world.config.vehicle_damage,
                cause: HitCause::Vehicle,
            }]
        );
    }

    #[test]
    fn pending_vehicles_neither_move_nor_damage() {
        let mut world = World::from_sketch(&["rrrrr"]);
        let mut vehicle = Vehicle::new(Vec2::new(0.5, 0.5));
        vehicle.mark_for_removal();
        let view = ProtagonistView {
            position: Vec2::new(0.5, 0.5),
            stunned: false,
            present: true,
        };
        let events = world.with_ctx(view, |ctx| {
            vehicle.update(ctx, 0.1);
            vehicle.contact(ctx);
            ctx.take_events()
        });
        assert!(events.is_empty());
        assert_eq!(vehicle.position(), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn overlap_uses_oriented_bounds() {
        let a = Vehicle::new(Vec2::new(1.0, 0.5));
        let b = Vehicle::new(Vec2::new(2.5, 0.5));
        // Horizontal 2x1 boxes centered 1.5 apart overlap by half a tile.
        assert!(a.overlaps(&b));
        let c = Vehicle::new(Vec2::new(3.5, 0.5));
        assert!(!a.overlaps(&c));
    }
}
