//! Scene orchestration: owns the map, the protagonist, and every
//! autonomous agent, and advances them all by one frame at a time.
//!
//! Each tick runs in a fixed order: the protagonist's stun window
//! advances, pursuers decide and move, vehicles drive, crashes are
//! resolved, explosions burn down, and only then are the queued hit
//! events applied to the protagonist. Agents never touch the
//! protagonist directly; everything flows through
//! [`SceneEvent`](getaway_core::SceneEvent) records.

use getaway_core::{
    Aabb, AlertEpoch, CollisionView, FlagGrid, Footprint, HitCause, OccupancySnapshot, PcgRng,
    Position, ProtagonistView, Pursuer, RngOracle, RoadView, SceneEvent, SimConfig, TickContext,
    TileGrid, Vec2, Vehicle,
};
use tracing::{debug, trace, warn};

use crate::error::{Result, SceneError};

/// Protagonists occupy a single tile, like pursuers.
const PROTAGONIST_FOOTPRINT: Footprint = Footprint::new(1.0, 1.0);

const DEFAULT_PROTAGONIST_HEALTH: u32 = 100;

/// The player-controlled actor, as the scene tracks it. Movement
/// comes from outside via [`Scene::set_protagonist_position`]; the
/// scene owns health and the post-hit invulnerability window.
#[derive(Clone, Debug)]
pub struct Protagonist {
    position: Vec2,
    health: u32,
    stun_remaining: f32,
    present: bool,
}

impl Protagonist {
    fn at(position: Vec2, health: u32) -> Self {
        Self {
            position,
            health,
            stun_remaining: 0.0,
            present: true,
        }
    }

    fn absent() -> Self {
        Self {
            position: Vec2::new(0.0, 0.0),
            health: 0,
            stun_remaining: 0.0,
            present: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn is_stunned(&self) -> bool {
        self.stun_remaining > 0.0
    }

    pub fn present(&self) -> bool {
        self.present
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.position, PROTAGONIST_FOOTPRINT)
    }

    fn view(&self) -> ProtagonistView {
        ProtagonistView {
            position: self.position,
            stunned: self.is_stunned(),
            present: self.present,
        }
    }
}

/// A crash site: a burst at a fixed point that fades out on its own.
#[derive(Clone, Copy, Debug)]
pub struct Explosion {
    center: Vec2,
    radius: f32,
    remaining: f32,
}

impl Explosion {
    fn new(center: Vec2, radius: f32, lifetime: f32) -> Self {
        Self {
            center,
            radius,
            remaining: lifetime,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    fn advance(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining > 0.0
    }
}

/// Builder for [`Scene`]. Agent counts are population targets: the
/// scene keeps them topped up as vehicles crash and pursuers get run
/// over.
pub struct SceneBuilder {
    grid: FlagGrid,
    config: SimConfig,
    seed: Option<u64>,
    pursuers: usize,
    vehicles: usize,
    protagonist: Option<Vec2>,
    protagonist_health: u32,
    props: OccupancySnapshot,
}

impl SceneBuilder {
    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    /// Fixes the random seed; unseeded scenes draw one from the OS.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn pursuers(mut self, count: usize) -> Self {
        self.pursuers = count;
        self
    }

    pub fn vehicles(mut self, count: usize) -> Self {
        self.vehicles = count;
        self
    }

    pub fn protagonist_at(mut self, position: Vec2) -> Self {
        self.protagonist = Some(position);
        self
    }

    pub fn protagonist_health(mut self, health: u32) -> Self {
        self.protagonist_health = health;
        self
    }

    /// Marks a tile as occupied by a static prop. Props block agent
    /// spawn points but not pathfinding.
    pub fn prop(mut self, position: Position) -> Self {
        self.props.insert(position);
        self
    }

    pub fn build(self) -> Result<Scene> {
        let dims = self.grid.dimensions();
        let any_walkable = (0..dims.height as i32)
            .any(|y| (0..dims.width as i32).any(|x| self.grid.is_walkable(Position::new(x, y))));
        if !any_walkable {
            return Err(SceneError::NoWalkableTiles);
        }

        let road_tiles = self.grid.road_tiles();
        if self.vehicles > 0 && road_tiles.is_empty() {
            return Err(SceneError::NoRoadTiles);
        }

        let seed = self.seed.unwrap_or_else(rand::random);
        debug!(seed, "building scene");

        let protagonist = match self.protagonist {
            Some(position) => Protagonist::at(position, self.protagonist_health),
            None => Protagonist::absent(),
        };

        let mut scene = Scene {
            grid: self.grid,
            road_tiles,
            props: self.props,
            protagonist,
            pursuers: Vec::with_capacity(self.pursuers),
            vehicles: Vec::with_capacity(self.vehicles),
            explosions: Vec::new(),
            alert: AlertEpoch::default(),
            rng: PcgRng::from_seed(seed),
            config: self.config,
            vehicle_target: self.vehicles,
            events: Vec::new(),
        };

        for _ in 0..self.pursuers {
            let tile = scene.random_spawn_tile();
            scene.spawn_pursuer(tile.center());
        }
        scene.spawn_missing_vehicles();
        Ok(scene)
    }
}

/// One running simulation: map, protagonist, agents, and the shared
/// alert state.
pub struct Scene {
    grid: FlagGrid,
    road_tiles: Vec<Position>,
    props: OccupancySnapshot,
    protagonist: Protagonist,
    pursuers: Vec<Pursuer>,
    vehicles: Vec<Vehicle>,
    explosions: Vec<Explosion>,
    alert: AlertEpoch,
    rng: PcgRng,
    config: SimConfig,
    vehicle_target: usize,
    events: Vec<SceneEvent>,
}

impl Scene {
    pub fn builder(grid: FlagGrid) -> SceneBuilder {
        SceneBuilder {
            grid,
            config: SimConfig::default(),
            seed: None,
            pursuers: 0,
            vehicles: 0,
            protagonist: None,
            protagonist_health: DEFAULT_PROTAGONIST_HEALTH,
            props: OccupancySnapshot::default(),
        }
    }

    pub fn grid(&self) -> &FlagGrid {
        &self.grid
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn protagonist(&self) -> &Protagonist {
        &self.protagonist
    }

    pub fn pursuers(&self) -> &[Pursuer] {
        &self.pursuers
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    pub fn alert_epoch(&self) -> u32 {
        self.alert.value()
    }

    /// Moves the protagonist. The scene does not validate the
    /// position; player movement rules live with the caller.
    pub fn set_protagonist_position(&mut self, position: Vec2) {
        self.protagonist.position = position;
    }

    pub fn despawn_protagonist(&mut self) {
        self.protagonist.present = false;
    }

    /// Places an extra pursuer at an exact position.
    pub fn spawn_pursuer(&mut self, position: Vec2) {
        self.pursuers
            .push(Pursuer::new(position, self.alert.value()));
    }

    /// Places an extra vehicle at an exact position. The population
    /// target grows with it so crash replacements keep the new count.
    pub fn spawn_vehicle(&mut self, position: Vec2) {
        self.vehicles.push(Vehicle::new(position));
        self.vehicle_target = self.vehicle_target.max(self.vehicles.len());
    }

    /// Events queued since the last drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advances the whole scene by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.protagonist.stun_remaining = (self.protagonist.stun_remaining - dt).max(0.0);

        let first_new = self.events.len();
        self.sweep_pursuers(dt);
        self.sweep_vehicles(dt);
        self.explosions.retain_mut(|e| e.advance(dt));
        self.apply_hits(first_new);
    }

    /// Updates every pursuer and resolves protagonist contacts.
    fn sweep_pursuers(&mut self, dt: f32) {
        let mut pursuers = std::mem::take(&mut self.pursuers);
        let occupancy = self.occupancy_snapshot(&pursuers, &self.vehicles);
        let collision = CollisionView::new(&self.grid, Some(&self.props));
        let road = RoadView::new(&self.grid);
        let was_stunned = self.protagonist.is_stunned();
        let mut ctx = TickContext::new(
            &collision,
            &road,
            &self.road_tiles,
            self.protagonist.view(),
            &occupancy,
            &mut self.alert,
            &mut self.rng,
            &self.config,
        );

        for pursuer in &mut pursuers {
            pursuer.update(&mut ctx, dt);
            if ctx.protagonist.present && pursuer.bounds().overlaps(&self.protagonist.bounds()) {
                pursuer.contact(&mut ctx);
            }
        }

        let stunned_now = ctx.protagonist.stunned;
        let events = ctx.take_events();
        drop(ctx);
        self.pursuers = pursuers;
        if stunned_now && !was_stunned {
            self.protagonist.stun_remaining = self.config.stun_duration;
        }
        self.events.extend(events);
    }

    /// Resolves vehicle-vehicle crashes, then drives every surviving
    /// vehicle, resolves protagonist contacts, and removes run-over
    /// pursuers.
    fn sweep_vehicles(&mut self, dt: f32) {
        let mut vehicles = std::mem::take(&mut self.vehicles);
        let occupancy = self.occupancy_snapshot(&self.pursuers, &vehicles);
        let collision = CollisionView::new(&self.grid, Some(&self.props));
        let road = RoadView::new(&self.grid);
        let was_stunned = self.protagonist.is_stunned();
        let mut ctx = TickContext::new(
            &collision,
            &road,
            &self.road_tiles,
            self.protagonist.view(),
            &occupancy,
            &mut self.alert,
            &mut self.rng,
            &self.config,
        );

        // Crashes resolve before anything else moves: a vehicle that
        // wrecks this tick neither advances nor deals contact damage.
        let mut explosions = Vec::new();
        for i in 0..vehicles.len() {
            let (left, right) = vehicles.split_at_mut(i + 1);
            let a = &mut left[i];
            if a.pending_removal() {
                continue;
            }
            for b in right.iter_mut() {
                if b.pending_removal() || !a.overlaps(b) {
                    continue;
                }
                a.mark_for_removal();
                b.mark_for_removal();
                let center = Vec2::midpoint(a.position(), b.position());
                debug!(x = center.x, y = center.y, "vehicles crashed");
                explosions.push(Explosion::new(
                    center,
                    ctx.config.explosion_radius,
                    ctx.config.explosion_lifetime,
                ));
                if ctx.protagonist.present
                    && !ctx.protagonist.stunned
                    && center.distance(ctx.protagonist.position) <= ctx.config.explosion_radius
                {
                    ctx.emit(SceneEvent::ProtagonistHit {
                        amount: ctx.config.explosion_damage,
                        cause: HitCause::Explosion,
                    });
                    ctx.protagonist.stunned = true;
                }
                break;
            }
        }

        for vehicle in &mut vehicles {
            vehicle.update(&mut ctx, dt);
            if ctx.protagonist.present
                && !vehicle.pending_removal()
                && vehicle.bounds().overlaps(&self.protagonist.bounds())
            {
                vehicle.contact(&mut ctx);
            }
        }

        // Pursuers caught under a vehicle are gone for good; whoever
        // drives the scene decides if and where reinforcements arrive.
        let mut run_over = Vec::new();
        self.pursuers.retain(|p| {
            let hit = vehicles
                .iter()
                .any(|v| !v.pending_removal() && v.bounds().overlaps(&p.bounds()));
            if hit {
                run_over.push(p.tile());
            }
            !hit
        });
        for tile in run_over {
            debug!(x = tile.x, y = tile.y, "pursuer run over");
            ctx.emit(SceneEvent::PursuerRunOver { tile });
        }

        let stunned_now = ctx.protagonist.stunned;
        let events = ctx.take_events();
        drop(ctx);

        self.explosions.extend(explosions);
        vehicles.retain(|v| !v.pending_removal());
        self.vehicles = vehicles;
        // Crash replacements and any other shortfall refill from the
        // same population target.
        self.spawn_missing_vehicles();

        if stunned_now && !was_stunned {
            self.protagonist.stun_remaining = self.config.stun_duration;
        }
        self.events.extend(events);
    }

    /// Applies hit events queued at or after `from` to the protagonist.
    /// Older entries in the queue were already applied on an earlier
    /// tick and only wait for the next drain.
    fn apply_hits(&mut self, from: usize) {
        for event in &self.events[from..] {
            if let SceneEvent::ProtagonistHit { amount, cause } = event {
                trace!(amount, %cause, "protagonist hit");
                self.protagonist.health = self.protagonist.health.saturating_sub(*amount);
            }
        }
        if self.protagonist.present && self.protagonist.health == 0 {
            warn!("protagonist is down");
            self.protagonist.present = false;
        }
    }

    /// Tiles occupied by props and every live actor, used to keep
    /// random targets away from crowded cells.
    fn occupancy_snapshot(&self, pursuers: &[Pursuer], vehicles: &[Vehicle]) -> OccupancySnapshot {
        let mut occupancy = self.props.clone();
        occupancy.extend(pursuers.iter().map(|p| p.tile()));
        occupancy.extend(vehicles.iter().map(|v| v.position().tile()));
        if self.protagonist.present {
            occupancy.insert(self.protagonist.position.tile());
        }
        occupancy
    }

    /// Random walkable, unoccupied tile at least `spawn_min_distance`
    /// from the protagonist. Sampling degrades gracefully: distance is
    /// waived after the draw budget, then a row-major scan takes any
    /// free tile, then the origin.
    fn random_spawn_tile(&mut self) -> Position {
        let dims = self.grid.dimensions();
        let draws = (dims.area() as usize).max(16);
        let min_distance = self.config.spawn_min_distance;
        let anchor = self
            .protagonist
            .present
            .then(|| dims.tile_at(self.protagonist.position));

        for attempt in 0..draws {
            let x = self.rng.range_u32(0, dims.width.saturating_sub(1)) as i32;
            let y = self.rng.range_u32(0, dims.height.saturating_sub(1)) as i32;
            let tile = Position::new(x, y);
            if !self.grid.is_walkable(tile) || self.props.contains(tile) {
                continue;
            }
            let far_enough = match anchor {
                Some(a) => tile.chebyshev(a) >= min_distance,
                None => true,
            };
            // Waive the distance gate near the end of the budget so a
            // tiny map still yields a spawn point.
            if far_enough || attempt >= draws - 4 {
                return tile;
            }
        }
        for y in 0..dims.height as i32 {
            for x in 0..dims.width as i32 {
                let tile = Position::new(x, y);
                if self.grid.is_walkable(tile) && !self.props.contains(tile) {
                    return tile;
                }
            }
        }
        Position::new(0, 0)
    }

    /// Tops the vehicle population back up to its target on distinct
    /// road tiles.
    fn spawn_missing_vehicles(&mut self) {
        while self.vehicles.len() < self.vehicle_target {
            let Some(tile) = self.free_road_tile() else {
                warn!(
                    have = self.vehicles.len(),
                    want = self.vehicle_target,
                    "not enough free road tiles for the vehicle population"
                );
                return;
            };
            self.vehicles.push(Vehicle::new(tile.center()));
        }
    }

    /// A road tile no current vehicle is parked on, preferring tiles
    /// clear of the protagonist; the distance preference is waived
    /// when no tile satisfies it.
    fn free_road_tile(&mut self) -> Option<Position> {
        let occupied: Vec<Position> = self.vehicles.iter().map(|v| v.position().tile()).collect();
        let free: Vec<Position> = self
            .road_tiles
            .iter()
            .copied()
            .filter(|t| !occupied.contains(t))
            .collect();
        let anchor = self
            .protagonist
            .present
            .then(|| self.grid.dimensions().tile_at(self.protagonist.position));
        let clear: Vec<Position> = match anchor {
            Some(a) => free
                .iter()
                .copied()
                .filter(|t| t.chebyshev(a) >= self.config.spawn_min_distance)
                .collect(),
            None => free.clone(),
        };
        let pool = if clear.is_empty() { &free } else { &clear };
        let index = self.rng.pick_index(pool.len())?;
        Some(pool[index])
    }
}
