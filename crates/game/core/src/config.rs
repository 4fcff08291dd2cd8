//! Tunable simulation parameters.
//!
//! Every timing, speed, and threshold the agents use lives here so
//! scenarios and tests can tune behavior without touching agent code.
//! The defaults are the values the gameplay was balanced around; none
//! of them carries deeper meaning than "this felt right".

/// Simulation configuration shared by all agents for one scene.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Minimum seconds between path recalculations.
    pub path_recalc_interval: f32,
    /// Distance at which a path waypoint counts as reached.
    pub target_eps: f32,
    /// Per-axis distance at which an agent counts as centered on its
    /// tile; on detection the agent snaps exactly to the center so
    /// the error cannot accumulate.
    pub center_eps: f32,

    /// Pursuer base speed in tiles per second.
    pub pursuer_speed: f32,
    /// Speed scale applied while patrolling or retreating.
    pub patrol_speed_scale: f32,
    /// Sprint speed multiplier applied while pursuing with sight.
    pub sprint_multiplier: f32,
    /// Seconds a sprint lasts before the pursuer tires.
    pub sprint_duration: f32,
    /// Vision range in tiles (Chebyshev) for spotting the protagonist.
    pub vision_range_tiles: u32,
    /// Seconds without line of sight before a pursuer gives up.
    pub lost_sight_give_up: f32,
    /// Hard cap on one retreat, movement and wait combined.
    pub retreat_max_duration: f32,
    /// Seconds a pursuer waits at its retreat tile.
    pub retreat_wait: f32,
    /// Wait range at a patrol point; actual duration is drawn
    /// uniformly from `[patrol_wait_min, patrol_wait_max]`.
    pub patrol_wait_min: f32,
    pub patrol_wait_max: f32,
    /// Damage dealt by a pursuer on contact.
    pub pursuer_damage: u32,

    /// Vehicle speed in tiles per second.
    pub vehicle_speed: f32,
    /// Damage dealt by a vehicle on contact. Lethal by default.
    pub vehicle_damage: u32,
    /// Blast radius of a vehicle collision, in world units.
    pub explosion_radius: f32,
    /// Seconds an explosion effect lingers in the scene.
    pub explosion_lifetime: f32,
    /// Damage dealt by an explosion within its radius.
    pub explosion_damage: u32,

    /// Minimum Chebyshev distance from the protagonist for spawns.
    pub spawn_min_distance: u32,
    /// Seconds of invulnerability after the protagonist takes a hit.
    pub stun_duration: f32,
}

impl SimConfig {
    pub const DEFAULT_PATH_RECALC_INTERVAL: f32 = 0.5;
    pub const DEFAULT_TARGET_EPS: f32 = 0.05;
    pub const DEFAULT_CENTER_EPS: f32 = 0.02;
    pub const DEFAULT_PURSUER_SPEED: f32 = 2.2;
    pub const DEFAULT_PATROL_SPEED_SCALE: f32 = 0.5;
    pub const DEFAULT_SPRINT_MULTIPLIER: f32 = 2.0;
    pub const DEFAULT_SPRINT_DURATION: f32 = 10.0;
    pub const DEFAULT_VISION_RANGE_TILES: u32 = 20;
    pub const DEFAULT_LOST_SIGHT_GIVE_UP: f32 = 2.0;
    pub const DEFAULT_RETREAT_MAX_DURATION: f32 = 4.0;
    pub const DEFAULT_RETREAT_WAIT: f32 = 3.0;
    pub const DEFAULT_PATROL_WAIT_MIN: f32 = 0.5;
    pub const DEFAULT_PATROL_WAIT_MAX: f32 = 2.0;
    pub const DEFAULT_PURSUER_DAMAGE: u32 = 1;
    pub const DEFAULT_VEHICLE_SPEED: f32 = 6.0;
    pub const DEFAULT_VEHICLE_DAMAGE: u32 = 999;
    pub const DEFAULT_EXPLOSION_RADIUS: f32 = 5.0;
    pub const DEFAULT_EXPLOSION_LIFETIME: f32 = 0.6;
    pub const DEFAULT_EXPLOSION_DAMAGE: u32 = 1;
    pub const DEFAULT_SPAWN_MIN_DISTANCE: u32 = 2;
    pub const DEFAULT_STUN_DURATION: f32 = 1.0;

    pub fn new() -> Self {
        Self {
            path_recalc_interval: Self::DEFAULT_PATH_RECALC_INTERVAL,
            target_eps: Self::DEFAULT_TARGET_EPS,
            center_eps: Self::DEFAULT_CENTER_EPS,
            pursuer_speed: Self::DEFAULT_PURSUER_SPEED,
            patrol_speed_scale: Self::DEFAULT_PATROL_SPEED_SCALE,
            sprint_multiplier: Self::DEFAULT_SPRINT_MULTIPLIER,
            sprint_duration: Self::DEFAULT_SPRINT_DURATION,
            vision_range_tiles: Self::DEFAULT_VISION_RANGE_TILES,
            lost_sight_give_up: Self::DEFAULT_LOST_SIGHT_GIVE_UP,
            retreat_max_duration: Self::DEFAULT_RETREAT_MAX_DURATION,
            retreat_wait: Self::DEFAULT_RETREAT_WAIT,
            patrol_wait_min: Self::DEFAULT_PATROL_WAIT_MIN,
            patrol_wait_max: Self::DEFAULT_PATROL_WAIT_MAX,
            pursuer_damage: Self::DEFAULT_PURSUER_DAMAGE,
            vehicle_speed: Self::DEFAULT_VEHICLE_SPEED,
            vehicle_damage: Self::DEFAULT_VEHICLE_DAMAGE,
            explosion_radius: Self::DEFAULT_EXPLOSION_RADIUS,
            explosion_lifetime: Self::DEFAULT_EXPLOSION_LIFETIME,
            explosion_damage: Self::DEFAULT_EXPLOSION_DAMAGE,
            spawn_min_distance: Self::DEFAULT_SPAWN_MIN_DISTANCE,
            stun_duration: Self::DEFAULT_STUN_DURATION,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}
