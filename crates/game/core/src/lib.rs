//! Deterministic pursuit and road-traffic simulation core.
//!
//! `getaway-core` defines the grid model, the A* searches, and the
//! frame-stepped agent controllers: pursuers navigating the collision
//! grid and vehicles constrained to the road grid. Everything here is
//! pure simulation — callers supply the grids, a view of the
//! protagonist, an RNG oracle, and a time delta; agents answer with
//! movement and [`context::SceneEvent`]s. Rendering, audio, input, and
//! persistence are collaborator concerns that never appear in this
//! crate.
pub mod agent;
pub mod config;
pub mod context;
pub mod grid;
pub mod nav;
pub mod rng;

pub use agent::{Aabb, Footprint, Pursuer, PursuerState, PursuerStateKind, Vehicle, WaitTimer};
pub use config::SimConfig;
pub use context::{
    AlertEpoch, HitCause, OccupancySnapshot, ProtagonistView, SceneEvent, TickContext,
};
pub use grid::{
    CollisionView, FlagGrid, GridDimensions, GridParseError, Position, RoadView, TileFlags,
    TileGrid, Vec2,
};
pub use nav::{Path, closest_walkable, find_path};
pub use rng::{PcgRng, RngOracle};
