//! Scene runtime for the getaway simulation.
//!
//! This crate hosts the mutable world on top of the pure logic in
//! `getaway-core`: it owns the protagonist, the agent populations, and
//! the per-tick sweep that drives them. Consumers embed [`Scene`],
//! feed it protagonist positions, call [`Scene::tick`] at their frame
//! rate, and drain [`SceneEvent`](getaway_core::SceneEvent)s for
//! presentation.
//!
//! Modules are organized by responsibility:
//! - [`scene`] hosts the orchestrator and its builder
//! - [`error`] carries the scene assembly errors

pub mod error;
pub mod scene;

pub use error::{Result, SceneError};
pub use scene::{Explosion, Protagonist, Scene, SceneBuilder};
