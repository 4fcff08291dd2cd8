/// Errors raised while assembling a scene.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The map has no walkable tile, so nothing can be placed on it.
    #[error("map has no walkable tiles")]
    NoWalkableTiles,
    /// Vehicles were requested on a map without road tiles.
    #[error("vehicles requested but map has no road tiles")]
    NoRoadTiles,
}

pub type Result<T> = std::result::Result<T, SceneError>;
