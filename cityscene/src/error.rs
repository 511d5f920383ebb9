//! Error types for scene compilation.
//!
//! `SceneError` is the single error returned by [`crate::scene::SceneBuilder`].
//! Each collaborator keeps its own error type; they convert into
//! `SceneError` so `?` can be used throughout a build.

use thiserror::Error;

use crate::config::ConfigError;
use crate::geometry::GeometryError;
use crate::rules::RuleSetError;
use crate::store::{StoreError, TileId};

/// Result type for scene compilation.
pub type SceneResult<T> = Result<T, SceneError>;

/// Errors that abort a scene build.
///
/// No partial tileset is ever produced: the first error ends the build.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Unknown city, layer or representation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connection or query failure in the backing store.
    #[error("backing store error: {0}")]
    Store(#[from] StoreError),

    /// The rule set is missing keys or uses an unknown condition type.
    #[error("malformed rule set: {0}")]
    Rules(#[from] RuleSetError),

    /// A stored bounding box could not be parsed.
    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    /// Continuation tile and starting depth must be given together.
    #[error(
        "continuation tile and starting depth must both be set or both be unset \
         (tile: {tile:?}, starting depth: {starting_depth:?})"
    )]
    InvalidContinuation {
        tile: Option<TileId>,
        starting_depth: Option<u32>,
    },

    /// The continuation tile does not exist in the requested depth window.
    #[error("continuation tile {0} not found")]
    UnknownContinuationTile(TileId),

    /// No tile below the continuation tile lies at the starting depth.
    #[error("no tile below continuation tile {tile} at starting depth {starting_depth}")]
    EmptyContinuation { tile: TileId, starting_depth: u32 },
}
