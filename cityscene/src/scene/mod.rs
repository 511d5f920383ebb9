//! Scene graph compilation.
//!
//! A build runs the stages in order:
//!
//! 1. [`RuleEngine`](crate::rules::RuleEngine) evaluates the rule set
//! 2. [`Hierarchy`] loads tiles and edges for the depth window
//! 3. [`Materializer`] creates representation nodes per tile
//! 4. [`Linker`] stitches the per-tile chains into one tree
//!
//! [`SceneBuilder`] drives all of them and hands the tree to
//! [`TilesetWriter`](crate::tileset::TilesetWriter).

mod builder;
mod graph;
mod hierarchy;
mod linker;
mod materialize;

pub use builder::{BuildRequest, Scene, SceneBuilder};
pub use graph::{Node, NodeId, NodeKind, SceneGraph, AGGREGATION_TILE_ID};
pub use hierarchy::Hierarchy;
pub use linker::{Linked, Linker};
pub use materialize::{BuildTile, Materializer};
