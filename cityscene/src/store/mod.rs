//! Backing store access.
//!
//! The scene compiler never issues queries directly; it goes through the
//! [`SceneStore`] trait. [`MemoryStore`] is the in-memory implementation used
//! by the CLI and the tests.

mod memory;
mod traits;
mod types;

pub use memory::{ContentTableData, Dataset, FeatureRecord, MemoryStore, TileTableData};
pub use traits::{SceneStore, StoreError, StoreResult};
pub use types::{DepthWindow, FeatureId, FeatureMatch, HierarchyEdge, TileId, TileRecord};
