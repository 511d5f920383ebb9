//! CityScene - rule-driven level-of-detail scenes for city datasets
//!
//! This library compiles the tile hierarchy of a city into a streamable
//! 3D Tiles tileset. A JSON rule set decides which representation of each
//! tile is shown at each depth, and which features get their own branch.
//!
//! # Example
//!
//! ```
//! use cityscene::config::{CitiesConfig, CityConfig, Datatype, LayerConfig, RepresentationConfig};
//! use cityscene::scene::{BuildRequest, SceneBuilder};
//! use cityscene::store::{MemoryStore, TileRecord};
//!
//! let config = CitiesConfig::new().with_city(
//!     CityConfig::new("c", "tiles", "hierarchy")
//!         .with_scales(vec![1000.0])
//!         .with_layer(LayerConfig::new("l", "features").with_representation(
//!             RepresentationConfig::new("facade", Datatype::PolyhedralSurface)
//!                 .with_tile_table("facade_tiles"),
//!         )),
//! );
//! let store = MemoryStore::new()
//!     .with_tile("tiles", TileRecord::new(1, 0).with_bbox("BOX3D(0 0 0,10 10 10)"))
//!     .with_edge("hierarchy", 1, 2)
//!     .with_tile_content("facade_tiles", 1);
//!
//! let rules = r#"{"default": {"0": ["facade"]}, "tileConditions": [], "featureConditions": []}"#;
//! let builder = SceneBuilder::new(&store, &config, "c", "l", rules).unwrap();
//! let tileset = builder.build(BuildRequest::default()).unwrap();
//!
//! assert_eq!(
//!     tileset.root.url(),
//!     Some("getTile?city=c&layer=l&tile=1&representation=facade&depth=0")
//! );
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod rules;
pub mod scene;
pub mod store;
pub mod tileset;

pub use config::CitiesConfig;
pub use error::{SceneError, SceneResult};
pub use scene::{BuildRequest, SceneBuilder};
pub use store::{MemoryStore, SceneStore};
pub use tileset::Tileset;

/// Version of the cityscene library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
