//! Tileset output: document types, content URLs and the scene writer.

mod document;
mod serializer;
mod urls;

pub use document::{
    Asset, BoundingVolume, Content, Refine, TileNode, Tileset, GLTF_UP_AXIS, TILESET_VERSION,
};
pub use serializer::TilesetWriter;
pub use urls::ContentUrls;
