//! Tileset document types.

use serde::{Deserialize, Serialize};

/// Tileset format version written to `asset.version`.
pub const TILESET_VERSION: &str = "1.0";

/// Up axis of the referenced glTF content.
pub const GLTF_UP_AXIS: &str = "Z";

/// Root of an emitted tileset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tileset {
    pub asset: Asset,
    #[serde(rename = "geometricError")]
    pub geometric_error: f64,
    pub root: TileNode,
}

impl Tileset {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub version: String,
    #[serde(rename = "gltfUpAxis")]
    pub gltf_up_axis: String,
}

impl Default for Asset {
    fn default() -> Self {
        Self {
            version: TILESET_VERSION.to_string(),
            gltf_up_axis: GLTF_UP_AXIS.to_string(),
        }
    }
}

/// One node of the tileset tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileNode {
    #[serde(rename = "boundingVolume")]
    pub bounding_volume: BoundingVolume,
    #[serde(rename = "geometricError")]
    pub geometric_error: f64,
    #[serde(default)]
    pub children: Vec<TileNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refine: Option<Refine>,
}

impl TileNode {
    /// This node and its descendants, depth first.
    pub fn walk(&self) -> Vec<&TileNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Content URL, if the node has content.
    pub fn url(&self) -> Option<&str> {
        self.content.as_ref().map(|c| c.url.as_str())
    }
}

/// Oriented box: center followed by three half-axis vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingVolume {
    #[serde(rename = "box")]
    pub bbox: [f64; 12],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub url: String,
}

/// Refinement strategy of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Refine {
    Add,
    Replace,
}
