//! Axis-aligned 3D bounding boxes.
//!
//! Tile metadata stores boxes in the PostGIS `BOX3D(x y z,x y z)` text form.
//! The tileset format wants a center and three half-axis vectors instead;
//! [`Box3D::to_bounding_box`] does that conversion.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Errors parsing a stored bounding box.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Text does not match `BOX3D(x y z,x y z)`.
    #[error("invalid BOX3D text: {0}")]
    InvalidBox(String),
}

/// Axis-aligned box with `min <= max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box3D {
    min: [f64; 3],
    max: [f64; 3],
}

fn box3d_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let num = r"([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)";
        let pattern = format!(
            r"(?i)^\s*BOX3D\(\s*{num}\s+{num}\s+{num}\s*,\s*{num}\s+{num}\s+{num}\s*\)\s*$"
        );
        Regex::new(&pattern).expect("BOX3D pattern is valid")
    })
}

impl Box3D {
    /// Create a box from two opposite corners in any order.
    pub fn from_corners(a: [f64; 3], b: [f64; 3]) -> Self {
        Self {
            min: [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])],
            max: [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])],
        }
    }

    /// Parse the `BOX3D(x y z,x y z)` text form.
    pub fn parse(text: &str) -> Result<Self, GeometryError> {
        let caps = box3d_regex()
            .captures(text)
            .ok_or_else(|| GeometryError::InvalidBox(text.to_string()))?;

        let mut values = [0.0_f64; 6];
        for (i, value) in values.iter_mut().enumerate() {
            *value = caps[i + 1]
                .parse()
                .map_err(|_| GeometryError::InvalidBox(text.to_string()))?;
        }

        Ok(Self::from_corners(
            [values[0], values[1], values[2]],
            [values[3], values[4], values[5]],
        ))
    }

    /// Lower and upper corners.
    pub fn corners(&self) -> ([f64; 3], [f64; 3]) {
        (self.min, self.max)
    }

    /// Center point.
    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Box3D) -> Box3D {
        Box3D::from_corners(
            [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
                self.min[2].min(other.min[2]),
            ],
            [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
                self.max[2].max(other.max[2]),
            ],
        )
    }

    /// Union of every box in `boxes`, or `None` when there are none.
    pub fn union_all<'a, I>(boxes: I) -> Option<Box3D>
    where
        I: IntoIterator<Item = &'a Box3D>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<Box3D>, b| match acc {
                Some(acc) => Some(acc.union(b)),
                None => Some(*b),
            })
    }

    /// 2-D extent on the ground plane, as `(min, max)` corners.
    pub fn footprint(&self) -> ([f64; 2], [f64; 2]) {
        ([self.min[0], self.min[1]], [self.max[0], self.max[1]])
    }

    /// Tileset bounding volume: center followed by the x, y and z half-axes.
    pub fn to_bounding_box(&self) -> [f64; 12] {
        let c = self.center();
        let hx = (self.max[0] - self.min[0]) / 2.0;
        let hy = (self.max[1] - self.min[1]) / 2.0;
        let hz = (self.max[2] - self.min[2]) / 2.0;
        [
            c[0], c[1], c[2], //
            hx, 0.0, 0.0, //
            0.0, hy, 0.0, //
            0.0, 0.0, hz,
        ]
    }
}

impl FromStr for Box3D {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Box3D::parse(s)
    }
}

impl fmt::Display for Box3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BOX3D({} {} {},{} {} {})",
            self.min[0], self.min[1], self.min[2], self.max[0], self.max[1], self.max[2]
        )
    }
}
