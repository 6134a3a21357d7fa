// Cube coordinates for the hexagonal world map.
//
// A `CubeCoord` is a 3-axis integer coordinate with the invariant
// `x + y + z == 0`. The redundancy buys simple arithmetic: hex distance is
// half the Manhattan distance, the six neighbors are fixed unit offsets, and
// ring membership falls out of the axis magnitudes. Coordinates are the
// canonical node key throughout the crate (`BTreeMap<CubeCoord, _>`).
//
// `CubeCoord::round()` snaps a fractional coordinate (from the stream
// generator's angle rotation) back onto the integer lattice while preserving
// the invariant — naive per-axis rounding breaks it roughly a third of the
// time.
//
// See also: `grid.rs` which enumerates the hex region at construction,
// `streams.rs` for the geometry that produces fractional coordinates.
//
// **Critical constraint: invariant.** No public path may construct a
// `CubeCoord` with `x + y + z != 0`. Fallible construction returns
// `InvalidCoordinate`; deserialization re-validates.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The six neighbor offsets, in fixed order. Index 0 is "east" and the rest
/// proceed counter-clockwise.
pub const NEIGHBOR_OFFSETS: [(i32, i32, i32); 6] = [
    (1, -1, 0),
    (1, 0, -1),
    (0, 1, -1),
    (-1, 1, 0),
    (-1, 0, 1),
    (0, -1, 1),
];

/// A position on the hex grid, in cube coordinates.
///
/// Fields are private so the `x + y + z == 0` invariant cannot be broken
/// after construction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CubeCoord {
    x: i32,
    y: i32,
    z: i32,
}

/// Error for a cube coordinate whose axes do not sum to zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl fmt::Display for InvalidCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cube coordinate ({}, {}, {}) violates x + y + z == 0",
            self.x, self.y, self.z
        )
    }
}

impl std::error::Error for InvalidCoordinate {}

impl CubeCoord {
    /// The grid origin, `(0, 0, 0)`.
    pub const ORIGIN: CubeCoord = CubeCoord { x: 0, y: 0, z: 0 };

    /// Construct a coordinate, rejecting axis triples that don't sum to zero.
    pub const fn new(x: i32, y: i32, z: i32) -> Result<Self, InvalidCoordinate> {
        if x + y + z != 0 {
            return Err(InvalidCoordinate { x, y, z });
        }
        Ok(Self { x, y, z })
    }

    /// Construct from axes already known to satisfy the invariant.
    pub(crate) const fn new_unchecked(x: i32, y: i32, z: i32) -> Self {
        debug_assert!(x + y + z == 0);
        Self { x, y, z }
    }

    pub const fn x(self) -> i32 {
        self.x
    }

    pub const fn y(self) -> i32 {
        self.y
    }

    pub const fn z(self) -> i32 {
        self.z
    }

    /// Hex-grid distance: half the Manhattan distance across the three axes.
    /// Exact — the invariant guarantees the sum is even.
    pub fn distance(self, other: Self) -> u32 {
        ((self.x - other.x).unsigned_abs()
            + (self.y - other.y).unsigned_abs()
            + (self.z - other.z).unsigned_abs())
            / 2
    }

    /// Ring distance from the origin.
    ///
    /// Under the invariant this equals `max(|x|, |y|, |z|)`, so it doubles
    /// as the boundary test: a node is on the rim of a radius-R grid exactly
    /// when `level() == R`.
    pub fn level(self) -> u32 {
        self.distance(Self::ORIGIN)
    }

    /// The six neighboring coordinates, in `NEIGHBOR_OFFSETS` order.
    /// Offsets sum to zero per axis triple, so the invariant is preserved.
    pub fn neighbors(self) -> [CubeCoord; 6] {
        NEIGHBOR_OFFSETS.map(|(dx, dy, dz)| {
            Self::new_unchecked(self.x + dx, self.y + dy, self.z + dz)
        })
    }

    /// Snap a fractional cube coordinate to the nearest valid integer one.
    ///
    /// Each axis is rounded independently, then the axis with the largest
    /// rounding error is recomputed as the negated sum of the other two, so
    /// `x + y + z == 0` holds exactly. Inputs that are already exact integers
    /// summing to zero come back unchanged.
    pub fn round(fx: f32, fy: f32, fz: f32) -> CubeCoord {
        let mut rx = fx.round();
        let mut ry = fy.round();
        let mut rz = fz.round();

        let dx = (rx - fx).abs();
        let dy = (ry - fy).abs();
        let dz = (rz - fz).abs();

        if dx > dy && dx > dz {
            rx = -ry - rz;
        } else if dy > dz {
            ry = -rx - rz;
        } else {
            rz = -rx - ry;
        }

        Self::new_unchecked(rx as i32, ry as i32, rz as i32)
    }
}

/// Enumerate every valid coordinate within `radius` of `center`, in the
/// standard double-loop order (x ascending, then y).
pub fn hex_range(center: CubeCoord, radius: u32) -> Vec<CubeCoord> {
    let r = radius as i32;
    let mut out = Vec::new();
    for x in -r..=r {
        for y in (-r).max(-x - r)..=r.min(-x + r) {
            let z = -x - y;
            out.push(CubeCoord::new_unchecked(center.x + x, center.y + y, center.z + z));
        }
    }
    out
}

impl fmt::Debug for CubeCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CubeCoord({}, {}, {})", self.x, self.y, self.z)
    }
}

impl fmt::Display for CubeCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// Custom deserialize: re-validate the invariant so a hand-edited or corrupt
// payload cannot smuggle in a broken coordinate.
impl<'de> Deserialize<'de> for CubeCoord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            x: i32,
            y: i32,
            z: i32,
        }
        let raw = Raw::deserialize(deserializer)?;
        CubeCoord::new(raw.x, raw.y, raw.z).map_err(serde::de::Error::custom)
    }
}
