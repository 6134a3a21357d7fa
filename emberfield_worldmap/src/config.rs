// Data-driven world-map configuration.
//
// All tunable generation parameters live in `GridConfig`, loadable from JSON
// and never mutated at runtime. The grid reads everything from here — radius,
// visibility, the weighted node-type table, and the stream-generation profile
// — so map balance can be iterated without touching code.
//
// The fork-angle band ([60°, 90°] mirrored) and the level-biased fork-count
// weighting in `StreamProfile` are empirically tuned constants; they are kept
// as data rather than code on purpose.
//
// See also: `grid.rs` which owns a `GridConfig` per session, `streams.rs`
// which reads `StreamProfile`, `node.rs` for `NodeType`.
//
// **Critical constraint: fail fast.** Invalid configuration (zero or
// overflowing total sample weight, zero radius) is rejected at construction,
// before any grid exists. Runtime sampling can then assume a well-formed
// table.

use crate::node::NodeType;
use emberfield_prng::WorldRng;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error for configuration rejected at construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidConfiguration {
    /// The weighted node-type table sums to zero — nothing can be sampled.
    ZeroTotalWeight,
    /// The weighted node-type table sums past `u32::MAX`.
    WeightOverflow,
    /// A grid of radius zero has a single node and nowhere to explore.
    ZeroRadius,
}

impl fmt::Display for InvalidConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroTotalWeight => write!(f, "node type weights sum to zero"),
            Self::WeightOverflow => write!(f, "node type weights overflow u32"),
            Self::ZeroRadius => write!(f, "grid radius must be at least 1"),
        }
    }
}

impl std::error::Error for InvalidConfiguration {}

// ---------------------------------------------------------------------------
// Weighted node-type sampling
// ---------------------------------------------------------------------------

/// An ordered list of `(NodeType, weight)` pairs with a precomputed
/// cumulative-weight table for proportional sampling.
#[derive(Clone, Debug)]
pub struct NodeTypeTable {
    entries: Vec<(NodeType, u32)>,
    /// cumulative[i] = sum of weights up to and including entry i.
    cumulative: Vec<u32>,
    total: u32,
}

impl NodeTypeTable {
    /// Build the table, precomputing cumulative weights.
    ///
    /// Weights may individually be zero (the entry is then never drawn), but
    /// the total must be positive and fit in a `u32`.
    pub fn new(entries: Vec<(NodeType, u32)>) -> Result<Self, InvalidConfiguration> {
        let mut cumulative = Vec::with_capacity(entries.len());
        let mut total = 0u32;
        for &(_, weight) in &entries {
            total = total
                .checked_add(weight)
                .ok_or(InvalidConfiguration::WeightOverflow)?;
            cumulative.push(total);
        }
        if total == 0 {
            return Err(InvalidConfiguration::ZeroTotalWeight);
        }
        Ok(Self {
            entries,
            cumulative,
            total,
        })
    }

    /// Draw a `NodeType` with probability proportional to its weight.
    ///
    /// Draws a uniform integer in `[0, total)` and returns the first entry
    /// whose cumulative weight exceeds it.
    pub fn sample(&self, rng: &mut WorldRng) -> NodeType {
        let draw = rng.range_u32(0, self.total);
        for (i, &cum) in self.cumulative.iter().enumerate() {
            if draw < cum {
                return self.entries[i].0;
            }
        }
        // Unreachable: the last cumulative entry equals `total` and the draw
        // is strictly below it.
        self.entries[self.entries.len() - 1].0
    }

    pub fn entries(&self) -> &[(NodeType, u32)] {
        &self.entries
    }

    pub fn total_weight(&self) -> u32 {
        self.total
    }
}

// Serde carries only the entries; the cumulative table is rebuilt (and the
// zero-total invariant re-validated) on deserialize.
impl Serialize for NodeTypeTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeTypeTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<(NodeType, u32)>::deserialize(deserializer)?;
        NodeTypeTable::new(entries).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Stream generation profile
// ---------------------------------------------------------------------------

/// Parameters for the branching stream generator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StreamProfile {
    /// Target cube distance from a fork origin to its endpoint candidates.
    pub fork_distance: u32,

    /// Upper bound on forks spawned from one origin. The actual count is
    /// drawn in `1..=max_forks`, weighted `1 / (count + level)` so branching
    /// tapers with ring distance.
    pub max_forks: u32,

    /// Fork-angle band in degrees. An angle is drawn uniformly from
    /// `[angle_min_deg, angle_max_deg]` or its negation (fair coin), which
    /// avoids near-parallel forks while allowing wide spread.
    pub angle_min_deg: f32,
    pub angle_max_deg: f32,

    /// Hard cap on the fork queue. Processing stops once the queue drains or
    /// grows past this bound, preventing runaway branching on large grids.
    pub queue_cap: usize,

    /// Seed direction for the very first fork, as a vector in the x/z plane.
    pub seed_direction: [f32; 2],
}

impl Default for StreamProfile {
    fn default() -> Self {
        Self {
            fork_distance: 3,
            max_forks: 3,
            angle_min_deg: 60.0,
            angle_max_deg: 90.0,
            queue_cap: 30,
            seed_direction: [1.0, 0.0],
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level grid config
// ---------------------------------------------------------------------------

/// Top-level world-map configuration. Loaded from JSON, never mutated at
/// runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridConfig {
    /// Playfield radius: every coordinate with `level() <= grid_radius`
    /// gets a node.
    pub grid_radius: u32,

    /// Reveal radius around a node when its exploration completes.
    pub visibility_radius: u32,

    /// Weighted content table, used to type fork endpoints.
    pub node_types: NodeTypeTable,

    /// Stream generator parameters.
    pub streams: StreamProfile,
}

impl GridConfig {
    /// Validate the invariants a grid relies on. Called by `HexGrid::new`.
    pub fn validate(&self) -> Result<(), InvalidConfiguration> {
        if self.grid_radius == 0 {
            return Err(InvalidConfiguration::ZeroRadius);
        }
        // NodeTypeTable::new already rejected a zero total; nothing else to
        // check there.
        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        let node_types = NodeTypeTable::new(vec![
            (NodeType::Resource, 40),
            (NodeType::Enemy, 30),
            (NodeType::Bonfire, 15),
            (NodeType::Empty, 10),
            (NodeType::Boss, 5),
        ])
        .expect("default weights are non-zero");

        Self {
            grid_radius: 8,
            visibility_radius: 2,
            node_types,
            streams: StreamProfile::default(),
        }
    }
}
