// Node entities for the world map.
//
// A `HexNode` is one cell of the playfield, keyed by its `CubeCoord`. Nodes
// carry a content type (what the player finds there), an exploration state
// (what the player may do with it), and a cached ring level. Nodes are owned
// exclusively by the `HexGrid`; outside code only ever sees `&HexNode`.
//
// See also: `grid.rs` which owns the node set and enforces the exploration
// state machine, `streams.rs` which overwrites node types along carved paths.
//
// **Critical constraint: monotonicity.** `ExplorationState` only ever moves
// forward (Unrevealed -> Revealed -> Exploring -> Explored). All transitions
// go through `HexGrid`; this module only defines the data.

use crate::coord::CubeCoord;
use serde::{Deserialize, Serialize};

/// What a node contains. Mutable: stream generation overwrites types along
/// carved paths, and outer layers may place obstacles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    #[default]
    Empty,
    /// Impassable to pathfinding and player movement.
    Obstacle,
    /// Traversable stream tile — the skeleton of the explorable map.
    Resource,
    Enemy,
    Boss,
    /// Rest point.
    Bonfire,
}

/// Where a node sits in the exploration state machine. Strictly forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExplorationState {
    #[default]
    Unrevealed,
    /// Visible but not yet visited.
    Revealed,
    /// The player is here and its content is loading.
    Exploring,
    /// Finished. Completion reveals the surrounding frontier.
    Explored,
}

/// One cell of the hex playfield.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HexNode {
    position: CubeCoord,
    pub node_type: NodeType,
    pub state: ExplorationState,
    level: u32,
}

impl HexNode {
    /// Create a fresh node: `Empty`, `Unrevealed`, level derived from the
    /// position's ring distance.
    pub(crate) fn new(position: CubeCoord) -> Self {
        Self {
            position,
            node_type: NodeType::default(),
            state: ExplorationState::default(),
            level: position.level(),
        }
    }

    /// Identity. Set at creation, never mutated.
    pub fn position(&self) -> CubeCoord {
        self.position
    }

    /// Ring distance from the origin.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Blocked nodes are skipped by A* and rejected by the exploration gate.
    pub fn is_blocked(&self) -> bool {
        self.node_type == NodeType::Obstacle
    }

    /// True once the node is visible to the player (any state past
    /// `Unrevealed`).
    pub fn is_visible(&self) -> bool {
        self.state != ExplorationState::Unrevealed
    }
}
