// Node-changed notifications for presentation layers.
//
// The grid never calls outward. Every mutation that a presentation layer
// might care about — a node re-typed by the stream generator, an exploration
// state advancing — is appended to an ordered queue of `GridEvent` records,
// which the consumer drains once per frame/tick. Compared to inline callback
// fan-out this gives deterministic ordering and trivially testable output,
// the same role `SimEvent`s play for a sim's UI log.
//
// See also: `grid.rs` and `streams.rs`, the two producers.

use crate::coord::CubeCoord;
use crate::node::{ExplorationState, NodeType};
use serde::{Deserialize, Serialize};

/// A recorded change to one node, in the order it happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridEvent {
    pub position: CubeCoord,
    pub kind: GridEventKind,
}

/// What changed about the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridEventKind {
    /// The node's content type was overwritten (stream carving, endpoint
    /// content, obstacle placement).
    TypeChanged(NodeType),
    /// The node advanced in the exploration state machine.
    StateChanged(ExplorationState),
}
