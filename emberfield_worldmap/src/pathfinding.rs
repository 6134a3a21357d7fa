// A* pathfinding over the hex grid.
//
// Implements standard A* search using a `BinaryHeap` (min-heap via reversed
// ordering). Per-run scratch state — g-scores and the parent table used for
// retrace — lives in maps keyed by `CubeCoord`, created fresh for each
// search, never on the nodes themselves. The closed set is an `FxHashSet`;
// membership is all that is observed, so hashing order cannot leak into the
// result.
//
// The heuristic is the cube distance to the goal, which is admissible and
// consistent for unit edge weights, so standard A* optimality holds.
//
// "No path" is a routine outcome here, not an error: the stream generator
// probes unreachable endpoints constantly and simply skips them.
//
// See also: `grid.rs` for the node set and neighbor cache being searched,
// `streams.rs` which uses this search to carve paths.
//
// **Critical constraint: determinism.** A* is a pure function of grid state
// and the start/goal pair. Heap ties break by (h, coordinate) so equal-cost
// frontiers expand in a fixed order.

use crate::coord::CubeCoord;
use crate::grid::HexGrid;
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

/// The result of a successful A* search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathResult {
    /// Coordinates from start to goal, inclusive.
    pub nodes: Vec<CubeCoord>,
    /// Number of steps (edges); equals `nodes.len() - 1`.
    pub cost: u32,
}

/// Entry in the A* open set (min-heap via reversed ordering).
struct OpenEntry {
    coord: CubeCoord,
    f_cost: u32,
    h_cost: u32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost && self.h_cost == other.h_cost && self.coord == other.coord
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest f_cost is "greatest"; ties prefer
        // the smaller h_cost, then coordinate order.
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.h_cost.cmp(&self.h_cost))
            .then_with(|| other.coord.cmp(&self.coord))
    }
}

/// Find a shortest path from `start` to `goal` over non-blocked nodes.
///
/// Returns `None` when either endpoint is missing or blocked, or when the
/// open set exhausts without reaching the goal.
pub fn find_path(grid: &HexGrid, start: CubeCoord, goal: CubeCoord) -> Option<PathResult> {
    let start_node = grid.node(start)?;
    let goal_node = grid.node(goal)?;
    if start_node.is_blocked() || goal_node.is_blocked() {
        return None;
    }
    if start == goal {
        return Some(PathResult {
            nodes: vec![start],
            cost: 0,
        });
    }

    // g_cost[coord] = cost of the cheapest known path from start.
    let mut g_cost: BTreeMap<CubeCoord, u32> = BTreeMap::new();
    // parent[coord] = previous coordinate on that path (retrace table).
    let mut parent: BTreeMap<CubeCoord, CubeCoord> = BTreeMap::new();
    let mut closed: FxHashSet<CubeCoord> = FxHashSet::default();

    g_cost.insert(start, 0);

    let mut open = BinaryHeap::new();
    let h_start = start.distance(goal);
    open.push(OpenEntry {
        coord: start,
        f_cost: h_start,
        h_cost: h_start,
    });

    while let Some(current) = open.pop() {
        let current_coord = current.coord;

        if current_coord == goal {
            return Some(retrace(&parent, start, goal));
        }

        if !closed.insert(current_coord) {
            continue;
        }

        let current_g = g_cost[&current_coord];

        for &neighbor in grid.neighbors(current_coord) {
            if closed.contains(&neighbor) {
                continue;
            }
            // Neighbor cache entries always exist in the node set.
            if grid.node(neighbor).is_some_and(|n| n.is_blocked()) {
                continue;
            }

            let tentative_g = current_g + 1;
            if g_cost.get(&neighbor).is_none_or(|&g| tentative_g < g) {
                g_cost.insert(neighbor, tentative_g);
                parent.insert(neighbor, current_coord);
                let h = neighbor.distance(goal);
                open.push(OpenEntry {
                    coord: neighbor,
                    f_cost: tentative_g + h,
                    h_cost: h,
                });
            }
        }
    }

    None // Open set exhausted: no path.
}

/// Rebuild the path from the parent table, goal back to start.
fn retrace(parent: &BTreeMap<CubeCoord, CubeCoord>, start: CubeCoord, goal: CubeCoord) -> PathResult {
    let mut nodes = vec![goal];
    let mut current = goal;
    while current != start {
        current = parent[&current];
        nodes.push(current);
    }
    nodes.reverse();
    PathResult {
        cost: (nodes.len() - 1) as u32,
        nodes,
    }
}
