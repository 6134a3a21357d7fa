// The hex-grid world map: node storage, neighbor cache, and the exploration
// gate.
//
// `HexGrid` is the single source of truth for one world-map session. It owns
// every `HexNode` (keyed by `CubeCoord` in a `BTreeMap` for deterministic
// iteration), a neighbor adjacency cache precomputed at construction, the
// player cursor, the config, and the session PRNG. Construction enumerates
// the hex region, builds the cache, then runs the stream generator exactly
// once.
//
// Presentation layers hold only `&HexNode` references and learn about
// changes by draining the `GridEvent` queue; they mutate the map exclusively
// through the exploration gate (`try_explore` / `mark_current_explored` /
// `reveal_in_range`), whose rejections are reported values, never panics.
//
// See also: `streams.rs` for the generator run at construction,
// `pathfinding.rs` for A* over this graph, `event.rs` for the change queue,
// `config.rs` for the tunables.
//
// **Critical constraint: determinism.** A map layout is a pure function of
// `(config, seed)`. Node storage and the neighbor cache iterate in
// `BTreeMap` order; all randomness flows through the owned `WorldRng`.

use crate::config::{GridConfig, InvalidConfiguration};
use crate::coord::{hex_range, CubeCoord};
use crate::event::{GridEvent, GridEventKind};
use crate::node::{ExplorationState, HexNode, NodeType};
use crate::streams;
use emberfield_prng::WorldRng;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

/// Why an exploration-gate request was rejected. Routine outcomes, reported
/// to the caller and otherwise ignored — grid state is never corrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExploreError {
    /// The coordinate lies outside the playfield.
    NodeNotFound(CubeCoord),
    /// The node is not adjacent to the player cursor.
    NotAdjacent(CubeCoord),
    /// The node is an obstacle.
    Blocked(CubeCoord),
    /// The node is not in the `Revealed` state (still hidden, already being
    /// explored, or already finished).
    NotRevealed {
        position: CubeCoord,
        state: ExplorationState,
    },
    /// `mark_current_explored` was called while the player's node is not in
    /// the `Exploring` state.
    NotExploring {
        position: CubeCoord,
        state: ExplorationState,
    },
}

impl fmt::Display for ExploreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound(c) => write!(f, "no node at {c}"),
            Self::NotAdjacent(c) => write!(f, "node {c} is not adjacent to the player"),
            Self::Blocked(c) => write!(f, "node {c} is blocked"),
            Self::NotRevealed { position, state } => {
                write!(f, "node {position} is {state:?}, not Revealed")
            }
            Self::NotExploring { position, state } => {
                write!(f, "player node {position} is {state:?}, not Exploring")
            }
        }
    }
}

impl std::error::Error for ExploreError {}

/// The world-map graph for one session.
#[derive(Debug)]
pub struct HexGrid {
    pub(crate) config: GridConfig,
    pub(crate) rng: WorldRng,
    pub(crate) nodes: BTreeMap<CubeCoord, HexNode>,
    /// Up to 6 in-grid neighbors per node, precomputed once. Boundary nodes
    /// have fewer entries.
    pub(crate) neighbor_cache: BTreeMap<CubeCoord, SmallVec<[CubeCoord; 6]>>,
    pub(crate) player_position: CubeCoord,
    pub(crate) events: Vec<GridEvent>,
}

impl HexGrid {
    /// Build a grid: validate the config, enumerate nodes, precompute the
    /// neighbor cache, and run the stream generator once.
    pub fn new(config: GridConfig, seed: u64) -> Result<Self, InvalidConfiguration> {
        config.validate()?;
        let rng = WorldRng::new(seed);
        let mut grid = Self {
            config,
            rng,
            nodes: BTreeMap::new(),
            neighbor_cache: BTreeMap::new(),
            player_position: CubeCoord::ORIGIN,
            events: Vec::new(),
        };
        grid.rebuild();
        Ok(grid)
    }

    /// Discard all nodes and caches and regenerate from scratch with the
    /// same config. The PRNG stream continues, so a reset mid-session yields
    /// a fresh layout while the session as a whole stays reproducible from
    /// the construction seed.
    pub fn reset(&mut self) {
        self.events.clear();
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let radius = self.config.grid_radius;

        self.nodes = hex_range(CubeCoord::ORIGIN, radius)
            .into_iter()
            .map(|c| (c, HexNode::new(c)))
            .collect();

        self.neighbor_cache = self
            .nodes
            .keys()
            .map(|&c| {
                let in_grid: SmallVec<[CubeCoord; 6]> = c
                    .neighbors()
                    .into_iter()
                    .filter(|n| n.level() <= radius)
                    .collect();
                (c, in_grid)
            })
            .collect();

        self.player_position = CubeCoord::ORIGIN;
        streams::generate(self);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn radius(&self) -> u32 {
        self.config.grid_radius
    }

    /// Node lookup. `None` for coordinates outside the playfield — boundary
    /// checks are a normal part of neighbor iteration, not an error.
    pub fn node(&self, coord: CubeCoord) -> Option<&HexNode> {
        self.nodes.get(&coord)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The precomputed in-grid neighbors of a coordinate (empty for
    /// coordinates outside the playfield).
    pub fn neighbors(&self, coord: CubeCoord) -> &[CubeCoord] {
        self.neighbor_cache
            .get(&coord)
            .map(|n| n.as_slice())
            .unwrap_or(&[])
    }

    /// All nodes the player can currently see (state past `Unrevealed`), in
    /// coordinate order.
    pub fn visible_nodes(&self) -> Vec<&HexNode> {
        self.nodes.values().filter(|n| n.is_visible()).collect()
    }

    pub fn player_position(&self) -> CubeCoord {
        self.player_position
    }

    /// True iff `coord` is in the neighbor cache of the player's node.
    pub fn is_adjacent_to_player(&self, coord: CubeCoord) -> bool {
        self.neighbors(self.player_position).contains(&coord)
    }

    /// Drain the pending change records, in the order they happened.
    pub fn drain_events(&mut self) -> Vec<GridEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Overwrite a node's content type (obstacle placement, scripted
    /// content). Returns false for coordinates outside the playfield.
    pub fn set_node_type(&mut self, coord: CubeCoord, node_type: NodeType) -> bool {
        let Some(node) = self.nodes.get_mut(&coord) else {
            return false;
        };
        if node.node_type != node_type {
            node.node_type = node_type;
            self.events.push(GridEvent {
                position: coord,
                kind: GridEventKind::TypeChanged(node_type),
            });
        }
        true
    }

    /// Reveal every `Unrevealed` node within cube distance `radius` of
    /// `center`. Idempotent: nodes already past `Unrevealed` are untouched,
    /// so no state ever regresses. Returns how many nodes were newly
    /// revealed.
    pub fn reveal_in_range(&mut self, center: CubeCoord, radius: u32) -> usize {
        let mut revealed = 0;
        for coord in hex_range(center, radius) {
            let Some(node) = self.nodes.get_mut(&coord) else {
                continue;
            };
            if node.state == ExplorationState::Unrevealed {
                node.state = ExplorationState::Revealed;
                self.events.push(GridEvent {
                    position: coord,
                    kind: GridEventKind::StateChanged(ExplorationState::Revealed),
                });
                revealed += 1;
            }
        }
        revealed
    }

    /// Pick the spawn node, move the player cursor there, and put it in the
    /// `Exploring` state — the spawn then completes through the same
    /// scene-loaded -> `mark_current_explored` flow as every other node.
    /// Calling this again mid-session only moves the cursor; a spawn node
    /// already past `Exploring` keeps its state.
    ///
    /// The origin is preferred; if it is blocked, the nearest non-blocked
    /// node (by ring, then coordinate order) is used instead.
    pub fn generate_spawn_point(&mut self) -> CubeCoord {
        let spawn = self.find_spawn_coord();
        self.player_position = spawn;
        self.advance_state(spawn, ExplorationState::Exploring);
        spawn
    }

    fn find_spawn_coord(&self) -> CubeCoord {
        let origin = self
            .nodes
            .get(&CubeCoord::ORIGIN)
            .expect("origin is always inside the playfield");
        if !origin.is_blocked() {
            return CubeCoord::ORIGIN;
        }
        for ring in 1..=self.config.grid_radius {
            for coord in hex_range(CubeCoord::ORIGIN, ring) {
                if coord.level() != ring {
                    continue;
                }
                if let Some(node) = self.nodes.get(&coord) {
                    if !node.is_blocked() {
                        return coord;
                    }
                }
            }
        }
        // A fully blocked grid has no sane spawn; fall back to the origin.
        CubeCoord::ORIGIN
    }

    /// The exploration gate: enter `coord` if it is adjacent to the player,
    /// revealed, and not blocked. On success the player cursor moves there
    /// and the node enters `Exploring`; the scene/content layer is expected
    /// to call `mark_current_explored` once loading finishes.
    pub fn try_explore(&mut self, coord: CubeCoord) -> Result<(), ExploreError> {
        let Some(node) = self.nodes.get(&coord) else {
            return Err(ExploreError::NodeNotFound(coord));
        };
        if node.is_blocked() {
            return Err(ExploreError::Blocked(coord));
        }
        // State before adjacency: re-exploring the node the player already
        // stands on must report the state, not the (vacuous) adjacency.
        if node.state != ExplorationState::Revealed {
            return Err(ExploreError::NotRevealed {
                position: coord,
                state: node.state,
            });
        }
        if !self.is_adjacent_to_player(coord) {
            return Err(ExploreError::NotAdjacent(coord));
        }
        self.player_position = coord;
        self.advance_state(coord, ExplorationState::Exploring);
        Ok(())
    }

    /// Complete the node the player is on: `Exploring -> Explored`, then
    /// reveal the surrounding frontier with the configured visibility
    /// radius. Called by the scene/content layer when loading finishes.
    pub fn mark_current_explored(&mut self) -> Result<(), ExploreError> {
        let position = self.player_position;
        let Some(node) = self.nodes.get(&position) else {
            return Err(ExploreError::NodeNotFound(position));
        };
        if node.state != ExplorationState::Exploring {
            return Err(ExploreError::NotExploring {
                position,
                state: node.state,
            });
        }
        self.advance_state(position, ExplorationState::Explored);
        self.reveal_in_range(position, self.config.visibility_radius);
        Ok(())
    }

    /// Forward-only state write plus its change record. A node already at or
    /// past `state` is left untouched, so no call sequence can regress a
    /// node's exploration state.
    fn advance_state(&mut self, coord: CubeCoord, state: ExplorationState) {
        let node = self
            .nodes
            .get_mut(&coord)
            .expect("advance_state called with an in-grid coordinate");
        if node.state < state {
            node.state = state;
            self.events.push(GridEvent {
                position: coord,
                kind: GridEventKind::StateChanged(state),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeTypeTable;

    fn test_config(radius: u32) -> GridConfig {
        GridConfig {
            grid_radius: radius,
            ..GridConfig::default()
        }
    }

    fn test_grid(radius: u32, seed: u64) -> HexGrid {
        HexGrid::new(test_config(radius), seed).unwrap()
    }

    fn coord(x: i32, y: i32, z: i32) -> CubeCoord {
        CubeCoord::new(x, y, z).unwrap()
    }

    #[test]
    fn construction_enumerates_the_hex_region() {
        let grid = test_grid(3, 42);
        // 1 + 3r(r+1) nodes for radius r = 3.
        assert_eq!(grid.node_count(), 37);
        for node in grid.nodes.values() {
            let p = node.position();
            assert_eq!(p.x() + p.y() + p.z(), 0);
            assert!(p.level() <= 3);
        }
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = GridConfig {
            grid_radius: 0,
            ..GridConfig::default()
        };
        assert_eq!(
            HexGrid::new(config, 1).unwrap_err(),
            InvalidConfiguration::ZeroRadius
        );
    }

    #[test]
    fn neighbor_cache_matches_boundary_shape() {
        let grid = test_grid(3, 42);
        // Interior nodes have all 6 neighbors.
        assert_eq!(grid.neighbors(CubeCoord::ORIGIN).len(), 6);
        assert_eq!(grid.neighbors(coord(1, -1, 0)).len(), 6);
        // Hex corners keep 3, other rim nodes keep 4.
        assert_eq!(grid.neighbors(coord(3, -3, 0)).len(), 3);
        assert_eq!(grid.neighbors(coord(3, -2, -1)).len(), 4);
        // Outside the playfield: empty.
        assert!(grid.neighbors(coord(4, -4, 0)).is_empty());
    }

    #[test]
    fn node_lookup_outside_radius_is_none() {
        let grid = test_grid(2, 42);
        assert!(grid.node(coord(3, -3, 0)).is_none());
        assert!(grid.node(coord(2, -2, 0)).is_some());
    }

    #[test]
    fn reveal_in_range_covers_the_ring_formula() {
        let mut grid = test_grid(3, 42);
        grid.drain_events();

        let revealed = grid.reveal_in_range(CubeCoord::ORIGIN, 2);
        assert_eq!(revealed, 19); // 1 + 6 + 12

        let visible = grid.visible_nodes();
        assert_eq!(visible.len(), 19);
        for node in &visible {
            assert!(node.position().level() <= 2);
        }
        // Outer nodes stay unrevealed.
        assert_eq!(
            grid.node(coord(3, -3, 0)).unwrap().state,
            ExplorationState::Unrevealed
        );
        // One StateChanged record per newly revealed node.
        let events = grid.drain_events();
        assert_eq!(events.len(), 19);
        assert!(events.iter().all(|e| matches!(
            e.kind,
            GridEventKind::StateChanged(ExplorationState::Revealed)
        )));
    }

    #[test]
    fn reveal_is_idempotent_and_never_regresses() {
        let mut grid = test_grid(3, 42);
        grid.reveal_in_range(CubeCoord::ORIGIN, 2);
        grid.drain_events();

        assert_eq!(grid.reveal_in_range(CubeCoord::ORIGIN, 2), 0);
        assert!(grid.drain_events().is_empty());

        // An Explored node stays Explored through another reveal sweep.
        grid.generate_spawn_point();
        grid.mark_current_explored().unwrap();
        let before = grid.node(CubeCoord::ORIGIN).unwrap().state;
        assert_eq!(before, ExplorationState::Explored);
        grid.reveal_in_range(CubeCoord::ORIGIN, 2);
        assert_eq!(
            grid.node(CubeCoord::ORIGIN).unwrap().state,
            ExplorationState::Explored
        );
    }

    #[test]
    fn spawn_point_prefers_the_origin() {
        let mut grid = test_grid(3, 42);
        let spawn = grid.generate_spawn_point();
        assert_eq!(spawn, CubeCoord::ORIGIN);
        assert_eq!(grid.player_position(), CubeCoord::ORIGIN);
        assert_eq!(
            grid.node(spawn).unwrap().state,
            ExplorationState::Exploring
        );
    }

    #[test]
    fn respawning_on_an_explored_node_never_regresses_it() {
        let mut grid = test_grid(3, 42);
        grid.generate_spawn_point();
        grid.mark_current_explored().unwrap();
        grid.drain_events();

        // A second spawn lands on the same node; its state must stay
        // Explored, with no change record.
        let spawn = grid.generate_spawn_point();
        assert_eq!(spawn, CubeCoord::ORIGIN);
        assert_eq!(
            grid.node(spawn).unwrap().state,
            ExplorationState::Explored
        );
        assert!(grid.drain_events().is_empty());
    }

    #[test]
    fn spawn_point_skips_a_blocked_origin() {
        let mut grid = test_grid(3, 42);
        grid.set_node_type(CubeCoord::ORIGIN, NodeType::Obstacle);
        let spawn = grid.generate_spawn_point();
        assert_ne!(spawn, CubeCoord::ORIGIN);
        assert_eq!(spawn.level(), 1);
        assert!(!grid.node(spawn).unwrap().is_blocked());
    }

    #[test]
    fn explore_gate_happy_path() {
        let mut grid = test_grid(3, 42);
        grid.generate_spawn_point();
        grid.mark_current_explored().unwrap();

        // Pick any revealed neighbor of the player.
        let target = grid.neighbors(grid.player_position())[0];
        assert_eq!(
            grid.node(target).unwrap().state,
            ExplorationState::Revealed
        );

        grid.try_explore(target).unwrap();
        assert_eq!(grid.player_position(), target);
        assert_eq!(
            grid.node(target).unwrap().state,
            ExplorationState::Exploring
        );

        // A second attempt before the content callback is rejected: the
        // node is Exploring, not Revealed.
        assert_eq!(
            grid.try_explore(target),
            Err(ExploreError::NotRevealed {
                position: target,
                state: ExplorationState::Exploring,
            })
        );

        grid.mark_current_explored().unwrap();
        assert_eq!(
            grid.node(target).unwrap().state,
            ExplorationState::Explored
        );
    }

    #[test]
    fn explore_rejects_unrevealed_nonadjacent_blocked_and_missing() {
        let mut grid = test_grid(4, 42);
        grid.generate_spawn_point();
        grid.mark_current_explored().unwrap();

        // Revealed but two rings away from the player.
        let far = coord(2, -2, 0);
        assert_eq!(
            grid.node(far).unwrap().state,
            ExplorationState::Revealed
        );
        assert_eq!(grid.try_explore(far), Err(ExploreError::NotAdjacent(far)));

        let missing = coord(5, -5, 0);
        assert_eq!(
            grid.try_explore(missing),
            Err(ExploreError::NodeNotFound(missing))
        );

        let adjacent = grid.neighbors(grid.player_position())[0];
        grid.set_node_type(adjacent, NodeType::Obstacle);
        assert_eq!(
            grid.try_explore(adjacent),
            Err(ExploreError::Blocked(adjacent))
        );

        // Rejections never move the player.
        assert_eq!(grid.player_position(), CubeCoord::ORIGIN);
    }

    #[test]
    fn explore_rejects_an_unrevealed_neighbor() {
        // Visibility radius 0 keeps neighbors hidden after the spawn
        // completes, isolating the NotRevealed rejection.
        let config = GridConfig {
            grid_radius: 3,
            visibility_radius: 0,
            ..GridConfig::default()
        };
        let mut grid = HexGrid::new(config, 42).unwrap();
        grid.generate_spawn_point();
        grid.mark_current_explored().unwrap();

        let target = grid.neighbors(grid.player_position())[0];
        assert_eq!(
            grid.try_explore(target),
            Err(ExploreError::NotRevealed {
                position: target,
                state: ExplorationState::Unrevealed,
            })
        );
    }

    #[test]
    fn mark_current_explored_requires_exploring() {
        let mut grid = test_grid(3, 42);
        // Player starts at the origin but the node is still Unrevealed.
        assert_eq!(
            grid.mark_current_explored(),
            Err(ExploreError::NotExploring {
                position: CubeCoord::ORIGIN,
                state: ExplorationState::Unrevealed,
            })
        );

        grid.generate_spawn_point();
        grid.mark_current_explored().unwrap();
        // Completing twice is rejected, not fatal.
        assert_eq!(
            grid.mark_current_explored(),
            Err(ExploreError::NotExploring {
                position: CubeCoord::ORIGIN,
                state: ExplorationState::Explored,
            })
        );
    }

    #[test]
    fn completing_a_node_reveals_the_frontier() {
        let mut grid = test_grid(4, 42);
        grid.generate_spawn_point();
        grid.drain_events();
        grid.mark_current_explored().unwrap();

        // Everything within the visibility radius (2) of the origin is now
        // visible; the origin itself is Explored.
        for c in hex_range(CubeCoord::ORIGIN, grid.config().visibility_radius) {
            assert!(grid.node(c).unwrap().is_visible(), "{c} still hidden");
        }
        assert_eq!(
            grid.node(coord(3, -3, 0)).unwrap().state,
            ExplorationState::Unrevealed
        );
    }

    #[test]
    fn set_node_type_records_an_event_only_on_change() {
        let mut grid = test_grid(2, 42);
        grid.drain_events();
        let c = coord(1, -1, 0);

        let current = grid.node(c).unwrap().node_type;
        assert!(grid.set_node_type(c, current));
        assert!(grid.drain_events().is_empty());

        assert!(grid.set_node_type(c, NodeType::Obstacle));
        let events = grid.drain_events();
        assert_eq!(
            events,
            vec![GridEvent {
                position: c,
                kind: GridEventKind::TypeChanged(NodeType::Obstacle),
            }]
        );

        assert!(!grid.set_node_type(coord(5, -5, 0), NodeType::Obstacle));
    }

    #[test]
    fn same_seed_same_layout() {
        let a = test_grid(5, 1234);
        let b = test_grid(5, 1234);
        for (coord, node) in &a.nodes {
            assert_eq!(node.node_type, b.node(*coord).unwrap().node_type);
        }
    }

    #[test]
    fn reset_discards_exploration_and_relays_streams() {
        let mut grid = test_grid(4, 7);
        grid.generate_spawn_point();
        grid.mark_current_explored().unwrap();
        assert!(!grid.visible_nodes().is_empty());

        grid.reset();
        assert_eq!(grid.node_count(), 61);
        assert_eq!(grid.player_position(), CubeCoord::ORIGIN);
        assert!(grid.visible_nodes().is_empty());
        // The rebuilt map carved fresh streams.
        assert!(grid
            .nodes
            .values()
            .any(|n| n.node_type == NodeType::Resource));
    }

    #[test]
    fn sampler_is_reachable_through_the_default_config() {
        // Guards the config plumbing end to end: the weighted table inside a
        // default grid draws every configured type eventually.
        let table = NodeTypeTable::new(vec![(NodeType::Enemy, 1), (NodeType::Boss, 1)]).unwrap();
        let mut rng = WorldRng::new(9);
        let mut seen_enemy = false;
        let mut seen_boss = false;
        for _ in 0..200 {
            match table.sample(&mut rng) {
                NodeType::Enemy => seen_enemy = true,
                NodeType::Boss => seen_boss = true,
                _ => unreachable!(),
            }
        }
        assert!(seen_enemy && seen_boss);
    }
}
