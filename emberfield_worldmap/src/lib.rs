// emberfield_worldmap — pure Rust world-map library.
//
// This crate contains all world-map logic for Emberfield: the hex grid,
// procedural stream generation, A* pathfinding, and the exploration state
// machine. It has zero rendering dependencies and can be tested,
// benchmarked, and run headless.
//
// Module overview:
// - `coord.rs`:       CubeCoord — validated cube coordinates, distance, rounding, region enumeration.
// - `node.rs`:        HexNode + NodeType + ExplorationState — one cell of the map.
// - `grid.rs`:        HexGrid — node storage, neighbor cache, exploration gate, change events.
// - `pathfinding.rs`: A* pathfinding over the grid.
// - `streams.rs`:     Branching stream generator (angle rotation + cube rounding + A* carving).
// - `config.rs`:      GridConfig + StreamProfile + NodeTypeTable — all tunable parameters.
// - `event.rs`:       GridEvent change records, drained by the presentation layer.
// - `prng`:           Re-exported from `emberfield_prng` — xoshiro256++ PRNG with SplitMix64 seeding.
//
// Presentation layers sit on top of this crate: they render from `&HexNode`
// references, drain `GridEvent`s for incremental updates, and drive all
// mutation through the exploration gate. That boundary is enforced at the
// compiler level — this crate cannot depend on rendering or frame timing.
//
// **Critical constraint: determinism.** A map is a pure function:
// `(config, seed) -> layout`. All randomness comes from a seeded
// xoshiro256++ PRNG (re-exported from `emberfield_prng`). No `HashMap` in
// iterated positions, no system time, no OS entropy. Use `BTreeMap` for
// ordered collections.

pub mod config;
pub mod coord;
pub mod event;
pub mod grid;
pub mod node;
pub mod pathfinding;
pub use emberfield_prng as prng;
mod streams;
