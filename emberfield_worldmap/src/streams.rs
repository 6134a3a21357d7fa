// Procedural stream generation: the branching veins of content that make a
// freshly built grid worth exploring.
//
// Generation is a breadth-first fork expansion. A queue starts with one fork
// at the origin pointing along the configured seed direction. Each fork
// draws a level-biased fork count, and each candidate fork rotates the
// parent direction by a random angle inside the configured band, projects
// `fork_distance` along the rotated direction in the x/z plane, snaps the
// landing point to a hex with `CubeCoord::round`, and asks A* for a path
// from the fork origin to it. A successful path is carved (`Empty` nodes
// become `Resource`), the endpoint draws its content from the weighted
// table, and the endpoint becomes a new fork origin unless it sits on the
// grid boundary. Unreachable or out-of-grid candidates are skipped without
// comment; thin streams on cramped grids are a valid outcome.
//
// The queue cap bounds total work. Forks that reach the boundary or fail
// all their candidates drain the queue, so generation always terminates.
//
// See also: `pathfinding.rs` for the carve search, `config.rs` for
// `StreamProfile`, `grid.rs` which runs this once per (re)build.
//
// **Critical constraint: determinism.** Every random draw flows through the
// grid's `WorldRng` in a fixed order (fork count, then per candidate angle
// sign, angle magnitude, endpoint content), so one (config, seed) pair
// always yields one layout.

use crate::coord::CubeCoord;
use crate::grid::HexGrid;
use crate::node::NodeType;
use crate::pathfinding::find_path;
use emberfield_prng::WorldRng;
use std::collections::VecDeque;

/// A pending fork: where the next branches sprout from, and the direction
/// the stream was flowing when it got there.
struct Fork {
    origin: CubeCoord,
    direction: [f32; 2],
}

/// Run stream generation over a freshly built grid. Called exactly once per
/// (re)build, before any node leaves `Unrevealed`.
pub(crate) fn generate(grid: &mut HexGrid) {
    let profile = grid.config.streams.clone();
    if profile.max_forks == 0 || profile.fork_distance == 0 {
        return;
    }

    let mut queue: VecDeque<Fork> = VecDeque::new();
    queue.push_back(Fork {
        origin: CubeCoord::ORIGIN,
        direction: normalize(profile.seed_direction),
    });

    while queue.len() <= profile.queue_cap {
        let Some(fork) = queue.pop_front() else {
            break;
        };
        let level = fork.origin.level();
        let count = fork_count(&mut grid.rng, profile.max_forks, level);

        for _ in 0..count {
            // Fair coin for the band's sign, then a uniform magnitude
            // inside it.
            let positive = grid.rng.coin_flip();
            // A degenerate band (min >= max) means a fixed fork angle.
            let magnitude = if profile.angle_min_deg < profile.angle_max_deg {
                grid.rng
                    .range_f32(profile.angle_min_deg, profile.angle_max_deg)
            } else {
                profile.angle_min_deg
            };
            let degrees = if positive { magnitude } else { -magnitude };
            let direction = rotate(fork.direction, degrees.to_radians());

            let scale = profile.fork_distance as f32;
            let fx = fork.origin.x() as f32 + direction[0] * scale;
            let fz = fork.origin.z() as f32 + direction[1] * scale;
            let target = CubeCoord::round(fx, -fx - fz, fz);

            if target == fork.origin {
                continue;
            }
            // Out-of-grid or walled-off targets are skipped silently.
            let Some(path) = find_path(grid, fork.origin, target) else {
                continue;
            };

            for &coord in &path.nodes {
                if grid.node(coord).map(|n| n.node_type) == Some(NodeType::Empty) {
                    grid.set_node_type(coord, NodeType::Resource);
                }
            }

            // Endpoint content: drawn from the weighted table. Obstacle and
            // Empty draws are not placeable on a stream (the carve must stay
            // traversable and non-empty), so those leave the endpoint as the
            // plain `Resource` the carve set.
            let content = grid.config.node_types.sample(&mut grid.rng);
            if content != NodeType::Obstacle
                && content != NodeType::Empty
                && grid.node(target).map(|n| n.node_type) == Some(NodeType::Resource)
            {
                grid.set_node_type(target, content);
            }

            enqueue_fork(&mut queue, target, direction, grid.config.grid_radius);
        }
    }
}

/// Queue a carved endpoint as a new fork origin. Endpoints on the boundary
/// ring (`level == radius`) are terminal: the stream has reached the rim and
/// never branches back inward from it.
fn enqueue_fork(
    queue: &mut VecDeque<Fork>,
    target: CubeCoord,
    direction: [f32; 2],
    radius: u32,
) {
    if target.level() < radius {
        queue.push_back(Fork {
            origin: target,
            direction,
        });
    }
}

/// Draw a fork count in `1..=max_forks`, weighted `1 / (count + level)`.
/// Deeper rings bias toward fewer forks, so streams thin out toward the
/// boundary instead of flooding it.
fn fork_count(rng: &mut WorldRng, max_forks: u32, level: u32) -> u32 {
    let total: f32 = (1..=max_forks).map(|k| 1.0 / (k + level) as f32).sum();
    let mut draw = rng.range_f32(0.0, total);
    for k in 1..max_forks {
        let weight = 1.0 / (k + level) as f32;
        if draw < weight {
            return k;
        }
        draw -= weight;
    }
    max_forks
}

/// Rotate a direction vector in the x/z plane by `radians`.
fn rotate(direction: [f32; 2], radians: f32) -> [f32; 2] {
    let (sin, cos) = radians.sin_cos();
    [
        direction[0] * cos - direction[1] * sin,
        direction[0] * sin + direction[1] * cos,
    ]
}

/// Unit-length copy of `direction`, falling back to the +x axis when the
/// configured vector is degenerate.
fn normalize(direction: [f32; 2]) -> [f32; 2] {
    let length = (direction[0] * direction[0] + direction[1] * direction[1]).sqrt();
    if length < 1e-6 {
        return [1.0, 0.0];
    }
    [direction[0] / length, direction[1] / length]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::coord::hex_range;

    #[test]
    fn same_seed_yields_same_layout() {
        let a = HexGrid::new(GridConfig::default(), 7).unwrap();
        let b = HexGrid::new(GridConfig::default(), 7).unwrap();
        for coord in hex_range(CubeCoord::ORIGIN, a.radius()) {
            assert_eq!(
                a.node(coord).unwrap().node_type,
                b.node(coord).unwrap().node_type,
                "layouts diverge at {coord}"
            );
        }
    }

    #[test]
    fn origin_is_carved_and_never_blocked() {
        for seed in 0..20 {
            let grid = HexGrid::new(GridConfig::default(), seed).unwrap();
            let origin = grid.node(CubeCoord::ORIGIN).unwrap();
            assert_ne!(origin.node_type, NodeType::Empty, "seed {seed}");
            assert!(!origin.is_blocked(), "seed {seed}");
        }
    }

    #[test]
    fn default_grid_grows_a_real_stream_network() {
        let grid = HexGrid::new(GridConfig::default(), 3).unwrap();
        let carved = hex_range(CubeCoord::ORIGIN, grid.radius())
            .into_iter()
            .filter(|&c| grid.node(c).unwrap().node_type != NodeType::Empty)
            .count();
        assert!(carved >= 3, "only {carved} carved nodes");
    }

    #[test]
    fn streams_never_carve_obstacles() {
        for seed in 0..10 {
            let grid = HexGrid::new(GridConfig::default(), seed).unwrap();
            for coord in hex_range(CubeCoord::ORIGIN, grid.radius()) {
                assert!(!grid.node(coord).unwrap().is_blocked(), "seed {seed} at {coord}");
            }
        }
    }

    #[test]
    fn cramped_grid_stays_empty_when_every_fork_overshoots() {
        // fork_distance 3 on a radius-1 grid: every candidate lands outside
        // the playfield and is skipped, leaving the grid untouched.
        let config = GridConfig {
            grid_radius: 1,
            ..GridConfig::default()
        };
        assert_eq!(config.streams.fork_distance, 3);
        let mut grid = HexGrid::new(config, 99).unwrap();
        for coord in hex_range(CubeCoord::ORIGIN, 1) {
            assert_eq!(grid.node(coord).unwrap().node_type, NodeType::Empty);
        }
        assert!(grid.drain_events().is_empty());
    }

    #[test]
    fn boundary_endpoints_are_terminal() {
        let mut queue: VecDeque<Fork> = VecDeque::new();

        // A rim endpoint (level == radius) never becomes a fork origin.
        let rim = CubeCoord::new(3, -3, 0).unwrap();
        enqueue_fork(&mut queue, rim, [1.0, 0.0], 3);
        assert!(queue.is_empty());

        // An interior endpoint does.
        let interior = CubeCoord::new(2, -2, 0).unwrap();
        enqueue_fork(&mut queue, interior, [0.0, 1.0], 3);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].origin, interior);
        assert_eq!(queue[0].direction, [0.0, 1.0]);
    }

    #[test]
    fn fork_count_stays_in_bounds() {
        let mut rng = WorldRng::new(5);
        for level in 0..10 {
            for _ in 0..1000 {
                let count = fork_count(&mut rng, 3, level);
                assert!((1..=3).contains(&count));
            }
        }
    }

    #[test]
    fn fork_count_thins_with_depth() {
        // At level 0 the weights are 1, 1/2, 1/3; at level 8 they are
        // nearly flat. Singles should be clearly more common near the core.
        let mut rng = WorldRng::new(11);
        let singles_at = |rng: &mut WorldRng, level: u32| {
            (0..20_000)
                .filter(|_| fork_count(rng, 3, level) == 1)
                .count()
        };
        let shallow = singles_at(&mut rng, 0);
        let deep = singles_at(&mut rng, 8);
        assert!(
            shallow > deep + 1_000,
            "expected level bias, got {shallow} vs {deep}"
        );
    }

    #[test]
    fn rotate_quarter_turn() {
        let turned = rotate([1.0, 0.0], std::f32::consts::FRAC_PI_2);
        assert!((turned[0] - 0.0).abs() < 1e-6);
        assert!((turned[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_handles_degenerate_input() {
        assert_eq!(normalize([0.0, 0.0]), [1.0, 0.0]);
        let n = normalize([3.0, 4.0]);
        assert!((n[0] - 0.6).abs() < 1e-6);
        assert!((n[1] - 0.8).abs() < 1e-6);
    }
}
