//! Force-directed layout for the topology visualization.
//!
//! Positioning is purely a visualization aid and has no bearing on protocol
//! correctness. The single largest component is laid out on the right side
//! of the canvas and every other component is gridded on the left, so
//! partitions are visually obvious.

use std::collections::{BTreeSet, HashMap, HashSet};

use rand::Rng;

use crate::topology::largest_component_index;

pub const CANVAS_WIDTH: f64 = 1200.0;
pub const CANVAS_HEIGHT: f64 = 800.0;

const ITERATIONS: usize = 200;
const REPULSION: f64 = 500.0;
const ATTRACTION: f64 = 0.1;
const DAMPING: f64 = 0.9;
const FORCE_STEP: f64 = 0.01;
const MARGIN: f64 = 10.0;

/// Share of the canvas width given to the largest component.
const MAIN_SHARE: f64 = 0.6;
/// Grid columns for isolated components.
const ISOLATED_COLS: usize = 4;
/// Padding around each isolated grid cell.
const CELL_PADDING: f64 = 25.0;

/// A 2D canvas position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Lay out every component on a `width` x `height` canvas.
///
/// Returns one position per node, indexed by node.
pub fn layout_components(
    adjacency: &[BTreeSet<usize>],
    components: &[Vec<usize>],
    width: f64,
    height: f64,
) -> Vec<Position> {
    let mut positions = vec![Position::default(); adjacency.len()];
    if components.is_empty() {
        return positions;
    }

    let largest = largest_component_index(components);

    // Main component on the right side of the canvas.
    let main_width = width * MAIN_SHARE;
    let main_start_x = width - main_width;
    for (node, pos) in force_directed(&components[largest], adjacency, main_width, height) {
        positions[node] = Position {
            x: pos.x + main_start_x,
            y: pos.y,
        };
    }

    let isolated: Vec<&Vec<usize>> = components
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != largest)
        .map(|(_, c)| c)
        .collect();
    if isolated.is_empty() {
        return positions;
    }

    // Isolated components gridded on the left.
    let isolated_width = width - main_width - 2.0 * CELL_PADDING;
    let rows = isolated.len().div_ceil(ISOLATED_COLS);
    let cell_width = isolated_width / ISOLATED_COLS as f64;
    let cell_height = height / rows as f64;

    for (i, cluster) in isolated.iter().enumerate() {
        let col = (i % ISOLATED_COLS) as f64;
        let row = (i / ISOLATED_COLS) as f64;
        let cell_x = col * cell_width + CELL_PADDING;
        let cell_y = row * cell_height + CELL_PADDING;
        let cell_w = (cell_width - 2.0 * CELL_PADDING).max(2.0 * MARGIN);
        let cell_h = (cell_height - 2.0 * CELL_PADDING).max(2.0 * MARGIN);

        if let [only] = cluster.as_slice() {
            positions[*only] = Position {
                x: cell_x + cell_w / 2.0,
                y: cell_y + cell_h / 2.0,
            };
        } else {
            for (node, pos) in force_directed(cluster, adjacency, cell_w, cell_h) {
                positions[node] = Position {
                    x: pos.x + cell_x,
                    y: pos.y + cell_y,
                };
            }
        }
    }

    positions
}

/// Run the force simulation for one component inside its own bounds.
///
/// Repulsion falls off with the square of the distance between every node
/// pair; attraction grows linearly with distance along edges; velocities
/// are damped each step and positions clamped to the bounds.
fn force_directed(
    cluster: &[usize],
    adjacency: &[BTreeSet<usize>],
    width: f64,
    height: f64,
) -> HashMap<usize, Position> {
    let mut rng = rand::rng();
    let mut positions: HashMap<usize, Position> = cluster
        .iter()
        .map(|&node| {
            (
                node,
                Position {
                    x: rng.random::<f64>() * width,
                    y: rng.random::<f64>() * height,
                },
            )
        })
        .collect();
    let mut velocities: HashMap<usize, Position> =
        cluster.iter().map(|&node| (node, Position::default())).collect();
    let in_cluster: HashSet<usize> = cluster.iter().copied().collect();

    for _ in 0..ITERATIONS {
        let mut forces: HashMap<usize, Position> =
            cluster.iter().map(|&node| (node, Position::default())).collect();

        // Repulsion between all node pairs in the component.
        for (i, &a) in cluster.iter().enumerate() {
            for &b in &cluster[i + 1..] {
                let pa = positions[&a];
                let pb = positions[&b];
                let dx = pa.x - pb.x;
                let dy = pa.y - pb.y;
                let dist = (dx * dx + dy * dy).sqrt().max(1.0);
                let force = REPULSION / (dist * dist);
                let fx = dx / dist * force;
                let fy = dy / dist * force;
                let fa = forces.get_mut(&a).expect("force slot");
                fa.x += fx;
                fa.y += fy;
                let fb = forces.get_mut(&b).expect("force slot");
                fb.x -= fx;
                fb.y -= fy;
            }
        }

        // Attraction along edges that stay inside the component.
        for &a in cluster {
            for &b in &adjacency[a] {
                if !in_cluster.contains(&b) {
                    continue;
                }
                let pa = positions[&a];
                let pb = positions[&b];
                let dx = pb.x - pa.x;
                let dy = pb.y - pa.y;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist > 0.0 {
                    let force = ATTRACTION * dist;
                    let fa = forces.get_mut(&a).expect("force slot");
                    fa.x += dx / dist * force;
                    fa.y += dy / dist * force;
                }
            }
        }

        // Integrate with damping; keep everything inside the bounds.
        for &node in cluster {
            let force = forces[&node];
            let velocity = velocities.get_mut(&node).expect("velocity slot");
            velocity.x = velocity.x * DAMPING + force.x * FORCE_STEP;
            velocity.y = velocity.y * DAMPING + force.y * FORCE_STEP;
            let pos = positions.get_mut(&node).expect("position slot");
            pos.x = (pos.x + velocity.x).clamp(MARGIN, width - MARGIN);
            pos.y = (pos.y + velocity.y).clamp(MARGIN, height - MARGIN);
        }
    }

    positions
}
