use super::{bfs_points, NodeId, PlotStyle, Tree, TreePlot, DEFAULT_BRANCH_LENGTH};
use crate::geom::Point;

pub(super) fn build(tree: &Tree) -> Option<TreePlot> {
    let root = tree.root?;
    let mut positions = vec![Point::default(); tree.len()];

    // Postorder pass: leaves take consecutive vertical slots, an internal node
    // sits midway between its first and last child.
    let mut next_leaf_index = 0usize;
    assign_vertical(tree, root, &mut next_leaf_index, &mut positions);

    // Preorder pass: horizontal offsets accumulate branch lengths from the root.
    let mut edges = Vec::with_capacity(tree.len().saturating_sub(1));
    assign_horizontal(tree, root, 0.0, &mut positions, &mut edges);

    let width = positions
        .iter()
        .map(|point| point.x)
        .fold(0.0f64, f64::max)
        .max(1e-6);
    let height = if next_leaf_index > 1 {
        (next_leaf_index - 1) as f64
    } else {
        1.0
    };

    let (node_order, points) = bfs_points(tree, &positions);
    Some(TreePlot {
        style: PlotStyle::Linear,
        points,
        node_order,
        edges,
        curves: Vec::new(),
        origin: Point::default(),
        radius: 0.0,
        width,
        height,
    })
}

fn assign_vertical(
    tree: &Tree,
    id: NodeId,
    next_leaf_index: &mut usize,
    positions: &mut [Point],
) -> f64 {
    let node = &tree.nodes[id];

    let y = if node.is_leaf() {
        let y = *next_leaf_index as f64;
        *next_leaf_index += 1;
        y
    } else {
        let mut first_y = None;
        let mut last_y = 0.0;
        for &child in &node.children {
            last_y = assign_vertical(tree, child, next_leaf_index, positions);
            if first_y.is_none() {
                first_y = Some(last_y);
            }
        }
        (first_y.unwrap_or(0.0) + last_y) / 2.0
    };

    positions[id].y = y;
    y
}

fn assign_horizontal(
    tree: &Tree,
    id: NodeId,
    x: f64,
    positions: &mut [Point],
    edges: &mut Vec<(NodeId, NodeId)>,
) {
    positions[id].x = x;
    for &child in &tree.nodes[id].children {
        edges.push((id, child));
        let length = tree.nodes[child].length.unwrap_or(DEFAULT_BRANCH_LENGTH);
        assign_horizontal(tree, child, x + length, positions, edges);
    }
}
