use super::{bfs_points, NodeId, PlotStyle, Tree, TreePlot, DEFAULT_BRANCH_LENGTH};
use crate::geom::Point;

/// Scale applied to the deepest root-to-leaf path to obtain the bounding
/// circle radius. Tunable: the wedge boundary points sit on this circle, and
/// keeping them far from the nodes stops deeply nested subtrees from curling
/// back onto themselves.
pub const RADIAL_SPREAD_FACTOR: f64 = 1000.0;

pub(super) struct RadialBase {
    pub positions: Vec<Point>,
    pub edges: Vec<(NodeId, NodeId)>,
    pub radius: f64,
}

pub(super) fn compute_base(tree: &Tree) -> Option<RadialBase> {
    let root = tree.root?;

    let mut leaf_counts = vec![0usize; tree.len()];
    compute_leaf_counts(tree, root, &mut leaf_counts);

    let radius = tree.max_depth().max(DEFAULT_BRANCH_LENGTH) * RADIAL_SPREAD_FACTOR;

    let mut positions = vec![Point::default(); tree.len()];
    let mut edges = Vec::with_capacity(tree.len().saturating_sub(1));
    assign_wedge(
        tree,
        root,
        Point::default(),
        Point::new(radius, 0.0),
        std::f64::consts::TAU,
        &mut positions,
        &mut edges,
        &leaf_counts,
    );

    Some(RadialBase {
        positions,
        edges,
        radius,
    })
}

pub(super) fn build(tree: &Tree) -> Option<TreePlot> {
    let base = compute_base(tree)?;
    let (node_order, points) = bfs_points(tree, &base.positions);
    Some(TreePlot {
        style: PlotStyle::Radial,
        points,
        node_order,
        edges: base.edges,
        curves: Vec::new(),
        origin: Point::default(),
        radius: base.radius,
        width: base.radius * 2.0,
        height: base.radius * 2.0,
    })
}

/// Recursive wedge allocation. A node's wedge is bounded by rays towards
/// boundary points rather than raw angles, which sidesteps wraparound at the
/// seam. Each child takes the slice of the parent wedge proportional to its
/// leaf count, sits at branch-length distance along the bisector of that
/// slice, and recurses with the running boundary point rotated about the
/// child by its full share.
fn assign_wedge(
    tree: &Tree,
    id: NodeId,
    position: Point,
    wedge_start: Point,
    span: f64,
    positions: &mut [Point],
    edges: &mut Vec<(NodeId, NodeId)>,
    leaf_counts: &[usize],
) {
    positions[id] = position;

    let node = &tree.nodes[id];
    if node.children.is_empty() {
        return;
    }

    let total_leaves = leaf_counts[id].max(1) as f64;
    let mut boundary = wedge_start;
    for &child in &node.children {
        edges.push((id, child));

        let share = span * leaf_counts[child].max(1) as f64 / total_leaves;

        let bisector = boundary.rotated_about(position, share * 0.5);
        let angle = bisector.angle_about(position);
        let length = tree.nodes[child].length.unwrap_or(DEFAULT_BRANCH_LENGTH);
        let child_position = position.translated(length * angle.cos(), length * angle.sin());

        let child_boundary = boundary.rotated_about(child_position, share);
        assign_wedge(
            tree,
            child,
            child_position,
            child_boundary,
            share,
            positions,
            edges,
            leaf_counts,
        );

        boundary = boundary.rotated_about(position, share);
    }
}

fn compute_leaf_counts(tree: &Tree, id: NodeId, counts: &mut [usize]) -> usize {
    let node = &tree.nodes[id];
    if node.children.is_empty() {
        counts[id] = 1;
        1
    } else {
        let mut total = 0usize;
        for &child in &node.children {
            total += compute_leaf_counts(tree, child, counts);
        }
        let value = total.max(1);
        counts[id] = value;
        value
    }
}
