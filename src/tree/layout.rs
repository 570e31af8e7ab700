use parking_lot::Mutex;

use super::{NodeId, SharedTree, Tree};
use crate::geom::Point;

mod hyperbolic;
mod linear;
mod radial;

pub use hyperbolic::{
    edge_curve, CurvePath, EdgeCurve, CONTROL_DISTANCE_RATIO, GEODESIC_FLATNESS_SQ,
};
pub use radial::RADIAL_SPREAD_FACTOR;

/// Branch length substituted for nodes that carry no weighted model.
pub const DEFAULT_BRANCH_LENGTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotStyle {
    Linear,
    Radial,
    Hyperbolic,
}

/// Coordinates for one tree under one layout style.
///
/// `points` holds one entry per node in the tree's breadth-first order;
/// `node_order` lists the node ids in that same order so entries can be
/// correlated back to the model. Plots are rebuilt from scratch whenever the
/// tree or the layout parameters change, never patched.
#[derive(Debug, Clone)]
pub struct TreePlot {
    pub style: PlotStyle,
    pub points: Vec<Point>,
    pub node_order: Vec<NodeId>,
    pub edges: Vec<(NodeId, NodeId)>,
    /// Geodesic hints, one per edge; empty for linear and radial plots.
    pub curves: Vec<EdgeCurve>,
    pub origin: Point,
    pub radius: f64,
    pub width: f64,
    pub height: f64,
}

impl TreePlot {
    /// Build a plot for the provided tree using the specified layout style.
    pub fn from_tree(tree: &Tree, style: PlotStyle) -> Option<Self> {
        Self::from_tree_with(tree, style, false)
    }

    /// Build a plot, optionally in adjusting mode (hyperbolic edges collapse
    /// to straight lines while the view is being dragged).
    pub fn from_tree_with(tree: &Tree, style: PlotStyle, adjusting: bool) -> Option<Self> {
        match style {
            PlotStyle::Linear => linear::build(tree),
            PlotStyle::Radial => radial::build(tree),
            PlotStyle::Hyperbolic => hyperbolic::build(tree, adjusting),
        }
    }

    /// Point assigned to a node, looked up through the breadth-first order.
    pub fn point_of(&self, id: NodeId) -> Option<Point> {
        self.node_order
            .iter()
            .position(|&node| node == id)
            .map(|index| self.points[index])
    }
}

/// Reorder per-node positions into breadth-first plot order.
pub(super) fn bfs_points(tree: &Tree, positions: &[Point]) -> (Vec<NodeId>, Vec<Point>) {
    let node_order: Vec<NodeId> = tree.breadth_first().collect();
    let points = node_order.iter().map(|&id| positions[id]).collect();
    (node_order, points)
}

/// A plot bound to a shared tree, recomputed on demand.
///
/// Recomputation is serialised through a mutex so concurrent triggers cannot
/// rebuild the same plot at once; the tree is read-locked for the duration of
/// a rebuild, which keeps it exclusive against structural mutation.
pub struct Plot {
    tree: SharedTree,
    style: PlotStyle,
    state: Mutex<PlotCache>,
}

#[derive(Default)]
struct PlotCache {
    valid: bool,
    adjusting: bool,
    plot: Option<TreePlot>,
}

impl Plot {
    pub fn new(tree: SharedTree, style: PlotStyle) -> Self {
        Self {
            tree,
            style,
            state: Mutex::new(PlotCache::default()),
        }
    }

    pub fn style(&self) -> PlotStyle {
        self.style
    }

    /// Mark the cached coordinates stale; the next `validate` rebuilds them.
    pub fn invalidate(&self) {
        self.state.lock().valid = false;
    }

    /// Toggle the interactive-adjustment flag (hyperbolic plots fall back to
    /// straight edges while set).
    pub fn set_adjusting(&self, adjusting: bool) {
        let mut cache = self.state.lock();
        if cache.adjusting != adjusting {
            cache.adjusting = adjusting;
            cache.valid = false;
        }
    }

    /// Return up-to-date coordinates, rebuilding them if stale.
    pub fn validate(&self) -> Option<TreePlot> {
        let mut cache = self.state.lock();
        if !cache.valid {
            let tree = self.tree.read();
            cache.plot = TreePlot::from_tree_with(&tree, self.style, cache.adjusting);
            cache.valid = true;
        }
        cache.plot.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::RwLock;

    use super::*;
    use crate::io::newick::parse_str;

    fn parsed(text: &str) -> Tree {
        parse_str(text)
            .expect("valid test newick")
            .expect("test newick holds a tree")
    }

    #[test]
    fn linear_layout_matches_worked_example() {
        // Nodes in parse order: root=0, A=1, B=2, inner=3, C=4, D=5.
        let tree = parsed("(A:1,B:2,(C:3,D:4):5);");
        let plot = TreePlot::from_tree(&tree, PlotStyle::Linear).unwrap();

        assert_eq!(plot.points.len(), 6);
        assert_eq!(plot.node_order, vec![0, 1, 2, 3, 4, 5]);

        let expect = [
            (0, 0.0, 1.25),
            (1, 1.0, 0.0),
            (2, 2.0, 1.0),
            (3, 5.0, 2.5),
            (4, 8.0, 2.0),
            (5, 9.0, 3.0),
        ];
        for (id, x, y) in expect {
            let point = plot.point_of(id).unwrap();
            assert!((point.x - x).abs() < 1e-12, "node {id}: x {} != {x}", point.x);
            assert!((point.y - y).abs() < 1e-12, "node {id}: y {} != {y}", point.y);
        }

        assert_eq!(plot.edges.len(), 5);
        assert!((plot.width - 9.0).abs() < 1e-12);
        assert!((plot.height - 3.0).abs() < 1e-12);
    }

    #[test]
    fn linear_layout_unweighted_steps_by_default_length() {
        let mut tree = Tree::new();
        let root = tree.add_node(None, None, None);
        let inner = tree.add_node(None, None, Some(root));
        tree.add_node(Some("A".into()), None, Some(inner));
        tree.add_node(Some("B".into()), None, Some(root));

        let plot = TreePlot::from_tree(&tree, PlotStyle::Linear).unwrap();
        assert!((plot.point_of(inner).unwrap().x - DEFAULT_BRANCH_LENGTH).abs() < 1e-12);
        assert!((plot.point_of(2).unwrap().x - 2.0 * DEFAULT_BRANCH_LENGTH).abs() < 1e-12);
    }

    #[test]
    fn radial_layout_allocates_wedges_by_leaf_fraction() {
        use std::f64::consts::TAU;

        // Leaf counts under the root's children: 2, 1, 3 of 6.
        let tree = parsed("((A:1,B:1):1,C:1,(D:1,E:1,F:1):1);");
        let plot = TreePlot::from_tree(&tree, PlotStyle::Radial).unwrap();

        let root = tree.root.unwrap();
        let origin = plot.point_of(root).unwrap();
        assert!((origin.x).abs() < 1e-9 && (origin.y).abs() < 1e-9);

        let shares: Vec<f64> = tree
            .children(root)
            .iter()
            .map(|&child| TAU * tree.leaf_count_of(child) as f64 / tree.leaf_count_of(root) as f64)
            .collect();
        assert!((shares.iter().sum::<f64>() - TAU).abs() < 1e-9);

        // Each child sits on the bisector of its sub-wedge, so its angle about
        // the root is the running share total plus half its own share.
        let mut start = 0.0;
        for (&child, &share) in tree.children(root).iter().zip(&shares) {
            let point = plot.point_of(child).unwrap();
            let mut angle = point.angle_about(origin);
            if angle < 0.0 {
                angle += TAU;
            }
            let expected = (start + share * 0.5) % TAU;
            assert!(
                (angle - expected).abs() < 1e-9,
                "child {child}: angle {angle} != {expected}"
            );
            assert!((point.distance(origin) - 1.0).abs() < 1e-9);
            start += share;
        }
    }

    #[test]
    fn radial_radius_scales_tree_depth() {
        let tree = parsed("(A:1,(B:2,C:3):4);");
        let plot = TreePlot::from_tree(&tree, PlotStyle::Radial).unwrap();
        assert!((plot.radius - 7.0 * RADIAL_SPREAD_FACTOR).abs() < 1e-6);
        assert!(plot.curves.is_empty());
    }

    #[test]
    fn hyperbolic_layout_carries_one_curve_per_edge() {
        let tree = parsed("(A:1,B:2,(C:3,D:4):5);");
        let plot = TreePlot::from_tree(&tree, PlotStyle::Hyperbolic).unwrap();

        assert_eq!(plot.curves.len(), plot.edges.len());
        for (curve, &(parent, child)) in plot.curves.iter().zip(&plot.edges) {
            assert_eq!((curve.parent, curve.child), (parent, child));
        }
        // Every chord spans at least one branch length, well above flatness.
        assert!(plot.curves.iter().all(|curve| curve.path != CurvePath::Line));
    }

    #[test]
    fn hyperbolic_layout_flattens_while_adjusting() {
        let tree = parsed("(A:1,B:2,(C:3,D:4):5);");
        let plot = TreePlot::from_tree_with(&tree, PlotStyle::Hyperbolic, true).unwrap();
        assert!(plot.curves.iter().all(|curve| curve.path == CurvePath::Line));
    }

    #[test]
    fn plot_revalidates_after_tree_mutation() {
        let tree: SharedTree = Arc::new(RwLock::new(parsed("(A:1,(B:2,C:3):4);")));
        let plot = Plot::new(tree.clone(), PlotStyle::Linear);

        let before = plot.validate().unwrap();
        assert!((before.point_of(tree.read().root.unwrap()).unwrap().x).abs() < 1e-12);

        // Reroot at B (id 3: root=0, A=1, inner=2, B=3, C=4).
        tree.write().reroot(3);
        plot.invalidate();

        let after = plot.validate().unwrap();
        assert!((after.point_of(3).unwrap().x).abs() < 1e-12);
        assert_eq!(after.points.len(), before.points.len());
    }

    #[test]
    fn plot_adjusting_toggle_invalidates() {
        let tree: SharedTree = Arc::new(RwLock::new(parsed("(A:1,B:2,(C:3,D:4):5);")));
        let plot = Plot::new(tree, PlotStyle::Hyperbolic);

        plot.set_adjusting(true);
        let flat = plot.validate().unwrap();
        assert!(flat.curves.iter().all(|curve| curve.path == CurvePath::Line));

        plot.set_adjusting(false);
        let curved = plot.validate().unwrap();
        assert!(curved.curves.iter().any(|curve| curve.path != CurvePath::Line));
    }

    #[test]
    fn empty_tree_has_no_plot() {
        let tree = Tree::new();
        assert!(TreePlot::from_tree(&tree, PlotStyle::Linear).is_none());
        assert!(TreePlot::from_tree(&tree, PlotStyle::Radial).is_none());
        assert!(TreePlot::from_tree(&tree, PlotStyle::Hyperbolic).is_none());
    }
}
