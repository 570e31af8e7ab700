//! Parsing and 2-D layout of phylogenetic trees.
//!
//! Raw Newick/Phylip or phyloXML text goes through a parser into the rooted
//! [`tree::Tree`] model; the layout engines turn a tree into per-node plot
//! coordinates — linear, radial, or hyperbolic with per-edge curve hints —
//! ordered by the tree's breadth-first index for an external renderer.

pub mod geom;
pub mod io;
pub mod tree;

pub use geom::Point;
pub use io::{detect_format, load_tree, ParseError, TreeFormat};
pub use tree::layout::{CurvePath, EdgeCurve, Plot, PlotStyle, TreePlot};
pub use tree::{NodeId, SharedTree, Tree, TreeNode};
