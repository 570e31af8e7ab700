use std::f64::consts::FRAC_PI_2;

use super::{bfs_points, radial, NodeId, PlotStyle, Tree, TreePlot};
use crate::geom::{perpendicular_foot, Point};

/// Squared chord length below which an edge is drawn as a straight line.
/// Tunable flatness cutoff in layout units.
pub const GEODESIC_FLATNESS_SQ: f64 = 0.01;

/// Fraction of the bounding radius a constructed control point may sit away
/// from the tangent point before the plain chord midpoint is used instead.
pub const CONTROL_DISTANCE_RATIO: f64 = 0.3;

/// How one edge of a hyperbolic plot should be drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurvePath {
    /// Straight segment from child to parent.
    Line,
    /// One quadratic segment from child to parent through `control`.
    Quad { control: Point },
    /// Two quadratic segments meeting at the tangent point.
    Split {
        tangent: Point,
        toward_child: Point,
        toward_parent: Point,
    },
}

/// Curve hint for the edge between a parent and child node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCurve {
    pub parent: NodeId,
    pub child: NodeId,
    pub path: CurvePath,
}

pub(super) fn build(tree: &Tree, adjusting: bool) -> Option<TreePlot> {
    let base = radial::compute_base(tree)?;
    let origin = Point::default();

    let curves = base
        .edges
        .iter()
        .map(|&(parent, child)| EdgeCurve {
            parent,
            child,
            path: edge_curve(
                base.positions[child],
                base.positions[parent],
                origin,
                base.radius,
                adjusting,
            ),
        })
        .collect();

    let (node_order, points) = bfs_points(tree, &base.positions);
    Some(TreePlot {
        style: PlotStyle::Hyperbolic,
        points,
        node_order,
        edges: base.edges,
        curves,
        origin,
        radius: base.radius,
        width: base.radius * 2.0,
        height: base.radius * 2.0,
    })
}

/// Curve hint approximating a hyperbolic geodesic between a child point `p`
/// and its parent point `q` inside the bounding circle at `origin`.
///
/// Short chords, and every chord while `adjusting` is set, degrade to a
/// straight line. Otherwise the chord's tangent point (the foot of the
/// perpendicular dropped from the origin onto the chord) decides the shape:
/// a tangent point strictly inside the chord splits the edge into two
/// quadratic segments meeting there, anything else yields a single segment.
pub fn edge_curve(p: Point, q: Point, origin: Point, radius: f64, adjusting: bool) -> CurvePath {
    let chord_sq = p.distance_sq(q);
    if adjusting || chord_sq < GEODESIC_FLATNESS_SQ {
        return CurvePath::Line;
    }

    let tangent = perpendicular_foot(origin, p, q);
    if tangent.distance_sq(p) < chord_sq && tangent.distance_sq(q) < chord_sq {
        CurvePath::Split {
            tangent,
            toward_child: control_point(tangent, p, tangent, origin, radius),
            toward_parent: control_point(tangent, q, tangent, origin, radius),
        }
    } else {
        CurvePath::Quad {
            control: control_point(p, q, tangent, origin, radius),
        }
    }
}

/// Control point for the quadratic segment between `a` and `b`.
///
/// The endpoints are rotated into a canonical frame where the ray from the
/// origin through the tangent point runs along +y; the candidate control is
/// the mean of the framed x coordinates paired with the larger framed y,
/// rotated back out. Candidates straying farther than
/// [`CONTROL_DISTANCE_RATIO`] of the radius from the tangent point are
/// replaced by the frame-round-tripped chord midpoint.
fn control_point(a: Point, b: Point, tangent: Point, origin: Point, radius: f64) -> Point {
    let rotation = FRAC_PI_2 - tangent.angle_about(origin);
    let a_framed = a.rotated_about(origin, rotation);
    let b_framed = b.rotated_about(origin, rotation);

    let candidate = Point::new(
        (a_framed.x + b_framed.x) * 0.5,
        a_framed.y.max(b_framed.y),
    );
    let control = candidate.rotated_about(origin, -rotation);

    let limit = CONTROL_DISTANCE_RATIO * radius;
    if control.distance_sq(tangent) > limit * limit {
        a_framed
            .midpoint(b_framed)
            .rotated_about(origin, -rotation)
    } else {
        control
    }
}
