//! Angle and rotation primitives shared by the layout engines.

/// A 2-D point in layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point.
    pub fn distance_sq(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    /// Angle of the ray from `origin` through this point, in radians.
    pub fn angle_about(self, origin: Point) -> f64 {
        (self.y - origin.y).atan2(self.x - origin.x)
    }

    /// Rotate this point about `pivot` by `angle` radians (counter-clockwise).
    pub fn rotated_about(self, pivot: Point, angle: f64) -> Point {
        let (sin, cos) = angle.sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Point::new(
            pivot.x + dx * cos - dy * sin,
            pivot.y + dx * sin + dy * cos,
        )
    }

    pub fn translated(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Foot of the perpendicular dropped from `from` onto the line through `a` and `b`.
///
/// Degenerate lines (`a == b`) collapse to `a`.
pub fn perpendicular_foot(from: Point, a: Point, b: Point) -> Point {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq <= f64::EPSILON {
        return a;
    }
    let t = ((from.x - a.x) * abx + (from.y - a.y) * aby) / len_sq;
    Point::new(a.x + t * abx, a.y + t * aby)
}
