//! Positions, bounds and line-of-sight geometry.
//!
//! Contains helpers for:
//! - Euclidean distance in 3-D (and its square for range checks)
//! - Planar angles between points and degree/radian conversion
//! - Axis bounds with clamp / wrap / contains
//! - Segment vs. obstacle intersection on the x/y plane

use serde::{Deserialize, Serialize};

/// A point in the simulated world.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Position { x, y, z }
    }

    /// Squared Euclidean distance. Range checks compare squares to skip the sqrt.
    pub fn distance2(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn distance(&self, other: &Position) -> f64 {
        self.distance2(other).sqrt()
    }

    /// Move `step` units towards `target`, stopping on it if closer than `step`.
    pub fn step_towards(&self, target: &Position, step: f64) -> Position {
        let d = self.distance(target);
        if d <= step || d == 0.0 {
            return *target;
        }
        let f = step / d;
        Position {
            x: self.x + (target.x - self.x) * f,
            y: self.y + (target.y - self.y) * f,
            z: self.z + (target.z - self.z) * f,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

pub fn degree_to_radian(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

pub fn radian_to_degree(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

/// Direction of the vector `from → to` on the x/y plane, in `[0, 360)`.
///
/// Zero is the positive x axis, angles grow counter-clockwise. Identical
/// points yield 0.
pub fn angle_between_points_in_degrees(from: &Position, to: &Position) -> f64 {
    let angle = radian_to_degree((to.y - from.y).atan2(to.x - from.x)).rem_euclid(360.0);
    // rem_euclid can round a tiny negative angle up to exactly 360
    if angle >= 360.0 { 0.0 } else { angle }
}

/// Inclusive `[min, max]` range of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub const fn new(min: f64, max: f64) -> Self {
        AxisRange { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.max(self.min).min(self.max)
    }

    /// Torus wrap. A zero-width axis collapses to `min`.
    pub fn wrap(&self, v: f64) -> f64 {
        let span = self.span();
        if span <= 0.0 {
            return self.min;
        }
        if self.contains(v) {
            return v;
        }
        self.min + (v - self.min).rem_euclid(span)
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// The bounding box every node position must stay inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: AxisRange,
    pub y: AxisRange,
    #[serde(default = "flat_axis")]
    pub z: AxisRange,
}

fn flat_axis() -> AxisRange {
    AxisRange::new(0.0, 0.0)
}

impl Bounds {
    pub const fn new(x: AxisRange, y: AxisRange, z: AxisRange) -> Self {
        Bounds { x, y, z }
    }

    /// A flat `width × height` area anchored at the origin.
    pub const fn planar(width: f64, height: f64) -> Self {
        Bounds {
            x: AxisRange::new(0.0, width),
            y: AxisRange::new(0.0, height),
            z: AxisRange::new(0.0, 0.0),
        }
    }

    pub fn contains(&self, p: &Position) -> bool {
        self.x.contains(p.x) && self.y.contains(p.y) && self.z.contains(p.z)
    }

    pub fn clamp(&self, p: &Position) -> Position {
        Position::new(self.x.clamp(p.x), self.y.clamp(p.y), self.z.clamp(p.z))
    }

    pub fn wrap(&self, p: &Position) -> Position {
        Position::new(self.x.wrap(p.x), self.y.wrap(p.y), self.z.wrap(p.z))
    }

    /// Name of the first invalid axis, if any.
    pub fn invalid_axis(&self) -> Option<&'static str> {
        [("x", &self.x), ("y", &self.y), ("z", &self.z)]
            .into_iter()
            .find(|(_, axis)| !axis.is_valid())
            .map(|(name, _)| name)
    }
}

// ---------- Obstacles (x/y plane) ----------

/// Axis-aligned rectangle given by two opposite corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectArea {
    pub top_left: Position,
    pub bottom_right: Position,
}

/// Circle on the x/y plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleArea {
    pub center: Position,
    pub radius: f64,
}

/// Obstacles blocking line of sight. Only x and y are considered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Obstacle {
    Rectangle(RectArea),
    Circle(CircleArea),
}

/// True when the straight segment `a–b` crosses any obstacle.
///
/// A degenerate segment (`a == b` on the plane) is treated as a point test.
pub fn is_blocked(a: &Position, b: &Position, obstacles: &[Obstacle]) -> bool {
    let degenerate = a.x == b.x && a.y == b.y;
    obstacles.iter().any(|obs| match obs {
        Obstacle::Rectangle(rect) if degenerate => point_in_rect(a, rect),
        Obstacle::Circle(circle) if degenerate => point_in_circle(a, circle),
        Obstacle::Rectangle(rect) => segment_intersects_rect(a, b, rect),
        Obstacle::Circle(circle) => segment_intersects_circle(a, b, circle),
    })
}

/// (left, right, top, bottom) regardless of corner order.
fn rect_edges(rect: &RectArea) -> (f64, f64, f64, f64) {
    (
        rect.top_left.x.min(rect.bottom_right.x),
        rect.top_left.x.max(rect.bottom_right.x),
        rect.top_left.y.min(rect.bottom_right.y),
        rect.top_left.y.max(rect.bottom_right.y),
    )
}

pub fn point_in_rect(p: &Position, rect: &RectArea) -> bool {
    let (left, right, top, bottom) = rect_edges(rect);
    p.x >= left && p.x <= right && p.y >= top && p.y <= bottom
}

pub fn point_in_circle(p: &Position, circle: &CircleArea) -> bool {
    let dx = p.x - circle.center.x;
    let dy = p.y - circle.center.y;
    dx * dx + dy * dy <= circle.radius * circle.radius
}

fn segment_intersects_rect(a: &Position, b: &Position, rect: &RectArea) -> bool {
    if point_in_rect(a, rect) || point_in_rect(b, rect) {
        return true;
    }
    let (left, right, top, bottom) = rect_edges(rect);
    let corners = [
        Position::new(left, top, 0.0),
        Position::new(right, top, 0.0),
        Position::new(right, bottom, 0.0),
        Position::new(left, bottom, 0.0),
    ];
    (0..4).any(|i| segments_intersect(a, b, &corners[i], &corners[(i + 1) % 4]))
}

/// Closest point of the segment to the circle center, by clamped projection.
fn segment_intersects_circle(a: &Position, b: &Position, circle: &CircleArea) -> bool {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((circle.center.x - a.x) * dx + (circle.center.y - a.y) * dy) / len2).clamp(0.0, 1.0)
    };
    let closest = Position::new(a.x + t * dx, a.y + t * dy, 0.0);
    point_in_circle(&closest, circle)
}

/// 1 clockwise, -1 counter-clockwise, 0 collinear.
fn orientation(a: &Position, b: &Position, c: &Position) -> i8 {
    let val = (b.y - a.y) * (c.x - b.x) - (b.x - a.x) * (c.y - b.y);
    if val > 0.0 {
        1
    } else if val < 0.0 {
        -1
    } else {
        0
    }
}

/// Whether `b` lies within the bounding box of `a–c` (collinearity assumed).
fn on_segment(a: &Position, b: &Position, c: &Position) -> bool {
    b.x >= a.x.min(c.x) && b.x <= a.x.max(c.x) && b.y >= a.y.min(c.y) && b.y <= a.y.max(c.y)
}

/// Segment–segment intersection including touching endpoints and collinear overlap.
pub fn segments_intersect(p1: &Position, q1: &Position, p2: &Position, q2: &Position) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }
    (o1 == 0 && on_segment(p1, p2, q1))
        || (o2 == 0 && on_segment(p1, q2, q1))
        || (o3 == 0 && on_segment(p2, p1, q2))
        || (o4 == 0 && on_segment(p2, q1, q2))
}
