use bevy::math::{Rect, Vec2};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

// Screen-style coordinates: y grows downwards, so `min.y` is the top edge.

/// Corner of a rectangle, used to place a probe so that this corner sits on a point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    pub fn of(self, rect: Rect) -> Vec2 {
        match self {
            Corner::TopLeft => rect.min,
            Corner::TopRight => Vec2::new(rect.max.x, rect.min.y),
            Corner::BottomLeft => Vec2::new(rect.min.x, rect.max.y),
            Corner::BottomRight => rect.max,
        }
    }
}

/// Point with exact (bit-level) equality and hashing, usable as a graph key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NavPoint {
    pub x: OrderedFloat<f32>,
    pub y: OrderedFloat<f32>,
}

impl NavPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x.0, self.y.0)
    }

    pub fn distance(self, other: NavPoint) -> f32 {
        self.to_vec2().distance(other.to_vec2())
    }
}

impl From<Vec2> for NavPoint {
    fn from(v: Vec2) -> Self {
        NavPoint::new(v.x, v.y)
    }
}

impl From<NavPoint> for Vec2 {
    fn from(p: NavPoint) -> Self {
        p.to_vec2()
    }
}

/// Strict overlap: rectangles sharing only an edge do not collide.
pub fn collides(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && a.max.x > b.min.x && a.min.y < b.max.y && a.max.y > b.min.y
}

/// Grow the total width and height by `dw` and `dh`, keeping the center.
pub fn inflate(rect: Rect, dw: f32, dh: f32) -> Rect {
    Rect::from_center_size(rect.center(), rect.size() + Vec2::new(dw, dh))
}

/// Rectangle of `size` whose `corner` sits exactly on `point`.
pub fn place_corner(size: Vec2, corner: Corner, point: Vec2) -> Rect {
    let min = match corner {
        Corner::TopLeft => point,
        Corner::TopRight => Vec2::new(point.x - size.x, point.y),
        Corner::BottomLeft => Vec2::new(point.x, point.y - size.y),
        Corner::BottomRight => point - size,
    };
    Rect::from_corners(min, min + size)
}

pub fn translate(rect: Rect, offset: Vec2) -> Rect {
    Rect {
        min: rect.min + offset,
        max: rect.max + offset,
    }
}

/// Clip the segment `a -> b` against the closed rectangle (Liang-Barsky).
///
/// Returns the clipped endpoints, or `None` when the segment misses the rectangle.
pub fn clip_line(rect: Rect, a: Vec2, b: Vec2) -> Option<(Vec2, Vec2)> {
    let d = b - a;
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;

    let checks = [
        (-d.x, a.x - rect.min.x),
        (d.x, rect.max.x - a.x),
        (-d.y, a.y - rect.min.y),
        (d.y, rect.max.y - a.y),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((a + d * t0, a + d * t1))
}

/// True when the segment crosses the rectangle over a non-zero length.
///
/// Grazing a single corner clips to a degenerate point and does not count.
pub fn segment_hits(rect: Rect, a: Vec2, b: Vec2) -> bool {
    match clip_line(rect, a, b) {
        Some((p, q)) => p != q,
        None => false,
    }
}

pub fn ray_intersects<'a>(a: Vec2, b: Vec2, obstacles: impl IntoIterator<Item = &'a Rect>) -> bool {
    obstacles.into_iter().any(|rect| segment_hits(*rect, a, b))
}

/// Swept-rectangle test: does moving `from` to `to` (same size) touch any obstacle?
///
/// Each obstacle is grown by the probe size and the segment joining the two
/// centers is clipped against it.
pub fn sweep_intersects<'a>(from: Rect, to: Rect, obstacles: impl IntoIterator<Item = &'a Rect>) -> bool {
    let size = from.size();
    let (a, b) = (from.center(), to.center());
    obstacles
        .into_iter()
        .any(|rect| segment_hits(inflate(*rect, size.x, size.y), a, b))
}

/// Bearing of `v` in degrees, in `(-180, 180]`.
pub fn bearing_degrees(v: Vec2) -> f32 {
    v.y.atan2(v.x).to_degrees()
}
