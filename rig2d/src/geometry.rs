use glam::Vec2;

/// Distances below this are treated as coincident points.
pub(crate) const EPSILON: f32 = 1.0e-6;

/// Unit vector pointing from `from` to `to`.
///
/// Coincident points have no direction; +X is used so solvers can always place
/// a joint at a definite distance.
pub(crate) fn direction(from: Vec2, to: Vec2) -> Vec2 {
    let delta = to - from;
    let len = delta.length();
    if len <= EPSILON || !len.is_finite() {
        Vec2::X
    } else {
        delta / len
    }
}

/// Angle of the segment `from -> to` in radians, in `(-PI, PI]`.
pub(crate) fn segment_angle(from: Vec2, to: Vec2) -> f32 {
    let delta = to - from;
    delta.y.atan2(delta.x)
}

pub(crate) fn rotate(v: Vec2, radians: f32) -> Vec2 {
    Vec2::from_angle(radians).rotate(v)
}

/// Clamps `angle` into `[a, b]`, accepting the limits in either order.
pub(crate) fn clamp_angle(angle: f32, a: f32, b: f32) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    angle.clamp(lo, hi)
}

/// Axis-aligned bounding box in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn from_point(p: Vec2) -> Self {
        Self { min: p, max: p }
    }

    pub fn from_points<I: IntoIterator<Item = Vec2>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut out = Self::from_point(first);
        for p in iter {
            out.include(p);
        }
        Some(out)
    }

    pub fn include(&mut self, p: Vec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}
