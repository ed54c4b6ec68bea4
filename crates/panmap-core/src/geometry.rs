use serde::{Deserialize, Serialize};

/// A 2D position, either in map space or in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A 2D displacement. Unlike a [`Point`], it ignores the origin of a transform.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: Point,
    pub max: Point,
}

impl BBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Box spanned by two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }
}

/// A 2D affine matrix with the layout used by 2D drawing contexts:
///
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
///
/// `translate` and `scale` post-multiply, so the most recently applied
/// operation is the first one a drawn point goes through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn translate(self, tx: f64, ty: f64) -> Self {
        Self {
            e: self.a * tx + self.c * ty + self.e,
            f: self.b * tx + self.d * ty + self.f,
            ..self
        }
    }

    pub fn scale(self, sx: f64, sy: f64) -> Self {
        Self {
            a: self.a * sx,
            b: self.b * sx,
            c: self.c * sy,
            d: self.d * sy,
            ..self
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    pub fn approx_eq(&self, other: &Affine, tolerance: f64) -> bool {
        (self.a - other.a).abs() < tolerance
            && (self.b - other.b).abs() < tolerance
            && (self.c - other.c).abs() < tolerance
            && (self.d - other.d).abs() < tolerance
            && (self.e - other.e).abs() < tolerance
            && (self.f - other.f).abs() < tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_corners_normalizes() {
        let bb = BBox::from_corners(Point::new(10.0, -2.0), Point::new(-4.0, 6.0));
        assert_eq!(bb.min, Point::new(-4.0, -2.0));
        assert_eq!(bb.max, Point::new(10.0, 6.0));
        assert!((bb.width() - 14.0).abs() < 1e-10);
    }

    #[test]
    fn test_translate_then_scale_order() {
        // Scale is applied to the point first, then the translation.
        let m = Affine::IDENTITY.translate(10.0, 20.0).scale(2.0, 2.0);
        let p = m.apply(Point::new(1.0, 1.0));
        assert!((p.x - 12.0).abs() < 1e-10);
        assert!((p.y - 22.0).abs() < 1e-10);
    }
}
