//! Normalized detection geometry.
//!
//! Detections locate themselves in image space with a [`GeometryQuad`]: four
//! corners in a fixed order, each coordinate normalized to `[0, 1]` against
//! the image dimensions. The quad is a plain value; derived quantities
//! (bounding frame, midpoints, edge heights) are computed on demand, and
//! [`GeometryQuad::convert_to`] maps the normalized corners onto a concrete
//! pixel canvas.
//!
//! # Coordinate conventions
//!
//! - Normalized space: origin at the bottom-left of the image, `y` grows up
//!   (the convention of the producing recognition engines).
//! - Pixel space (after `convert_to`): origin at the top-left of the target
//!   canvas, `y` grows down. The conversion flips the vertical axis.
//!
//! Quads are not validated for convexity or degeneracy; a detection may
//! legitimately collapse to a line or point and consumers must tolerate it.

use serde::Serialize;

// =============================================================================
// Point / Size / Insets / Rect
// =============================================================================

/// A 2-D point with double-precision coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Midpoint between this point and another.
    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Dimensions of a pixel canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Per-edge inset offsets applied after coordinate conversion.
///
/// Left/top insets shift corners inward by addition; right/bottom insets by
/// subtraction. All default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EdgeInsets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgeInsets {
    /// Create insets with explicit per-edge values.
    pub fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

// =============================================================================
// GeometryQuad
// =============================================================================

/// A quadrilateral locating a detection in normalized image space.
///
/// Corner order is fixed: top-left, top-right, bottom-left, bottom-right.
/// Every producer and consumer (engine adapters, the wire codec, overlay
/// callers) relies on this order; it is what makes the persisted geometry
/// encoding stable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GeometryQuad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl GeometryQuad {
    /// Create a quad from its four corners.
    pub fn new(
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        bottom_right: Point,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// Axis-aligned bounding rectangle: per-axis extrema over the four
    /// corners. Rotated quads get no special treatment.
    pub fn bounding_frame(&self) -> Rect {
        let xs = [
            self.top_left.x,
            self.top_right.x,
            self.bottom_left.x,
            self.bottom_right.x,
        ];
        let ys = [
            self.top_left.y,
            self.top_right.y,
            self.bottom_left.y,
            self.bottom_right.y,
        ];

        let min_x = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let max_x = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min_y = ys.iter().copied().fold(f64::INFINITY, f64::min);
        let max_y = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Rect {
            origin: Point::new(min_x, min_y),
            size: Size::new(max_x - min_x, max_y - min_y),
        }
    }

    /// Midpoint of the left edge (top-left, bottom-left).
    pub fn left_mid_point(&self) -> Point {
        self.top_left.midpoint(self.bottom_left)
    }

    /// Midpoint of the right edge (top-right, bottom-right).
    pub fn right_mid_point(&self) -> Point {
        self.top_right.midpoint(self.bottom_right)
    }

    /// Length of the left edge.
    pub fn left_height(&self) -> f64 {
        self.top_left.distance(self.bottom_left)
    }

    /// Length of the right edge.
    pub fn right_height(&self) -> f64 {
        self.top_right.distance(self.bottom_right)
    }

    /// Map normalized corners onto a pixel canvas of `target` dimensions.
    ///
    /// The vertical axis flips: normalized `y = 0` is the bottom of the
    /// image, pixel `y = 0` is the top of the canvas. Insets then shift each
    /// corner toward the canvas interior: left corners add `insets.left`,
    /// right corners subtract `insets.right`, top corners add `insets.top`,
    /// bottom corners subtract `insets.bottom`.
    pub fn convert_to(&self, target: Size, insets: EdgeInsets) -> GeometryQuad {
        let w = target.width;
        let h = target.height;

        GeometryQuad {
            top_left: Point::new(
                self.top_left.x * w + insets.left,
                h - self.top_left.y * h + insets.top,
            ),
            top_right: Point::new(
                self.top_right.x * w - insets.right,
                h - self.top_right.y * h + insets.top,
            ),
            bottom_left: Point::new(
                self.bottom_left.x * w + insets.left,
                h - self.bottom_left.y * h - insets.bottom,
            ),
            bottom_right: Point::new(
                self.bottom_right.x * w - insets.right,
                h - self.bottom_right.y * h - insets.bottom,
            ),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
