#![forbid(unsafe_code)]

//! Geometric primitives in viewport pixel coordinates.
//!
//! Origin is the top-left corner of the viewport; all values are
//! non-negative and arithmetic saturates instead of wrapping.

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

impl From<(u16, u16)> for Point {
    fn from((x, y): (u16, u16)) -> Self {
        Self::new(x, y)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Zero-sized value, used before anything has been measured.
    pub const ZERO: Self = Self::new(0, 0);

    /// Check if either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// An axis-aligned rectangle used for placement and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: u16,
    /// Top edge (inclusive).
    pub y: u16,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle at `origin` with the given size.
    #[inline]
    pub const fn at(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Top-left corner.
    #[inline]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Dimensions of the rectangle.
    #[inline]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Center a box of `size` inside this rectangle.
    ///
    /// A box larger than the rectangle is pinned to the rectangle's origin.
    pub fn centered(&self, size: Size) -> Rect {
        let x = self
            .x
            .saturating_add(self.width.saturating_sub(size.width) / 2);
        let y = self
            .y
            .saturating_add(self.height.saturating_sub(size.height) / 2);
        Rect::new(x, y, size.width, size.height)
    }

    /// Move this rectangle so it does not overflow `bounds` on the right or
    /// bottom edge.
    ///
    /// An overflowing edge is re-anchored at `max(0, bounds_edge - size)`;
    /// the left and top edges are left alone.
    pub fn clamp_within(&self, bounds: Size) -> Rect {
        let mut out = *self;
        if self.right() > bounds.width {
            out.x = bounds.width.saturating_sub(self.width);
        }
        if self.bottom() > bounds.height {
            out.y = bounds.height.saturating_sub(self.height);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{Point, Rect, Size};

    #[test]
    fn rect_contains_edges() {
        let rect = Rect::new(2, 3, 4, 5);
        assert!(rect.contains(Point::new(2, 3)));
        assert!(rect.contains(Point::new(5, 7)));
        assert!(!rect.contains(Point::new(6, 3)));
        assert!(!rect.contains(Point::new(2, 8)));
    }

    #[test]
    fn centered_box_fits() {
        let viewport = Rect::new(0, 0, 100, 50);
        let placed = viewport.centered(Size::new(40, 10));
        assert_eq!(placed, Rect::new(30, 20, 40, 10));
    }

    #[test]
    fn centered_box_larger_than_bounds_pins_to_origin() {
        let viewport = Rect::new(0, 0, 30, 30);
        let placed = viewport.centered(Size::new(40, 40));
        assert_eq!(placed.origin(), Point::new(0, 0));
    }

    #[test]
    fn clamp_within_leaves_fitting_rect() {
        let r = Rect::new(10, 10, 20, 20);
        assert_eq!(r.clamp_within(Size::new(100, 100)), r);
    }

    #[test]
    fn clamp_within_reanchors_right_and_bottom() {
        let r = Rect::new(90, 95, 20, 10);
        let clamped = r.clamp_within(Size::new(100, 100));
        assert_eq!(clamped, Rect::new(80, 90, 20, 10));
    }

    #[test]
    fn clamp_within_never_goes_negative() {
        let r = Rect::new(5, 5, 200, 200);
        let clamped = r.clamp_within(Size::new(100, 100));
        assert_eq!(clamped.origin(), Point::new(0, 0));
    }
}
