//! Page-space geometry and the viewport-to-page coordinate mapper.
//!
//! All annotation coordinates live in page space: the fixed logical
//! width/height of one page, top-left origin, independent of on-screen zoom.
//! Everything here is pure; malformed input degrades to the origin instead
//! of erroring.

use serde::{Deserialize, Serialize};

/// Page-space point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle in page space, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Normalize two drag corners into a rectangle. Dragging in any of the
    /// four directions yields the same top-left corner and non-negative
    /// extent.
    pub fn from_drag(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Zero-area rectangles commit as no-ops throughout the editor.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(&self, point: &Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
}

/// On-screen bounding box of the displayed page element, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayBounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayBounds {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    fn is_valid(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }
}

/// Map a pointer position in viewport pixels into page space.
///
/// `scale_x`/`scale_y` are the on-screen scale factors (displayed size over
/// logical page size), so the mapping is invertible and the stored
/// coordinates do not change when the page is rendered larger or smaller.
/// Malformed bounds or scales degrade to `Point::ZERO`.
pub fn to_page_space(
    pointer_x: f32,
    pointer_y: f32,
    bounds: DisplayBounds,
    scale_x: f32,
    scale_y: f32,
) -> Point {
    if !bounds.is_valid()
        || !pointer_x.is_finite()
        || !pointer_y.is_finite()
        || !scale_x.is_finite()
        || !scale_y.is_finite()
        || scale_x <= 0.0
        || scale_y <= 0.0
    {
        return Point::ZERO;
    }

    Point::new((pointer_x - bounds.left) / scale_x, (pointer_y - bounds.top) / scale_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 0.001);
    }

    #[test]
    fn drag_normalization_is_direction_independent() {
        let down_right = Rect::from_drag(Point::new(40.0, 40.0), Point::new(100.0, 100.0));
        let up_left = Rect::from_drag(Point::new(100.0, 100.0), Point::new(40.0, 40.0));
        let down_left = Rect::from_drag(Point::new(100.0, 40.0), Point::new(40.0, 100.0));
        let up_right = Rect::from_drag(Point::new(40.0, 100.0), Point::new(100.0, 40.0));

        for rect in [down_right, up_left, down_left, up_right] {
            assert_eq!(rect, Rect::new(40.0, 40.0, 60.0, 60.0));
            assert!(rect.width >= 0.0 && rect.height >= 0.0);
        }
    }

    #[test]
    fn zero_area_rect_is_empty() {
        let rect = Rect::from_drag(Point::new(10.0, 10.0), Point::new(10.0, 50.0));
        assert!(rect.is_empty());
    }

    #[test]
    fn maps_viewport_to_page_space() {
        let bounds = DisplayBounds::new(100.0, 50.0, 1224.0, 1584.0);
        // Page displayed at 2x.
        let point = to_page_space(300.0, 250.0, bounds, 2.0, 2.0);
        assert_eq!(point, Point::new(100.0, 100.0));
    }

    #[test]
    fn mapping_is_scale_invariant() {
        // Same page pixel hit at 1x and 2x display scale must produce the
        // same page coordinate.
        let bounds_1x = DisplayBounds::new(0.0, 0.0, 612.0, 792.0);
        let bounds_2x = DisplayBounds::new(0.0, 0.0, 1224.0, 1584.0);

        let at_1x = to_page_space(153.0, 198.0, bounds_1x, 1.0, 1.0);
        let at_2x = to_page_space(306.0, 396.0, bounds_2x, 2.0, 2.0);
        assert_eq!(at_1x, at_2x);
    }

    #[test]
    fn malformed_bounds_degrade_to_origin() {
        let zero_size = DisplayBounds::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(to_page_space(50.0, 50.0, zero_size, 1.0, 1.0), Point::ZERO);

        let nan_bounds = DisplayBounds::new(f32::NAN, 0.0, 100.0, 100.0);
        assert_eq!(to_page_space(50.0, 50.0, nan_bounds, 1.0, 1.0), Point::ZERO);

        let ok_bounds = DisplayBounds::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(to_page_space(50.0, 50.0, ok_bounds, 0.0, 1.0), Point::ZERO);
    }
}
