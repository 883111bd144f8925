//! Device-space geometry shared by gestures and the platform port.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Pixel coordinates as handed to the platform (truncating, like an
    /// integer cast on the device side).
    pub fn to_pixels(self) -> (i32, i32) {
        (self.x as i32, self.y as i32)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Display dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn shorter_side(&self) -> u32 {
        self.width.min(self.height)
    }

    /// The display as a rectangle anchored at the origin.
    pub fn as_rect(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }
}

/// Axis-aligned rectangle. Points on any of its four edges are inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn origin(&self) -> Point {
        Point::new(self.left as f64, self.top as f64)
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.left as f64 + self.width() as f64 / 2.0,
            self.top as f64 + self.height() as f64 / 2.0,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left as f64
            && point.x <= self.right as f64
            && point.y >= self.top as f64
            && point.y <= self.bottom as f64
    }

    /// `[left,top][right,bottom]`, the notation used by hierarchy dumps.
    pub fn to_short_string(&self) -> String {
        format!(
            "[{},{}][{},{}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_dimensions_and_center() {
        let rect = Rect::new(10, 20, 110, 220);
        assert_eq!(rect.width(), 100);
        assert_eq!(rect.height(), 200);
        assert_eq!(rect.center(), Point::new(60.0, 120.0));
        assert_eq!(rect.origin(), Point::new(10.0, 20.0));
    }

    #[test]
    fn test_rect_contains_edges() {
        let rect = Rect::new(0, 0, 100, 100);
        assert!(rect.contains(Point::new(0.0, 0.0)));
        assert!(rect.contains(Point::new(100.0, 100.0)));
        assert!(!rect.contains(Point::new(100.5, 50.0)));
        assert!(!rect.contains(Point::new(-1.0, 50.0)));
    }

    #[test]
    fn test_short_string() {
        assert_eq!(Rect::new(1, 2, 3, 4).to_short_string(), "[1,2][3,4]");
    }

    #[test]
    fn test_size_shorter_side() {
        assert_eq!(Size::new(1080, 1920).shorter_side(), 1080);
        assert_eq!(Size::new(1920, 1080).shorter_side(), 1080);
        assert_eq!(Size::new(800, 600).as_rect(), Rect::new(0, 0, 800, 600));
    }

    #[test]
    fn test_point_to_pixels_truncates() {
        assert_eq!(Point::new(10.9, -3.7).to_pixels(), (10, -3));
    }
}
