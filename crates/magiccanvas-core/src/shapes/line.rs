//! Straight line segment.

use super::{ObjectFlags, ObjectId, ShapeStyle, ShapeTrait, new_object_id, point_to_segment_dist};
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A line segment. The dash pattern lives in the style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub(crate) id: ObjectId,
    pub start: Point,
    pub end: Point,
    pub style: ShapeStyle,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            id: new_object_id(),
            start,
            end,
            style: ShapeStyle::default(),
            flags: ObjectFlags::default(),
        }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }
}

impl ShapeTrait for Line {
    fn id(&self) -> &str {
        &self.id
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_segment_dist(point, self.start, self.end) <= tolerance + self.style.stroke_width / 2.0
    }

    fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(self.start);
        path.line_to(self.end);
        path
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn flags(&self) -> ObjectFlags {
        self.flags
    }

    fn flags_mut(&mut self) -> &mut ObjectFlags {
        &mut self.flags
    }

    fn translate(&mut self, delta: Vec2) {
        self.start += delta;
        self.end += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_bounds_normalized() {
        let line = Line::new(Point::new(100.0, 0.0), Point::new(0.0, 50.0));
        assert_eq!(line.bounds(), Rect::new(0.0, 0.0, 100.0, 50.0));
        assert!((line.length() - (100.0f64.powi(2) + 50.0f64.powi(2)).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test() {
        let line = Line::new(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(line.hit_test(Point::new(50.0, 2.0), 2.0));
        assert!(!line.hit_test(Point::new(50.0, 20.0), 2.0));
    }
}
