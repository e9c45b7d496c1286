//! Circle shape.

use super::{ObjectFlags, ObjectId, ShapeStyle, ShapeTrait, new_object_id};
use kurbo::{BezPath, Circle as KurboCircle, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// A circle positioned by the top-left corner of its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub(crate) id: ObjectId,
    /// Top-left corner of the bounding box.
    pub position: Point,
    pub radius: f64,
    pub style: ShapeStyle,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Circle {
    pub fn new(position: Point, radius: f64) -> Self {
        Self {
            id: new_object_id(),
            position,
            radius,
            style: ShapeStyle::default(),
            flags: ObjectFlags::default(),
        }
    }

    /// Size the circle from a drag: the radius is half the anchor-pointer distance and the
    /// box starts at the smaller coordinates of the two points.
    pub fn set_from_drag(&mut self, anchor: Point, pointer: Point) {
        self.radius = anchor.distance(pointer) / 2.0;
        self.position = Point::new(anchor.x.min(pointer.x), anchor.y.min(pointer.y));
    }

    pub fn center(&self) -> Point {
        self.position + Vec2::new(self.radius, self.radius)
    }
}

impl ShapeTrait for Circle {
    fn id(&self) -> &str {
        &self.id
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.radius * 2.0,
            self.position.y + self.radius * 2.0,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dist = point.distance(self.center());
        let pad = tolerance + self.style.stroke_width / 2.0;
        if self.style.fill_color.is_some() {
            dist <= self.radius + pad
        } else {
            (dist - self.radius).abs() <= pad
        }
    }

    fn to_path(&self) -> BezPath {
        KurboCircle::new(self.center(), self.radius).to_path(0.1)
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
        self.position += delta;
    }
}
