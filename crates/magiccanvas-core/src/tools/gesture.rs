//! Press / drag / release protocol of the shape tool.

use super::{ShapeKind, ToolState};
use crate::config::EditorConfig;
use crate::scene::Scene;
use crate::shapes::{Circle, Line, ObjectFlags, ObjectId, Rectangle, Shape, Triangle};
use kurbo::Point;

/// A shape being sized by a drag.
///
/// The object is added to the scene at press time with zero size and updated in place,
/// so the renderer shows it growing under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeGesture {
    anchor: Point,
    object_id: ObjectId,
    kind: ShapeKind,
}

impl ShapeGesture {
    /// Start a shape at `anchor` using the tool state as of this press.
    pub fn press(anchor: Point, state: &ToolState, config: &EditorConfig, scene: &mut Scene) -> Self {
        let style = state.shape_style(config);
        let mut shape = match state.shape_kind {
            ShapeKind::Rectangle => {
                let mut rect = Rectangle::new(anchor, 0.0, 0.0);
                rect.style = style;
                Shape::Rectangle(rect)
            }
            ShapeKind::Circle => {
                let mut circle = Circle::new(anchor, 0.0);
                circle.style = style;
                Shape::Circle(circle)
            }
            ShapeKind::Triangle => {
                let mut tri = Triangle::new(anchor, 0.0, 0.0);
                tri.style = style;
                Shape::Triangle(tri)
            }
            ShapeKind::Line => {
                let mut line = Line::new(anchor, anchor);
                line.style = style;
                Shape::Line(line)
            }
        };
        // Pending shapes are neither pickable nor hit-testable.
        *shape.flags_mut() = ObjectFlags::empty();

        let object_id = shape.id().to_string();
        scene.push_undo();
        scene.add(shape);
        log::debug!("Started {:?} {object_id} at {anchor:?}", state.shape_kind);

        Self {
            anchor,
            object_id,
            kind: state.shape_kind,
        }
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Resize the pending shape so it spans from the anchor to `pointer`.
    pub fn drag(&self, pointer: Point, state: &ToolState, scene: &mut Scene) {
        let Some(shape) = scene.get_mut(&self.object_id) else {
            return;
        };
        match shape {
            Shape::Rectangle(rect) => rect.set_corners(self.anchor, pointer),
            Shape::Triangle(tri) => tri.set_corners(self.anchor, pointer),
            Shape::Circle(circle) => circle.set_from_drag(self.anchor, pointer),
            Shape::Line(line) => {
                line.end = pointer;
                line.style.stroke_style = state.line_style;
            }
            _ => {}
        }
    }

    /// Finalize: the shape becomes a normal selectable object and the active one.
    /// Zero-size shapes from a click without drag are kept.
    pub fn release(self, scene: &mut Scene) -> ObjectId {
        if let Some(shape) = scene.get_mut(&self.object_id) {
            *shape.flags_mut() = ObjectFlags::default();
        }
        scene.select(&self.object_id);
        self.object_id
    }
}
