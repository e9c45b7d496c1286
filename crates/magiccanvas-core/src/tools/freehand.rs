//! Stroke accumulation for the pencil and eraser brushes.

use super::Brush;
use crate::shapes::Path;
use kurbo::Point;

/// Points collected between pointer-down and pointer-up.
#[derive(Debug, Clone, PartialEq)]
pub struct FreehandStroke {
    brush: Brush,
    points: Vec<Point>,
}

impl FreehandStroke {
    pub fn begin(point: Point, brush: Brush) -> Self {
        Self {
            brush,
            points: vec![point],
        }
    }

    /// Append a point, skipping exact repeats.
    pub fn extend(&mut self, point: Point) {
        if self.points.last() != Some(&point) {
            self.points.push(point);
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    /// Path for live preview.
    pub fn preview(&self) -> Path {
        let mut path = Path::from_points(self.points.clone());
        path.style = self.brush.path_style();
        path
    }

    /// Turn the stroke into a path object. A click without movement yields a dot.
    pub fn finish(self) -> Path {
        let mut path = Path::from_points(self.points);
        path.style = self.brush.path_style();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::shapes::CompositeOp;
    use crate::tools::ToolState;

    #[test]
    fn test_stroke_collects_points() {
        let brush = Brush::pencil(&ToolState::default(), &EditorConfig::default());
        let mut stroke = FreehandStroke::begin(Point::new(0.0, 0.0), brush);
        stroke.extend(Point::new(1.0, 1.0));
        stroke.extend(Point::new(1.0, 1.0));
        stroke.extend(Point::new(2.0, 3.0));
        assert_eq!(stroke.points().len(), 3);

        let path = stroke.finish();
        assert_eq!(path.len(), 3);
        assert_eq!(path.style.stroke_width, 2.0);
    }

    #[test]
    fn test_eraser_stroke_is_destructive() {
        let brush = Brush::eraser(&ToolState::default(), &EditorConfig::default());
        let stroke = FreehandStroke::begin(Point::ZERO, brush);
        let path = stroke.finish();
        assert_eq!(path.style.composite, CompositeOp::DestinationOut);
        assert_eq!(path.style.stroke_width, 4.0);
    }
}
