//! Editable text object.

use super::{ObjectFlags, ObjectId, SerializableColor, ShapeStyle, ShapeTrait, new_object_id};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Vec2};
use serde::{Deserialize, Serialize};

/// Average glyph advance relative to the font size, used for layout estimates.
const CHAR_WIDTH_FACTOR: f64 = 0.6;
/// Line height relative to the font size.
const LINE_HEIGHT: f64 = 1.16;

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
            TextAlign::Justify => "justify",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(TextAlign::Left),
            "center" => Some(TextAlign::Center),
            "right" => Some(TextAlign::Right),
            "justify" => Some(TextAlign::Justify),
            _ => None,
        }
    }
}

/// A text object. Its color is the style's fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub(crate) id: ObjectId,
    /// Top-left corner position.
    pub position: Point,
    pub content: String,
    pub font_size: f64,
    pub font_family: String,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    pub style: ShapeStyle,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Text {
    pub fn new(position: Point, content: String) -> Self {
        let style = ShapeStyle {
            fill_color: Some(SerializableColor::black()),
            stroke_width: 0.0,
            ..ShapeStyle::default()
        };
        Self {
            id: new_object_id(),
            position,
            content,
            font_size: 20.0,
            font_family: "Arial".to_string(),
            align: TextAlign::Left,
            bold: false,
            italic: false,
            style,
            flags: ObjectFlags::default(),
        }
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn with_color(mut self, color: SerializableColor) -> Self {
        self.style.fill_color = Some(color);
        self
    }

    /// Text color.
    pub fn color(&self) -> SerializableColor {
        self.style.fill_color.unwrap_or(SerializableColor::black())
    }

    /// Estimated layout size of the content.
    pub fn approx_size(&self) -> (f64, f64) {
        let lines: Vec<&str> = self.content.split('\n').collect();
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let width = longest.max(1) as f64 * self.font_size * CHAR_WIDTH_FACTOR;
        let height = lines.len() as f64 * self.font_size * LINE_HEIGHT;
        (width, height)
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> &str {
        &self.id
    }

    fn bounds(&self) -> Rect {
        let (width, height) = self.approx_size();
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + width,
            self.position.y + height,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        // Glyph outlines are the renderer's business; the box stands in for selection.
        self.bounds().to_path(0.1)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_grow_with_content() {
        let short = Text::new(Point::ZERO, "ab".to_string()).with_font_size(10.0);
        let long = Text::new(Point::ZERO, "abcdef\nx".to_string()).with_font_size(10.0);
        assert!(long.bounds().width() > short.bounds().width());
        assert!(long.bounds().height() > short.bounds().height());
    }

    #[test]
    fn test_empty_text_still_hittable() {
        let text = Text::new(Point::new(10.0, 10.0), String::new()).with_font_size(10.0);
        assert!(text.hit_test(Point::new(12.0, 12.0), 0.0));
    }

    #[test]
    fn test_align_names() {
        for align in [TextAlign::Left, TextAlign::Center, TextAlign::Right, TextAlign::Justify] {
            assert_eq!(TextAlign::parse(align.as_str()), Some(align));
        }
        assert_eq!(TextAlign::parse("middle"), None);
    }
}
