//! Drawing objects for the vector layer.

mod circle;
mod image;
mod line;
mod path;
mod rectangle;
mod text;
mod triangle;

pub use circle::Circle;
pub use image::{Image, ImageFormat};
pub use line::Line;
pub use path::Path;
pub use rectangle::Rectangle;
pub use text::{Text, TextAlign};
pub use triangle::Triangle;

use bitflags::bitflags;
use kurbo::{BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for drawing objects.
pub type ObjectId = String;

/// Generate a fresh object identifier.
pub fn new_object_id() -> ObjectId {
    Uuid::new_v4().to_string()
}

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Parse a CSS color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)`,
    /// `transparent`, `black` or `white`.
    pub fn from_css(value: &str) -> Option<Self> {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "transparent" => return Some(Self::transparent()),
            "black" => return Some(Self::black()),
            "white" => return Some(Self::white()),
            _ => {}
        }

        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }

        let lower = value.to_ascii_lowercase();
        let inner = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |s: &str| s.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
        let alpha = match parts.get(3) {
            Some(a) => (a.parse::<f64>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
            None => 255,
        };
        Some(Self::new(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
            alpha,
        ))
    }

    /// Format as a CSS color string.
    pub fn to_css(&self) -> String {
        match self.a {
            255 => format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b),
            0 => "transparent".to_string(),
            a => format!(
                "rgba({}, {}, {}, {})",
                self.r,
                self.g,
                self.b,
                (a as f64 / 255.0 * 1000.0).round() / 1000.0
            ),
        }
    }
}

fn parse_hex(hex: &str) -> Option<SerializableColor> {
    let nibble = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(SerializableColor::new(
            nibble(0)? * 17,
            nibble(1)? * 17,
            nibble(2)? * 17,
            255,
        )),
        6 => Some(SerializableColor::new(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(SerializableColor::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Stroke dash pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    /// Cycle to the next stroke style.
    pub fn next(self) -> Self {
        match self {
            StrokeStyle::Solid => StrokeStyle::Dashed,
            StrokeStyle::Dashed => StrokeStyle::Dotted,
            StrokeStyle::Dotted => StrokeStyle::Solid,
        }
    }

    /// Dash array handed to the renderer.
    pub fn dash_array(self) -> &'static [f64] {
        match self {
            StrokeStyle::Solid => &[],
            StrokeStyle::Dashed => &[5.0, 5.0],
            StrokeStyle::Dotted => &[1.0, 3.0],
        }
    }

    /// Recover the style from a stored dash array. Unknown patterns read as dashed.
    pub fn from_dash_array(dashes: &[f64]) -> Self {
        match dashes {
            [] => StrokeStyle::Solid,
            [a, b] if *a == 1.0 && *b == 3.0 => StrokeStyle::Dotted,
            _ => StrokeStyle::Dashed,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StrokeStyle::Solid => "solid",
            StrokeStyle::Dashed => "dashed",
            StrokeStyle::Dotted => "dotted",
        }
    }
}

/// How a stroke composites onto what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompositeOp {
    /// Normal painting.
    #[default]
    SourceOver,
    /// Erases existing pixels where painted.
    DestinationOut,
}

impl CompositeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompositeOp::SourceOver => "source-over",
            CompositeOp::DestinationOut => "destination-out",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "source-over" => Some(CompositeOp::SourceOver),
            "destination-out" => Some(CompositeOp::DestinationOut),
            _ => None,
        }
    }

    /// Porter-Duff mode for vector renderers.
    pub fn compose(self) -> peniko::Compose {
        match self {
            CompositeOp::SourceOver => peniko::Compose::SrcOver,
            CompositeOp::DestinationOut => peniko::Compose::DestOut,
        }
    }
}

bitflags! {
    /// Interaction flags of a drawing object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ObjectFlags: u8 {
        /// Can become the active object.
        const SELECTABLE = 1 << 0;
        /// Receives pointer events.
        const INTERACTIVE = 1 << 1;
    }
}

impl Default for ObjectFlags {
    fn default() -> Self {
        ObjectFlags::SELECTABLE | ObjectFlags::INTERACTIVE
    }
}

/// Style properties for drawing objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Stroke color.
    pub stroke_color: SerializableColor,
    /// Stroke width.
    pub stroke_width: f64,
    /// Fill color (None = transparent).
    pub fill_color: Option<SerializableColor>,
    /// Dash pattern.
    #[serde(default)]
    pub stroke_style: StrokeStyle,
    /// Compositing mode.
    #[serde(default)]
    pub composite: CompositeOp,
}

impl ShapeStyle {
    /// Get the stroke color as a peniko Color.
    pub fn stroke(&self) -> Color {
        self.stroke_color.into()
    }

    /// Get the fill color as a peniko Color.
    pub fn fill(&self) -> Option<Color> {
        self.fill_color.map(|c| c.into())
    }

    /// Set the fill, treating a fully transparent color as no fill.
    pub fn set_fill(&mut self, color: Option<SerializableColor>) {
        self.fill_color = color.filter(|c| !c.is_transparent());
    }
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            stroke_width: 2.0,
            fill_color: None,
            stroke_style: StrokeStyle::Solid,
            composite: CompositeOp::SourceOver,
        }
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    point.distance(proj)
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => point.distance(*only),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Common trait for all drawing objects.
pub trait ShapeTrait {
    /// Get the unique identifier.
    fn id(&self) -> &str;

    /// Get the bounding box in world coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a point (in world coordinates) hits this shape.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Get the path representation for rendering.
    fn to_path(&self) -> BezPath;

    fn style(&self) -> &ShapeStyle;

    fn style_mut(&mut self) -> &mut ShapeStyle;

    fn flags(&self) -> ObjectFlags;

    fn flags_mut(&mut self) -> &mut ObjectFlags;

    /// Move the shape by a world-space delta.
    fn translate(&mut self, delta: Vec2);
}

/// Closed set of drawing object kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Path(Path),
    Rectangle(Rectangle),
    Circle(Circle),
    Triangle(Triangle),
    Line(Line),
    Text(Text),
    Image(Image),
}

impl Shape {
    /// Type name used in persisted records.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Path(_) => "path",
            Shape::Rectangle(_) => "rect",
            Shape::Circle(_) => "circle",
            Shape::Triangle(_) => "triangle",
            Shape::Line(_) => "line",
            Shape::Text(_) => "i-text",
            Shape::Image(_) => "image",
        }
    }

    pub fn id(&self) -> &str {
        self.as_trait().id()
    }

    pub fn bounds(&self) -> Rect {
        self.as_trait().bounds()
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.as_trait().hit_test(point, tolerance)
    }

    pub fn to_path(&self) -> BezPath {
        self.as_trait().to_path()
    }

    pub fn style(&self) -> &ShapeStyle {
        self.as_trait().style()
    }

    pub fn style_mut(&mut self) -> &mut ShapeStyle {
        self.as_trait_mut().style_mut()
    }

    pub fn flags(&self) -> ObjectFlags {
        self.as_trait().flags()
    }

    pub fn flags_mut(&mut self) -> &mut ObjectFlags {
        self.as_trait_mut().flags_mut()
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.as_trait_mut().translate(delta)
    }

    pub fn is_selectable(&self) -> bool {
        self.flags().contains(ObjectFlags::SELECTABLE)
    }

    pub fn is_interactive(&self) -> bool {
        self.flags().contains(ObjectFlags::INTERACTIVE)
    }

    /// Replace the identifier (used when hydrating records with missing or clashing ids).
    pub(crate) fn set_id(&mut self, id: ObjectId) {
        match self {
            Shape::Path(s) => s.id = id,
            Shape::Rectangle(s) => s.id = id,
            Shape::Circle(s) => s.id = id,
            Shape::Triangle(s) => s.id = id,
            Shape::Line(s) => s.id = id,
            Shape::Text(s) => s.id = id,
            Shape::Image(s) => s.id = id,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            Shape::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_path(&self) -> bool {
        matches!(self, Shape::Path(_))
    }

    fn as_trait(&self) -> &dyn ShapeTrait {
        match self {
            Shape::Path(s) => s,
            Shape::Rectangle(s) => s,
            Shape::Circle(s) => s,
            Shape::Triangle(s) => s,
            Shape::Line(s) => s,
            Shape::Text(s) => s,
            Shape::Image(s) => s,
        }
    }

    fn as_trait_mut(&mut self) -> &mut dyn ShapeTrait {
        match self {
            Shape::Path(s) => s,
            Shape::Rectangle(s) => s,
            Shape::Circle(s) => s,
            Shape::Triangle(s) => s,
            Shape::Line(s) => s,
            Shape::Text(s) => s,
            Shape::Image(s) => s,
        }
    }
}
