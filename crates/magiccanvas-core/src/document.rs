//! Persisted canvas document and its wire records.
//!
//! A document stores the drawing objects and the graph side by side. Records are kept
//! loose on the way in: missing or null arrays read as empty and unrecognised records are
//! skipped by the loader rather than failing the whole document.

use crate::graph::{GraphEdge, GraphError, GraphNode, NodeData, NodeKind, NodePayload};
use crate::shapes::{
    Circle, CompositeOp, Image, Line, ObjectFlags, Path, Rectangle, SerializableColor, Shape,
    ShapeStyle, StrokeStyle, Text, TextAlign, Triangle,
};
use chrono::{DateTime, Utc};
use kurbo::Point;
use serde::{Deserialize, Deserializer, Serialize};

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A point as `{x, y}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl From<Point> for PointRecord {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<PointRecord> for Point {
    fn from(p: PointRecord) -> Self {
        Point::new(p.x, p.y)
    }
}

/// A drawing object as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "type")]
    pub kind: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<PointRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_dash_array: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_composite_operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectable: Option<bool>,
}

impl ObjectRecord {
    fn write_style(&mut self, style: &ShapeStyle) {
        self.stroke = Some(style.stroke_color.to_css());
        self.stroke_width = Some(style.stroke_width);
        self.fill = Some(
            style
                .fill_color
                .map_or_else(|| "transparent".to_string(), |c| c.to_css()),
        );
        let dashes = style.stroke_style.dash_array();
        if !dashes.is_empty() {
            self.stroke_dash_array = Some(dashes.to_vec());
        }
        if style.composite != CompositeOp::SourceOver {
            self.global_composite_operation = Some(style.composite.as_str().to_string());
        }
    }

    fn read_style(&self, style: &mut ShapeStyle) {
        if let Some(stroke) = self.stroke.as_deref().and_then(SerializableColor::from_css) {
            style.stroke_color = stroke;
        }
        if let Some(width) = self.stroke_width {
            style.stroke_width = width;
        }
        if let Some(fill) = self.fill.as_deref() {
            style.set_fill(SerializableColor::from_css(fill));
        }
        if let Some(dashes) = &self.stroke_dash_array {
            style.stroke_style = StrokeStyle::from_dash_array(dashes);
        }
        if let Some(op) = self
            .global_composite_operation
            .as_deref()
            .and_then(CompositeOp::parse)
        {
            style.composite = op;
        }
    }

    fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Build the drawing object. Unknown kinds yield `None`.
    ///
    /// The record id is kept when present; otherwise the object keeps its fresh id.
    pub fn to_shape(&self) -> Option<Shape> {
        let width = self.width.unwrap_or(0.0);
        let height = self.height.unwrap_or(0.0);
        let mut shape = match self.kind.as_str() {
            "rect" | "rectangle" => Shape::Rectangle(Rectangle::new(self.origin(), width, height)),
            "circle" => Shape::Circle(Circle::new(self.origin(), self.radius.unwrap_or(0.0))),
            "triangle" => Shape::Triangle(Triangle::new(self.origin(), width, height)),
            "line" => {
                let end = Point::new(self.x2.unwrap_or(self.x), self.y2.unwrap_or(self.y));
                Shape::Line(Line::new(self.origin(), end))
            }
            "path" => {
                let points = self
                    .points
                    .iter()
                    .flatten()
                    .map(|&p| Point::from(p))
                    .collect();
                Shape::Path(Path::from_points(points))
            }
            "i-text" | "text" | "textbox" => {
                let mut text = Text::new(self.origin(), self.text.clone().unwrap_or_default());
                if let Some(size) = self.font_size {
                    text.font_size = size;
                }
                if let Some(family) = &self.font_family {
                    text.font_family = family.clone();
                }
                if let Some(align) = self.text_align.as_deref().and_then(TextAlign::parse) {
                    text.align = align;
                }
                text.bold = self.font_weight.as_deref() == Some("bold");
                text.italic = self.font_style.as_deref() == Some("italic");
                Shape::Text(text)
            }
            "image" => Shape::Image(Image::from_src(
                self.origin(),
                self.src.clone().unwrap_or_default(),
                width,
                height,
            )),
            _ => return None,
        };

        self.read_style(shape.style_mut());
        if self.selectable == Some(false) {
            shape.flags_mut().remove(ObjectFlags::SELECTABLE);
        }
        if let Some(id) = self.id.as_ref().filter(|id| !id.is_empty()) {
            shape.set_id(id.clone());
        }
        Some(shape)
    }
}

impl From<&Shape> for ObjectRecord {
    fn from(shape: &Shape) -> Self {
        let mut record = ObjectRecord {
            id: Some(shape.id().to_string()),
            kind: shape.kind_name().to_string(),
            selectable: Some(shape.is_selectable()),
            ..Default::default()
        };
        match shape {
            Shape::Rectangle(r) => {
                record.x = r.position.x;
                record.y = r.position.y;
                record.width = Some(r.width);
                record.height = Some(r.height);
            }
            Shape::Triangle(t) => {
                record.x = t.position.x;
                record.y = t.position.y;
                record.width = Some(t.width);
                record.height = Some(t.height);
            }
            Shape::Circle(c) => {
                record.x = c.position.x;
                record.y = c.position.y;
                record.radius = Some(c.radius);
            }
            Shape::Line(l) => {
                record.x = l.start.x;
                record.y = l.start.y;
                record.x2 = Some(l.end.x);
                record.y2 = Some(l.end.y);
            }
            Shape::Path(p) => {
                let origin = shape.bounds().origin();
                record.x = origin.x;
                record.y = origin.y;
                record.points = Some(p.points.iter().map(|&pt| pt.into()).collect());
            }
            Shape::Text(t) => {
                record.x = t.position.x;
                record.y = t.position.y;
                record.text = Some(t.content.clone());
                record.font_size = Some(t.font_size);
                record.font_family = Some(t.font_family.clone());
                record.text_align = Some(t.align.as_str().to_string());
                record.font_weight = Some(if t.bold { "bold" } else { "normal" }.to_string());
                record.font_style = Some(if t.italic { "italic" } else { "normal" }.to_string());
            }
            Shape::Image(i) => {
                record.x = i.position.x;
                record.y = i.position.y;
                record.width = Some(i.width);
                record.height = Some(i.height);
                record.src = Some(i.src.clone());
            }
        }
        record.write_style(shape.style());
        record
    }
}

/// A graph node as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub position: PointRecord,
    #[serde(default)]
    pub data: NodeData,
}

impl NodeRecord {
    /// Build the graph node. Unknown types load as custom text nodes and keep their type
    /// string for the next save.
    pub fn to_node(&self) -> Result<GraphNode, GraphError> {
        let (kind, stored_type) = match NodeKind::from_type_name(&self.kind) {
            Some(kind) => (kind, None),
            None => {
                log::warn!("Unknown node type {:?} on {}, loading as custom", self.kind, self.id);
                (NodeKind::Custom, Some(self.kind.clone()))
            }
        };
        let payload = NodePayload::from_data(kind, self.data.clone())?;
        Ok(GraphNode {
            id: self.id.clone(),
            position: self.position.into(),
            payload,
            selected: false,
            stored_type,
        })
    }
}

impl TryFrom<&GraphNode> for NodeRecord {
    type Error = GraphError;

    fn try_from(node: &GraphNode) -> Result<Self, Self::Error> {
        Ok(NodeRecord {
            id: node.id.clone(),
            kind: node.type_name().to_string(),
            position: node.position.into(),
            data: node.payload.to_data()?,
        })
    }
}

/// A graph edge as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animated: Option<bool>,
}

impl EdgeRecord {
    pub fn to_edge(&self) -> GraphEdge {
        let mut edge = GraphEdge::new(self.source.clone(), self.target.clone());
        if !self.id.is_empty() {
            edge.id = self.id.clone();
        }
        edge.kind = self.kind.clone();
        edge.animated = self.animated.unwrap_or(false);
        edge
    }
}

impl From<&GraphEdge> for EdgeRecord {
    fn from(edge: &GraphEdge) -> Self {
        EdgeRecord {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            kind: edge.kind.clone(),
            animated: edge.animated.then_some(true),
        }
    }
}

/// A stored canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub objects: Vec<ObjectRecord>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nodes: Vec<NodeRecord>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub edges: Vec<EdgeRecord>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub owner_id: String,
}

impl Document {
    /// An empty document with a fresh id.
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            objects: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            created_at: now,
            updated_at: now,
            owner_id: owner_id.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Mark as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
