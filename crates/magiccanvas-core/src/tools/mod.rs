//! Tool modes and the tool state shared by every gesture.

mod freehand;
mod gesture;
mod machine;
mod modes;

pub use freehand::FreehandStroke;
pub use gesture::ShapeGesture;
pub use machine::{ToolMachine, Transition};
pub use modes::{Cursor, ModeConfig, PointerHandlers, SidePanel, mode_config};

use crate::config::{EditorConfig, SizePresets};
use crate::shapes::{CompositeOp, SerializableColor, ShapeStyle, StrokeStyle, TextAlign};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Tool errors.
#[derive(Debug, Error, PartialEq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Tool {0} is not available in view-only mode")]
    ViewOnly(ToolKind),
    #[error("Invalid tool option: {0}")]
    InvalidOption(String),
    #[error("Could not attach pointer handlers: {0}")]
    Attach(String),
}

/// Toolbar entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Hand,
    Pencil,
    Eraser,
    Shape,
    Text,
    /// One-shot: asks the host for an image file.
    Image,
    /// Toggles fullscreen without changing pointer ownership.
    Fullscreen,
}

impl ToolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Hand => "hand",
            ToolKind::Pencil => "pencil",
            ToolKind::Eraser => "eraser",
            ToolKind::Shape => "shape",
            ToolKind::Text => "text",
            ToolKind::Image => "image",
            ToolKind::Fullscreen => "fullscreen",
        }
    }

    /// Tools that author content on the drawing layer.
    pub fn is_drawing_tool(self) -> bool {
        matches!(
            self,
            ToolKind::Pencil | ToolKind::Eraser | ToolKind::Shape | ToolKind::Text
        )
    }

    /// Tools that become the pointer-owning mode when chosen.
    pub fn owns_pointer(self) -> bool {
        !matches!(self, ToolKind::Image | ToolKind::Fullscreen)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "select" => Ok(ToolKind::Select),
            "hand" => Ok(ToolKind::Hand),
            "pencil" => Ok(ToolKind::Pencil),
            "eraser" => Ok(ToolKind::Eraser),
            "shape" => Ok(ToolKind::Shape),
            "text" => Ok(ToolKind::Text),
            "image" => Ok(ToolKind::Image),
            "fullscreen" => Ok(ToolKind::Fullscreen),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

/// Stroke size picker value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeSize {
    #[serde(rename = "S")]
    Small,
    #[default]
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
    #[serde(rename = "XL")]
    ExtraLarge,
}

impl StrokeSize {
    pub fn width(self, presets: &SizePresets) -> f64 {
        match self {
            StrokeSize::Small => presets.small,
            StrokeSize::Medium => presets.medium,
            StrokeSize::Large => presets.large,
            StrokeSize::ExtraLarge => presets.extra_large,
        }
    }
}

impl FromStr for StrokeSize {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S" => Ok(StrokeSize::Small),
            "M" => Ok(StrokeSize::Medium),
            "L" => Ok(StrokeSize::Large),
            "XL" => Ok(StrokeSize::ExtraLarge),
            other => Err(ToolError::InvalidOption(format!("stroke size {other}"))),
        }
    }
}

/// Shape created by the shape tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Circle,
    Triangle,
    Line,
}

impl FromStr for ShapeKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rectangle" => Ok(ShapeKind::Rectangle),
            "circle" => Ok(ShapeKind::Circle),
            "triangle" => Ok(ShapeKind::Triangle),
            "line" => Ok(ShapeKind::Line),
            other => Err(ToolError::InvalidOption(format!("shape {other}"))),
        }
    }
}

/// Authoring parameters read by gestures and brushes. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolState {
    pub active_tool: ToolKind,
    pub active_color: SerializableColor,
    pub stroke_size: StrokeSize,
    pub line_style: StrokeStyle,
    pub shape_kind: ShapeKind,
    /// None = transparent.
    pub shape_fill: Option<SerializableColor>,
    pub font_family: String,
    pub text_align: TextAlign,
    pub bold: bool,
    pub italic: bool,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            active_tool: ToolKind::Select,
            active_color: SerializableColor::black(),
            stroke_size: StrokeSize::Medium,
            line_style: StrokeStyle::Solid,
            shape_kind: ShapeKind::Rectangle,
            shape_fill: None,
            font_family: "Arial".to_string(),
            text_align: TextAlign::Left,
            bold: false,
            italic: false,
        }
    }
}

impl ToolState {
    pub fn stroke_width(&self, config: &EditorConfig) -> f64 {
        self.stroke_size.width(&config.sizes)
    }

    /// Style for a new shape drawn with the shape tool.
    pub fn shape_style(&self, config: &EditorConfig) -> ShapeStyle {
        let mut style = ShapeStyle {
            stroke_color: self.active_color,
            stroke_width: self.stroke_width(config),
            fill_color: None,
            stroke_style: StrokeStyle::Solid,
            composite: CompositeOp::SourceOver,
        };
        style.set_fill(self.shape_fill);
        if self.shape_kind == ShapeKind::Line {
            style.stroke_style = self.line_style;
        }
        style
    }
}

/// Free-draw brush installed on the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: SerializableColor,
    pub width: f64,
    pub stroke_style: StrokeStyle,
    pub composite: CompositeOp,
}

impl Brush {
    pub fn pencil(state: &ToolState, config: &EditorConfig) -> Self {
        Self {
            color: state.active_color,
            width: state.stroke_width(config),
            stroke_style: state.line_style,
            composite: CompositeOp::SourceOver,
        }
    }

    /// Wider white brush that cuts through what is underneath.
    pub fn eraser(state: &ToolState, config: &EditorConfig) -> Self {
        Self {
            color: SerializableColor::white(),
            width: state.stroke_width(config) * config.eraser_width_factor,
            stroke_style: StrokeStyle::Solid,
            composite: CompositeOp::DestinationOut,
        }
    }

    /// Style of the path a finished stroke turns into.
    pub fn path_style(&self) -> ShapeStyle {
        ShapeStyle {
            stroke_color: self.color,
            stroke_width: self.width,
            fill_color: None,
            stroke_style: self.stroke_style,
            composite: self.composite,
        }
    }
}
