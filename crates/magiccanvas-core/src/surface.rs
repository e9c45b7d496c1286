//! Capabilities the editor needs from the two rendering layers.
//!
//! The vector scene graph and the node/edge view are external libraries; the editor drives
//! them through these traits. `HeadlessSurface` and `HeadlessGraphView` record every call
//! and stand in for real renderers in tests and server-side use.

use crate::camera::Camera;
use crate::compositor::{GraphInteraction, LayerState};
use crate::graph::GraphDocument;
use crate::scene::Scene;
use crate::shapes::{ObjectId, Path, Shape};
use crate::tools::{Brush, Cursor, PointerHandlers, ToolKind};
use kurbo::Size;
use peniko::{Color, Compose};
use thiserror::Error;

/// Rendering-layer errors.
#[derive(Debug, Error, PartialEq)]
pub enum SurfaceError {
    #[error("Rendering context lost")]
    ContextLost,
    #[error("Surface error: {0}")]
    Backend(String),
}

/// The vector drawing layer.
pub trait DrawingSurface {
    /// True once the underlying rendering context is gone.
    fn is_context_lost(&self) -> bool;

    fn set_dimensions(&mut self, size: Size) -> Result<(), SurfaceError>;

    /// Redraw every object, then the brush stroke still being drawn, if any.
    fn render(
        &mut self,
        scene: &Scene,
        stroke: Option<&Path>,
        camera: &Camera,
    ) -> Result<(), SurfaceError>;

    /// Remove every pointer handler set.
    fn detach_all_handlers(&mut self);

    /// Install the handler set of `mode`. Fails if another set is still attached.
    fn attach_handlers(
        &mut self,
        mode: ToolKind,
        handlers: PointerHandlers,
    ) -> Result<(), SurfaceError>;

    fn set_cursor(&mut self, cursor: Cursor);

    /// Turn free drawing on with the given brush, or off.
    fn set_brush(&mut self, brush: Option<Brush>);

    fn set_selection_enabled(&mut self, enabled: bool);

    fn apply_layer(&mut self, layer: LayerState);
}

/// The node/edge graph layer.
pub trait GraphView {
    fn set_dimensions(&mut self, size: Size);

    fn apply_layer(&mut self, layer: LayerState);

    fn set_interaction(&mut self, interaction: GraphInteraction);

    fn render(&mut self, graph: &GraphDocument, camera: &Camera);
}

/// One object as the headless surface would paint it.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub id: ObjectId,
    pub stroke: Color,
    pub fill: Option<Color>,
    pub compose: Compose,
    /// Brush stroke not yet committed to the scene.
    pub in_progress: bool,
}

impl Paint {
    fn of(shape: &Shape, in_progress: bool) -> Self {
        let style = shape.style();
        Self {
            id: shape.id().to_string(),
            stroke: style.stroke(),
            fill: style.fill(),
            compose: style.composite.compose(),
            in_progress,
        }
    }
}

/// Drawing surface that records state instead of painting.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    pub size: Size,
    pub cursor: Cursor,
    pub brush: Option<Brush>,
    pub selection_enabled: bool,
    pub layer: LayerState,
    /// Handler sets currently attached.
    pub attached: Vec<(ToolKind, PointerHandlers)>,
    /// Total number of attach calls.
    pub attach_count: usize,
    /// Most handler sets ever attached at once.
    pub max_attached: usize,
    pub render_count: usize,
    /// Objects drawn by the last render.
    pub last_rendered: usize,
    /// Paint list of the last render, back to front.
    pub last_frame: Vec<Paint>,
    context_lost: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the rendering context going away.
    pub fn lose_context(&mut self) {
        self.context_lost = true;
    }

    pub fn restore_context(&mut self) {
        self.context_lost = false;
    }

    pub fn attached_mode(&self) -> Option<ToolKind> {
        self.attached.first().map(|(mode, _)| *mode)
    }
}

impl DrawingSurface for HeadlessSurface {
    fn is_context_lost(&self) -> bool {
        self.context_lost
    }

    fn set_dimensions(&mut self, size: Size) -> Result<(), SurfaceError> {
        self.size = size;
        Ok(())
    }

    fn render(
        &mut self,
        scene: &Scene,
        stroke: Option<&Path>,
        _camera: &Camera,
    ) -> Result<(), SurfaceError> {
        if self.context_lost {
            return Err(SurfaceError::ContextLost);
        }
        self.render_count += 1;
        self.last_frame = scene
            .objects_ordered()
            .map(|shape| Paint::of(shape, false))
            .collect();
        self.last_rendered = self.last_frame.len();
        if let Some(path) = stroke {
            self.last_frame
                .push(Paint::of(&Shape::Path(path.clone()), true));
        }
        Ok(())
    }

    fn detach_all_handlers(&mut self) {
        self.attached.clear();
    }

    fn attach_handlers(
        &mut self,
        mode: ToolKind,
        handlers: PointerHandlers,
    ) -> Result<(), SurfaceError> {
        if let Some((existing, _)) = self.attached.first() {
            return Err(SurfaceError::Backend(format!(
                "{existing} handlers still attached"
            )));
        }
        self.attached.push((mode, handlers));
        self.attach_count += 1;
        self.max_attached = self.max_attached.max(self.attached.len());
        Ok(())
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn set_brush(&mut self, brush: Option<Brush>) {
        self.brush = brush;
    }

    fn set_selection_enabled(&mut self, enabled: bool) {
        self.selection_enabled = enabled;
    }

    fn apply_layer(&mut self, layer: LayerState) {
        self.layer = layer;
    }
}

/// Graph view that records state instead of painting.
#[derive(Debug, Clone, Default)]
pub struct HeadlessGraphView {
    pub size: Size,
    pub layer: LayerState,
    pub interaction: GraphInteraction,
    pub render_count: usize,
    pub last_node_count: usize,
    pub last_edge_count: usize,
}

impl HeadlessGraphView {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphView for HeadlessGraphView {
    fn set_dimensions(&mut self, size: Size) {
        self.size = size;
    }

    fn apply_layer(&mut self, layer: LayerState) {
        self.layer = layer;
    }

    fn set_interaction(&mut self, interaction: GraphInteraction) {
        self.interaction = interaction;
    }

    fn render(&mut self, graph: &GraphDocument, _camera: &Camera) {
        self.render_count += 1;
        self.last_node_count = graph.nodes().len();
        self.last_edge_count = graph.edges().len();
    }
}
