//! Dual-layer compositor.
//!
//! The drawing layer and the graph layer share one viewport. Which layer receives pointer
//! input, and which one sits on top, follows the active tool.

use crate::camera::Camera;
use crate::graph::GraphDocument;
use crate::scene::Scene;
use crate::shapes::Path;
use crate::surface::{DrawingSurface, GraphView, SurfaceError};
use crate::tools::ToolKind;
use kurbo::Size;

/// Stacking of the drawing layer when it sits below the graph.
pub const DRAWING_Z_BASE: i32 = 10;
/// Stacking of the graph layer.
pub const GRAPH_Z: i32 = 20;
/// Stacking of the drawing layer while a drawing tool is active.
pub const DRAWING_Z_PROMOTED: i32 = 30;

/// Pointer routing and stacking of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerState {
    /// Whether the layer receives pointer events.
    pub pointer_events: bool,
    pub z_index: i32,
}

impl Default for LayerState {
    fn default() -> Self {
        Self {
            pointer_events: true,
            z_index: 0,
        }
    }
}

/// Interaction switches of the graph view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphInteraction {
    pub nodes_draggable: bool,
    pub nodes_connectable: bool,
    pub elements_selectable: bool,
    pub pan_on_scroll: bool,
    pub zoom_on_scroll: bool,
}

impl Default for GraphInteraction {
    fn default() -> Self {
        Self {
            nodes_draggable: true,
            nodes_connectable: true,
            elements_selectable: true,
            pan_on_scroll: false,
            zoom_on_scroll: true,
        }
    }
}

impl GraphInteraction {
    /// Everything off, used while a drawing tool owns the pointer or the document is view-only.
    pub fn disabled() -> Self {
        Self {
            nodes_draggable: false,
            nodes_connectable: false,
            elements_selectable: false,
            pan_on_scroll: false,
            zoom_on_scroll: false,
        }
    }
}

/// Layer arrangement for one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Composition {
    pub drawing: LayerState,
    pub graph: LayerState,
    pub graph_interaction: GraphInteraction,
}

/// Layer arrangement for `tool`.
pub fn composition(tool: ToolKind) -> Composition {
    match tool {
        ToolKind::Pencil | ToolKind::Eraser | ToolKind::Shape | ToolKind::Text => Composition {
            drawing: LayerState {
                pointer_events: true,
                z_index: DRAWING_Z_PROMOTED,
            },
            graph: LayerState {
                pointer_events: false,
                z_index: GRAPH_Z,
            },
            graph_interaction: GraphInteraction::disabled(),
        },
        ToolKind::Hand => Composition {
            drawing: LayerState {
                pointer_events: true,
                z_index: DRAWING_Z_BASE,
            },
            graph: LayerState {
                pointer_events: true,
                z_index: GRAPH_Z,
            },
            graph_interaction: GraphInteraction {
                pan_on_scroll: true,
                ..GraphInteraction::default()
            },
        },
        // Select, and the one-shot tools which never own the pointer.
        ToolKind::Select | ToolKind::Image | ToolKind::Fullscreen => Composition {
            drawing: LayerState {
                pointer_events: true,
                z_index: DRAWING_Z_BASE,
            },
            graph: LayerState {
                pointer_events: false,
                z_index: GRAPH_Z,
            },
            graph_interaction: GraphInteraction::default(),
        },
    }
}

/// Keeps both layers sized, stacked and rendered in step.
#[derive(Debug, Clone, PartialEq)]
pub struct Compositor {
    viewport: Size,
    composition: Composition,
    view_only: bool,
}

impl Compositor {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            composition: composition(ToolKind::Select),
            view_only: false,
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// In view-only mode the graph stays pointer-inert whatever the tool.
    pub fn set_view_only(&mut self, view_only: bool) {
        self.view_only = view_only;
    }

    /// Rearrange the layers for `tool` and push the result to both views.
    pub fn apply_tool(
        &mut self,
        tool: ToolKind,
        surface: &mut dyn DrawingSurface,
        graph_view: &mut dyn GraphView,
    ) {
        let mut next = composition(tool);
        if self.view_only {
            next.graph_interaction = GraphInteraction {
                zoom_on_scroll: true,
                ..GraphInteraction::disabled()
            };
        }
        self.composition = next;
        surface.apply_layer(next.drawing);
        graph_view.apply_layer(next.graph);
        graph_view.set_interaction(next.graph_interaction);
    }

    /// Give both layers the container size. Calling it twice with the same size is harmless.
    pub fn resize(
        &mut self,
        size: Size,
        surface: &mut dyn DrawingSurface,
        graph_view: &mut dyn GraphView,
    ) {
        self.viewport = size;
        if let Err(e) = surface.set_dimensions(size) {
            log::error!("Failed to resize drawing layer: {e}");
        }
        graph_view.set_dimensions(size);
    }

    /// Render both layers. A lost drawing context skips the drawing layer.
    pub fn render(
        &self,
        scene: &Scene,
        stroke: Option<&Path>,
        graph: &GraphDocument,
        camera: &Camera,
        surface: &mut dyn DrawingSurface,
        graph_view: &mut dyn GraphView,
    ) {
        if surface.is_context_lost() {
            log::debug!("Drawing context lost, skipping render");
        } else {
            match surface.render(scene, stroke, camera) {
                Ok(()) => {}
                Err(SurfaceError::ContextLost) => log::debug!("Drawing context lost during render"),
                Err(e) => log::error!("Drawing render failed: {e}"),
            }
        }
        graph_view.render(graph, camera);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HeadlessGraphView, HeadlessSurface};

    #[test]
    fn test_select_routes_to_drawing() {
        let c = composition(ToolKind::Select);
        assert!(c.drawing.pointer_events);
        assert!(!c.graph.pointer_events);
        assert!(c.drawing.z_index < c.graph.z_index);
        assert!(c.graph_interaction.nodes_draggable);
    }

    #[test]
    fn test_drawing_tools_promote_drawing_layer() {
        for tool in [ToolKind::Pencil, ToolKind::Eraser, ToolKind::Shape, ToolKind::Text] {
            let c = composition(tool);
            assert!(c.drawing.pointer_events);
            assert!(!c.graph.pointer_events);
            assert!(c.drawing.z_index > c.graph.z_index);
            assert_eq!(c.graph_interaction, GraphInteraction::disabled());
        }
    }

    #[test]
    fn test_hand_activates_both() {
        let c = composition(ToolKind::Hand);
        assert!(c.drawing.pointer_events && c.graph.pointer_events);
        assert!(c.graph_interaction.pan_on_scroll);
    }

    #[test]
    fn test_resize_is_idempotent() {
        let mut compositor = Compositor::new(Size::new(800.0, 600.0));
        let mut surface = HeadlessSurface::new();
        let mut view = HeadlessGraphView::new();
        let size = Size::new(1024.0, 768.0);

        compositor.resize(size, &mut surface, &mut view);
        let first = (surface.size, view.size);
        compositor.resize(size, &mut surface, &mut view);
        assert_eq!((surface.size, view.size), first);
        assert_eq!(surface.size, view.size);
        assert_eq!(compositor.viewport(), size);
    }

    #[test]
    fn test_render_skips_lost_context() {
        let compositor = Compositor::new(Size::new(800.0, 600.0));
        let mut surface = HeadlessSurface::new();
        let mut view = HeadlessGraphView::new();
        surface.lose_context();

        compositor.render(
            &Scene::new(),
            None,
            &GraphDocument::new(),
            &Camera::new(),
            &mut surface,
            &mut view,
        );
        assert_eq!(surface.render_count, 0);
        assert_eq!(view.render_count, 1);
    }

    #[test]
    fn test_apply_tool_pushes_layers() {
        let mut compositor = Compositor::new(Size::new(800.0, 600.0));
        let mut surface = HeadlessSurface::new();
        let mut view = HeadlessGraphView::new();
        compositor.apply_tool(ToolKind::Pencil, &mut surface, &mut view);
        assert_eq!(surface.layer.z_index, DRAWING_Z_PROMOTED);
        assert!(!view.layer.pointer_events);
        assert!(!view.interaction.nodes_draggable);
    }
}
