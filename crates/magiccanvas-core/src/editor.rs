//! Host-facing editor: pointer, keyboard and toolbar entry points over both layers.
//!
//! The host forwards raw input in screen coordinates and drains [`EditorEffect`]s for the
//! things only it can do (file pickers, fullscreen, notifications). Every mutation ends
//! with a guarded render of both layers.

use crate::camera::Camera;
use crate::compositor::Compositor;
use crate::config::EditorConfig;
use crate::document::Document;
use crate::graph::{GraphDocument, GraphError, NodeData, NodeKind};
use crate::persistence::{self, HydrateReport, OpenMode, PersistenceBridge, Snapshot};
use crate::scene::Scene;
use crate::shapes::{
    Image, ImageFormat, ObjectId, SerializableColor, Shape, StrokeStyle, Text, TextAlign,
};
use crate::storage::DocumentStore;
use crate::surface::{DrawingSurface, GraphView, HeadlessGraphView, HeadlessSurface};
use crate::tools::{
    Brush, Cursor, FreehandStroke, ShapeGesture, ShapeKind, StrokeSize, ToolError, ToolKind,
    ToolMachine, ToolState, Transition,
};
use kurbo::{Point, Size, Vec2};
use std::time::Duration;
use thiserror::Error;

/// Padding around content when framing the view.
const FIT_PADDING: f64 = 50.0;
/// Wheel delta to zoom factor.
const WHEEL_ZOOM_SPEED: f64 = 0.002;

/// Editor errors.
#[derive(Debug, Error, PartialEq)]
pub enum EditorError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("Nothing suitable selected for {0}")]
    NoSuitableSelection(&'static str),
    #[error("Unsupported image: {0}")]
    Image(String),
    #[error("Document is view-only")]
    ViewOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Error,
}

/// Requests for the host page.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEffect {
    /// Show a file picker; answer with [`Editor::insert_image`].
    OpenImagePicker,
    SetFullscreen(bool),
    /// Non-blocking toast.
    Notify { level: NotifyLevel, message: String },
}

/// Text formatting applied from the text panel.
#[derive(Debug, Clone, PartialEq)]
pub enum TextFormat {
    FontFamily(String),
    Align(TextAlign),
    Bold(bool),
    Italic(bool),
}

/// Pointer gesture between press and release.
#[derive(Debug, Clone)]
enum Gesture {
    Shape(ShapeGesture),
    Stroke(FreehandStroke),
    /// Viewport pan; `last` is in screen space.
    Pan { last: Point },
    /// Object drag; `last` is in world space.
    Move { id: ObjectId, last: Point, moved: bool },
}

/// The dual-layer canvas editor.
pub struct Editor<S: DrawingSurface = HeadlessSurface, G: GraphView = HeadlessGraphView> {
    scene: Scene,
    graph: GraphDocument,
    machine: ToolMachine,
    compositor: Compositor,
    camera: Camera,
    config: EditorConfig,
    surface: S,
    graph_view: G,
    name: String,
    gesture: Option<Gesture>,
    /// Time left before the shape tool hands back to select.
    pending_select: Option<Duration>,
    last_pointer: Point,
    fullscreen: bool,
    effects: Vec<EditorEffect>,
}

impl Editor {
    /// Editor over recording surfaces, for tests and server-side use.
    pub fn headless(config: EditorConfig) -> Result<Self, EditorError> {
        Editor::new(HeadlessSurface::new(), HeadlessGraphView::new(), config)
    }
}

impl<S: DrawingSurface, G: GraphView> Editor<S, G> {
    /// Create an editor in select mode with both layers sized to the initial viewport.
    pub fn new(surface: S, graph_view: G, config: EditorConfig) -> Result<Self, EditorError> {
        let mut editor = Self {
            scene: Scene::new(),
            graph: GraphDocument::new(),
            machine: ToolMachine::new(),
            compositor: Compositor::new(config.initial_viewport),
            camera: Camera::new(),
            surface,
            graph_view,
            config,
            name: String::new(),
            gesture: None,
            pending_select: None,
            last_pointer: Point::ZERO,
            fullscreen: false,
            effects: Vec::new(),
        };
        let viewport = editor.config.initial_viewport;
        editor
            .compositor
            .resize(viewport, &mut editor.surface, &mut editor.graph_view);
        editor.enter_tool(ToolKind::Select)?;
        Ok(editor)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn graph(&self) -> &GraphDocument {
        &self.graph
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tool_state(&self) -> &ToolState {
        self.machine.state()
    }

    pub fn machine(&self) -> &ToolMachine {
        &self.machine
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn graph_view(&self) -> &G {
        &self.graph_view
    }

    pub fn active_tool(&self) -> ToolKind {
        self.machine.active_tool()
    }

    pub fn is_view_only(&self) -> bool {
        self.machine.is_view_only()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Whether a shape is waiting to hand back to select.
    pub fn has_pending_select(&self) -> bool {
        self.pending_select.is_some()
    }

    /// Drain queued host requests.
    pub fn take_effects(&mut self) -> Vec<EditorEffect> {
        std::mem::take(&mut self.effects)
    }

    fn notify(&mut self, level: NotifyLevel, message: impl Into<String>) {
        self.effects.push(EditorEffect::Notify {
            level,
            message: message.into(),
        });
    }

    fn check_editable(&self) -> Result<(), EditorError> {
        if self.is_view_only() {
            Err(EditorError::ViewOnly)
        } else {
            Ok(())
        }
    }

    /// Render both layers, including a brush stroke in progress.
    pub fn render(&mut self) {
        let stroke = match &self.gesture {
            Some(Gesture::Stroke(stroke)) => Some(stroke.preview()),
            _ => None,
        };
        self.compositor.render(
            &self.scene,
            stroke.as_ref(),
            &self.graph,
            &self.camera,
            &mut self.surface,
            &mut self.graph_view,
        );
    }

    // --- Tools ---

    /// Select a tool by its toolbar name. Unknown names change nothing.
    pub fn set_tool_by_name(&mut self, name: &str) -> Result<Transition, EditorError> {
        let tool = name.parse::<ToolKind>().inspect_err(|e| log::warn!("{e}"))?;
        self.set_tool(tool)
    }

    /// Select a tool from the toolbar. Cancels a pending return to select.
    pub fn set_tool(&mut self, tool: ToolKind) -> Result<Transition, EditorError> {
        self.pending_select = None;
        match tool {
            ToolKind::Image => {
                self.check_editable()?;
                self.effects.push(EditorEffect::OpenImagePicker);
                if self.active_tool() != ToolKind::Select {
                    self.enter_tool(ToolKind::Select)?;
                }
                Ok(Transition::OneShot(tool))
            }
            ToolKind::Fullscreen => {
                self.fullscreen = !self.fullscreen;
                self.effects.push(EditorEffect::SetFullscreen(self.fullscreen));
                Ok(Transition::OneShot(tool))
            }
            _ => {
                let from = self.active_tool();
                self.enter_tool(tool)?;
                if tool == ToolKind::Text {
                    self.insert_text_placeholder();
                }
                self.render();
                Ok(Transition::Entered { from, to: tool })
            }
        }
    }

    /// Switch the pointer-owning mode, finishing whatever the old mode left open.
    fn enter_tool(&mut self, tool: ToolKind) -> Result<(), EditorError> {
        match self.machine.select(tool, &mut self.surface, &self.config)? {
            Transition::Entered { .. } => {}
            Transition::OneShot(_) => return Ok(()),
        }
        self.finish_gesture();
        self.scene.end_text_editing();
        self.compositor
            .apply_tool(tool, &mut self.surface, &mut self.graph_view);
        Ok(())
    }

    /// Advance timers. Hands the shape tool back to select once the finalize delay passed.
    pub fn tick(&mut self, elapsed: Duration) {
        let Some(remaining) = self.pending_select else {
            return;
        };
        if elapsed < remaining {
            self.pending_select = Some(remaining - elapsed);
            return;
        }
        self.pending_select = None;
        if self.active_tool() == ToolKind::Shape {
            match self.enter_tool(ToolKind::Select) {
                Ok(()) => self.render(),
                Err(e) => log::error!("Could not return to select: {e}"),
            }
        }
    }

    fn reinstall_if(&mut self, tools: &[ToolKind]) {
        if tools.contains(&self.active_tool()) {
            if let Err(e) = self.machine.reinstall(&mut self.surface, &self.config) {
                log::error!("Could not reinstall {}: {e}", self.active_tool());
            }
        }
    }

    fn finish_gesture(&mut self) {
        match self.gesture.take() {
            Some(Gesture::Shape(gesture)) => {
                gesture.release(&mut self.scene);
            }
            Some(Gesture::Stroke(stroke)) => self.commit_stroke(stroke),
            Some(Gesture::Pan { .. }) | Some(Gesture::Move { .. }) | None => {}
        }
    }

    fn commit_stroke(&mut self, stroke: FreehandStroke) {
        let path = stroke.finish();
        self.scene.push_undo();
        self.scene.add(Shape::Path(path));
    }

    // --- Pointer input ---

    fn to_world(&self, screen: Point) -> Point {
        self.camera.screen_to_world(screen)
    }

    /// Pointer pressed at a screen position.
    pub fn pointer_down(&mut self, screen: Point) {
        self.last_pointer = screen;
        if self.gesture.is_some() {
            return;
        }
        let world = self.to_world(screen);
        let tolerance = self.config.hit_tolerance;

        self.gesture = match self.active_tool() {
            ToolKind::Select | ToolKind::Text => {
                match self.scene.topmost_selectable_at(world, tolerance) {
                    Some(id) => self.begin_move(id, world),
                    None => {
                        self.scene.end_text_editing();
                        self.scene.clear_selection();
                        None
                    }
                }
            }
            ToolKind::Hand => match self.scene.topmost_selectable_at(world, tolerance) {
                Some(id) => self.begin_move(id, world),
                None => {
                    self.surface.set_cursor(Cursor::Grabbing);
                    Some(Gesture::Pan { last: screen })
                }
            },
            ToolKind::Pencil | ToolKind::Eraser => {
                let brush = self
                    .machine
                    .installed()
                    .and_then(|mode| mode.brush)
                    .unwrap_or_else(|| self.fallback_brush());
                Some(Gesture::Stroke(FreehandStroke::begin(world, brush)))
            }
            ToolKind::Shape => Some(Gesture::Shape(ShapeGesture::press(
                world,
                self.machine.state(),
                &self.config,
                &mut self.scene,
            ))),
            ToolKind::Image | ToolKind::Fullscreen => None,
        };
        self.render();
    }

    fn fallback_brush(&self) -> Brush {
        if self.active_tool() == ToolKind::Eraser {
            Brush::eraser(self.machine.state(), &self.config)
        } else {
            Brush::pencil(self.machine.state(), &self.config)
        }
    }

    fn begin_move(&mut self, id: ObjectId, world: Point) -> Option<Gesture> {
        if self.scene.widgets.focused() != Some(id.as_str()) {
            self.scene.end_text_editing();
        }
        self.scene.select(&id);
        Some(Gesture::Move {
            id,
            last: world,
            moved: false,
        })
    }

    /// Pointer moved to a screen position, pressed or not.
    pub fn pointer_move(&mut self, screen: Point) {
        self.last_pointer = screen;
        let world = self.to_world(screen);

        let Some(gesture) = self.gesture.as_mut() else {
            self.update_hover(world);
            return;
        };
        match gesture {
            Gesture::Shape(shape) => shape.drag(world, self.machine.state(), &mut self.scene),
            Gesture::Stroke(stroke) => stroke.extend(world),
            Gesture::Pan { last } => {
                self.camera.pan(screen - *last);
                *last = screen;
            }
            Gesture::Move { id, last, moved } => {
                if !*moved {
                    self.scene.push_undo();
                    *moved = true;
                }
                self.scene.translate(id, world - *last);
                *last = world;
            }
        }
        self.render();
    }

    fn update_hover(&mut self, world: Point) {
        let Some(mode) = self.machine.installed() else {
            return;
        };
        let hovered = if mode.objects_selectable {
            self.scene
                .topmost_selectable_at(world, self.config.hit_tolerance)
        } else {
            None
        };
        let cursor = if hovered.is_some() {
            mode.hover_cursor
        } else {
            mode.cursor
        };
        self.surface.set_cursor(cursor);
        if self.scene.widgets.hovered() != hovered.as_deref() {
            self.scene.widgets.set_hovered(hovered.as_deref());
            self.render();
        }
    }

    /// Pointer released at a screen position.
    pub fn pointer_up(&mut self, screen: Point) {
        self.last_pointer = screen;
        let world = self.to_world(screen);
        match self.gesture.take() {
            Some(Gesture::Shape(gesture)) => {
                gesture.drag(world, self.machine.state(), &mut self.scene);
                let id = gesture.release(&mut self.scene);
                log::debug!("Finished shape {id}");
                self.pending_select = Some(self.config.shape_finalize_delay());
            }
            Some(Gesture::Stroke(mut stroke)) => {
                stroke.extend(world);
                self.commit_stroke(stroke);
            }
            Some(Gesture::Pan { .. }) => {
                if let Some(mode) = self.machine.installed() {
                    self.surface.set_cursor(mode.cursor);
                }
            }
            Some(Gesture::Move { .. }) | None => {}
        }
        self.render();
    }

    /// Pointer left the canvas: ends any gesture as if released where it was last seen.
    pub fn pointer_leave(&mut self) {
        if self.gesture.is_some() {
            self.pointer_up(self.last_pointer);
        }
        if self.scene.widgets.hovered().is_some() {
            self.scene.widgets.set_hovered(None);
            self.render();
        }
    }

    /// Double click: start editing the text object under the pointer.
    pub fn double_click(&mut self, screen: Point) -> bool {
        if !matches!(self.active_tool(), ToolKind::Select | ToolKind::Text) {
            return false;
        }
        let world = self.to_world(screen);
        let Some(id) = self
            .scene
            .topmost_selectable_at(world, self.config.hit_tolerance)
        else {
            return false;
        };
        self.scene.select(&id);
        let editing = self.scene.begin_text_editing(&id);
        self.render();
        editing
    }

    /// Wheel input. Pans when the graph pans on scroll, zooms when zooming is enabled.
    pub fn wheel(&mut self, screen: Point, delta: Vec2) {
        let interaction = self.compositor.composition().graph_interaction;
        if interaction.pan_on_scroll {
            self.camera.pan(-delta);
        } else if interaction.zoom_on_scroll {
            self.camera
                .zoom_at(screen, (-delta.y * WHEEL_ZOOM_SPEED).exp());
        } else {
            return;
        }
        self.render();
    }

    // --- Viewport ---

    /// Host container changed size.
    pub fn resize(&mut self, size: Size) {
        self.compositor
            .resize(size, &mut self.surface, &mut self.graph_view);
        self.render();
    }

    /// Frame all objects and nodes.
    pub fn fit_view(&mut self) {
        let bounds = match (self.scene.bounds(), self.graph.bounds()) {
            (Some(a), Some(b)) => a.union(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => {
                self.camera.reset();
                self.render();
                return;
            }
        };
        self.camera
            .fit_to_bounds(bounds, self.compositor.viewport(), FIT_PADDING);
        self.render();
    }

    fn viewport_center(&self) -> Point {
        let size = self.compositor.viewport();
        self.to_world(Point::new(size.width / 2.0, size.height / 2.0))
    }

    // --- Content insertion ---

    fn insert_text_placeholder(&mut self) {
        let state = self.machine.state();
        let offset = self.config.text_center_offset;
        let mut text = Text::new(
            self.viewport_center() - Vec2::new(offset, offset),
            self.config.text_placeholder.clone(),
        )
        .with_font_size(state.stroke_width(&self.config) * self.config.text_font_scale)
        .with_font_family(state.font_family.clone())
        .with_color(state.active_color);
        text.align = state.text_align;
        text.bold = state.bold;
        text.italic = state.italic;

        let id = text.id.clone();
        self.scene.push_undo();
        self.scene.add(Shape::Text(text));
        self.scene.select(&id);
        self.scene.begin_text_editing(&id);
    }

    /// Replace the content of the text being edited.
    pub fn set_text_content(&mut self, content: &str) -> Result<(), EditorError> {
        let editing = self
            .scene
            .widgets
            .is_editing()
            .then(|| self.scene.widgets.focused().map(str::to_string))
            .flatten()
            .ok_or(EditorError::NoSuitableSelection("text input"))?;
        let text = self
            .scene
            .get_mut(&editing)
            .and_then(Shape::as_text_mut)
            .ok_or(EditorError::NoSuitableSelection("text input"))?;
        text.content = content.to_string();
        self.render();
        Ok(())
    }

    /// Leave text editing, keeping the object selected.
    pub fn finish_text_editing(&mut self) {
        self.scene.end_text_editing();
        self.render();
    }

    /// Add a picked image, scaled to the default width and centred in the viewport.
    pub fn insert_image(
        &mut self,
        data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<ObjectId, EditorError> {
        self.check_editable()?;
        let format = ImageFormat::from_magic_bytes(data)
            .ok_or_else(|| EditorError::Image("unrecognised file format".to_string()))?;
        let mut image = Image::new(Point::ZERO, data, width, height, format);
        image.scale_to_width(self.config.image_default_width);
        image.position = self.viewport_center() - Vec2::new(image.width / 2.0, image.height / 2.0);

        let id = image.id.clone();
        self.scene.push_undo();
        self.scene.add(Shape::Image(image));
        if self.active_tool() != ToolKind::Select {
            self.enter_tool(ToolKind::Select)?;
        }
        self.scene.select(&id);
        self.render();
        Ok(id)
    }

    // --- Editing commands ---

    /// Delete key: the active drawing object, otherwise the selected nodes and edges.
    pub fn delete_key(&mut self) -> bool {
        if self.is_view_only() || self.scene.widgets.is_editing() {
            return false;
        }
        let removed = if self.scene.remove_active().is_some() {
            true
        } else if self.graph.has_selection() {
            match self.graph.delete_selected() {
                Ok((nodes, edges)) => nodes + edges > 0,
                Err(e) => {
                    log::warn!("Delete rejected: {e}");
                    false
                }
            }
        } else {
            false
        };
        if removed {
            self.render();
        }
        removed
    }

    pub fn undo(&mut self) -> bool {
        if self.is_view_only() || !self.scene.undo() {
            return false;
        }
        self.render();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.is_view_only() || !self.scene.redo() {
            return false;
        }
        self.render();
        true
    }

    // --- Style panel ---

    /// Change the active color; the active object is restroked with it.
    pub fn set_color(&mut self, color: SerializableColor) {
        self.machine.state_mut().active_color = color;
        self.reinstall_if(&[ToolKind::Pencil]);
        if !self.is_view_only() && self.scene.active().is_some() {
            self.scene.push_undo();
            if let Some(shape) = self.scene.active_mut() {
                shape.style_mut().stroke_color = color;
            }
        }
        self.render();
    }

    pub fn set_stroke_size(&mut self, size: StrokeSize) {
        self.machine.state_mut().stroke_size = size;
        self.reinstall_if(&[ToolKind::Pencil, ToolKind::Eraser]);
    }

    pub fn set_line_style(&mut self, style: StrokeStyle) {
        self.machine.state_mut().line_style = style;
        self.reinstall_if(&[ToolKind::Pencil]);
    }

    fn with_selected_path(
        &mut self,
        action: &'static str,
        apply: impl FnOnce(&mut Shape, &ToolState),
    ) -> Result<(), EditorError> {
        self.check_editable()?;
        if !self.scene.active().is_some_and(Shape::is_path) {
            return Err(EditorError::NoSuitableSelection(action));
        }
        self.scene.push_undo();
        let state = self.machine.state().clone();
        if let Some(shape) = self.scene.active_mut() {
            apply(shape, &state);
        }
        self.render();
        Ok(())
    }

    /// Give the selected freehand path the current line style.
    pub fn apply_line_style_to_selected_path(&mut self) -> Result<(), EditorError> {
        self.with_selected_path("line style", |shape, state| {
            shape.style_mut().stroke_style = state.line_style;
        })
    }

    /// Give the selected freehand path the current color.
    pub fn apply_color_to_selected_path(&mut self) -> Result<(), EditorError> {
        self.with_selected_path("line color", |shape, state| {
            shape.style_mut().stroke_color = state.active_color;
        })
    }

    /// Pick a shape kind; this also switches to the shape tool.
    pub fn set_shape_kind(&mut self, kind: ShapeKind) -> Result<Transition, EditorError> {
        self.machine.state_mut().shape_kind = kind;
        self.set_tool(ToolKind::Shape)
    }

    /// Fill for new shapes; `None` or a transparent color means no fill.
    pub fn set_shape_fill(&mut self, fill: Option<SerializableColor>) {
        self.machine.state_mut().shape_fill = fill.filter(|c| !c.is_transparent());
    }

    /// Record a text format and apply it to the active text object.
    pub fn apply_text_format(&mut self, format: TextFormat) -> Result<(), EditorError> {
        let state = self.machine.state_mut();
        match &format {
            TextFormat::FontFamily(family) => state.font_family = family.clone(),
            TextFormat::Align(align) => state.text_align = *align,
            TextFormat::Bold(bold) => state.bold = *bold,
            TextFormat::Italic(italic) => state.italic = *italic,
        }
        self.check_editable()?;
        if self.scene.active().and_then(Shape::as_text).is_none() {
            return Err(EditorError::NoSuitableSelection("text format"));
        }
        self.scene.push_undo();
        if let Some(text) = self.scene.active_mut().and_then(Shape::as_text_mut) {
            match format {
                TextFormat::FontFamily(family) => text.font_family = family,
                TextFormat::Align(align) => text.align = align,
                TextFormat::Bold(bold) => text.bold = bold,
                TextFormat::Italic(italic) => text.italic = italic,
            }
        }
        self.render();
        Ok(())
    }

    // --- Graph ---

    /// Add a node of `kind` at the default node position.
    pub fn add_node(&mut self, kind: NodeKind) -> Result<String, EditorError> {
        let id = self
            .graph
            .add_node(kind, self.config.node_default_position)?;
        self.render();
        Ok(id)
    }

    /// Connect two nodes. Returns `None` when they are already connected.
    pub fn connect(&mut self, source: &str, target: &str) -> Result<Option<String>, EditorError> {
        let id = self.graph.connect(source, target)?;
        self.render();
        Ok(id)
    }

    pub fn move_node(&mut self, id: &str, position: Point) -> Result<(), EditorError> {
        self.graph.move_node(id, position)?;
        self.render();
        Ok(())
    }

    pub fn select_node(&mut self, id: &str, additive: bool) -> Result<(), EditorError> {
        self.graph.select_node(id, additive)?;
        self.render();
        Ok(())
    }

    pub fn select_edge(&mut self, id: &str, additive: bool) -> bool {
        let selected = self.graph.select_edge(id, additive);
        if selected {
            self.render();
        }
        selected
    }

    /// A node card changed its data.
    pub fn update_node_payload(&mut self, id: &str, patch: NodeData) -> Result<(), EditorError> {
        self.graph.update_node_payload(id, patch)?;
        self.render();
        Ok(())
    }

    /// Mutable graph access for node-level operations such as chat submission.
    pub fn graph_mut(&mut self) -> &mut GraphDocument {
        &mut self.graph
    }

    // --- Persistence ---

    /// Both models as they would be saved now.
    pub fn get_current_snapshot(&self) -> Snapshot {
        persistence::capture_snapshot(&self.name, &self.scene, &self.graph)
    }

    /// Load a document into both layers and render once.
    pub fn hydrate(
        &mut self,
        document: &Document,
        mode: OpenMode,
    ) -> Result<HydrateReport, EditorError> {
        self.gesture = None;
        self.pending_select = None;
        self.name = document.name.clone();
        let report = persistence::hydrate(document, &mut self.scene, &mut self.graph, mode);

        let view_only = mode == OpenMode::ViewOnly;
        self.compositor.set_view_only(view_only);
        self.machine
            .set_view_only(view_only, &mut self.surface, &self.config)?;
        self.enter_tool(ToolKind::Select)?;
        self.render();
        Ok(report)
    }

    /// Save the current snapshot. A failure queues an error notification. View-only
    /// documents are never written.
    pub async fn save<St: DocumentStore + ?Sized>(
        &mut self,
        bridge: &mut PersistenceBridge<St>,
    ) -> bool {
        if self.is_view_only() {
            log::debug!("Skipping save of view-only document {}", bridge.document_id());
            return false;
        }
        let saved = bridge.save(self.get_current_snapshot()).await;
        if saved {
            self.notify(NotifyLevel::Info, "Canvas saved");
        } else {
            self.notify(NotifyLevel::Error, "Failed to save canvas");
        }
        saved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodePayload;
    use crate::shapes::ObjectFlags;
    use crate::storage::{MemoryStore, NewDocument, block_on};
    use crate::tools::PointerHandlers;
    use std::sync::Arc;

    fn editor() -> Editor {
        Editor::headless(EditorConfig::default()).unwrap()
    }

    fn drag(editor: &mut Editor, from: Point, to: Point) {
        editor.pointer_down(from);
        editor.pointer_move(Point::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0));
        editor.pointer_move(to);
        editor.pointer_up(to);
    }

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_starts_in_select() {
        let editor = editor();
        assert_eq!(editor.active_tool(), ToolKind::Select);
        assert_eq!(editor.surface().attached_mode(), Some(ToolKind::Select));
        assert_eq!(editor.surface().size, Size::new(800.0, 600.0));
        assert_eq!(editor.graph_view().size, Size::new(800.0, 600.0));
    }

    #[test]
    fn test_shape_returns_to_select_after_delay() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Shape).unwrap();
        drag(&mut editor, Point::new(10.0, 10.0), Point::new(60.0, 40.0));

        assert_eq!(editor.active_tool(), ToolKind::Shape);
        editor.tick(Duration::from_millis(60));
        assert_eq!(editor.active_tool(), ToolKind::Shape);
        editor.tick(Duration::from_millis(40));
        assert_eq!(editor.active_tool(), ToolKind::Select);
        assert!(editor.scene().active().is_some());
    }

    #[test]
    fn test_manual_tool_change_cancels_pending_select() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Shape).unwrap();
        drag(&mut editor, Point::new(10.0, 10.0), Point::new(60.0, 40.0));
        editor.set_tool(ToolKind::Pencil).unwrap();
        editor.tick(Duration::from_secs(1));
        assert_eq!(editor.active_tool(), ToolKind::Pencil);
    }

    #[test]
    fn test_second_press_ignored_while_pending() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Shape).unwrap();
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_down(Point::new(300.0, 300.0));
        editor.pointer_up(Point::new(20.0, 20.0));
        assert_eq!(editor.scene().len(), 1);
    }

    #[test]
    fn test_pencil_stroke_becomes_path() {
        let mut editor = editor();
        let red = SerializableColor::new(255, 0, 0, 255);
        editor.set_color(red);
        editor.set_tool(ToolKind::Pencil).unwrap();
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(30.0, 30.0));

        let shapes: Vec<&Shape> = editor.scene().objects_ordered().collect();
        assert_eq!(shapes.len(), 1);
        assert!(shapes[0].is_path());
        assert_eq!(shapes[0].style().stroke_color, red);
    }

    #[test]
    fn test_eraser_stroke_is_drawn_while_dragging() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Eraser).unwrap();
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_move(Point::new(10.0, 10.0));

        let frame = &editor.surface().last_frame;
        assert_eq!(frame.len(), 1);
        assert!(frame[0].in_progress);
        assert_eq!(frame[0].compose, peniko::Compose::DestOut);
        assert!(editor.scene().is_empty());

        editor.pointer_up(Point::new(20.0, 10.0));
        let frame = &editor.surface().last_frame;
        assert_eq!(frame.len(), 1);
        assert!(!frame[0].in_progress);
        assert_eq!(frame[0].compose, peniko::Compose::DestOut);
    }

    #[test]
    fn test_leaving_pencil_finishes_stroke() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Pencil).unwrap();
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_move(Point::new(5.0, 5.0));
        editor.set_tool(ToolKind::Select).unwrap();
        assert_eq!(editor.scene().len(), 1);
        assert_eq!(editor.surface().attached.len(), 1);
    }

    #[test]
    fn test_pointer_leave_acts_as_release() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Shape).unwrap();
        editor.pointer_down(Point::new(0.0, 0.0));
        editor.pointer_move(Point::new(40.0, 40.0));
        editor.pointer_leave();
        let shape = editor.scene().active().unwrap();
        assert!(shape.flags().contains(ObjectFlags::SELECTABLE));
        assert!(editor.has_pending_select());
    }

    #[test]
    fn test_text_tool_inserts_editable_text() {
        let mut editor = editor();
        editor.set_stroke_size(StrokeSize::Large);
        editor.set_tool(ToolKind::Text).unwrap();

        let text = editor.scene().active().and_then(Shape::as_text).unwrap();
        assert_eq!(text.content, "Type here");
        assert_eq!(text.font_size, 20.0);
        assert_eq!(text.position, Point::new(350.0, 250.0));
        assert!(editor.scene().widgets.is_editing());

        editor.set_text_content("Hello").unwrap();
        editor.set_tool(ToolKind::Select).unwrap();
        assert!(!editor.scene().widgets.is_editing());
        let text = editor.scene().active().and_then(Shape::as_text).unwrap();
        assert_eq!(text.content, "Hello");
    }

    #[test]
    fn test_double_click_edits_text() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Text).unwrap();
        editor.set_tool(ToolKind::Select).unwrap();
        editor.scene.clear_selection();

        assert!(editor.double_click(Point::new(360.0, 260.0)));
        assert!(editor.scene().widgets.is_editing());
        assert!(!editor.delete_key());
    }

    #[test]
    fn test_image_tool_is_one_shot() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Pencil).unwrap();
        let transition = editor.set_tool(ToolKind::Image).unwrap();
        assert_eq!(transition, Transition::OneShot(ToolKind::Image));
        assert_eq!(editor.active_tool(), ToolKind::Select);
        assert_eq!(editor.take_effects(), vec![EditorEffect::OpenImagePicker]);

        let id = editor.insert_image(PNG, 400, 300).unwrap();
        let Some(Shape::Image(image)) = editor.scene().get(&id) else {
            panic!("expected image");
        };
        assert_eq!(image.width, 200.0);
        assert_eq!(image.height, 150.0);
        assert_eq!(image.position, Point::new(300.0, 225.0));
        assert_eq!(image.format(), Some(ImageFormat::Png));
        assert_eq!(editor.scene().active().map(Shape::id), Some(id.as_str()));
    }

    #[test]
    fn test_insert_image_rejects_unknown_bytes() {
        let mut editor = editor();
        assert!(matches!(
            editor.insert_image(b"hello", 10, 10),
            Err(EditorError::Image(_))
        ));
        assert!(editor.scene().is_empty());
    }

    #[test]
    fn test_fullscreen_keeps_mode() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Hand).unwrap();
        editor.set_tool(ToolKind::Fullscreen).unwrap();
        editor.set_tool(ToolKind::Fullscreen).unwrap();
        assert_eq!(editor.active_tool(), ToolKind::Hand);
        assert_eq!(
            editor.take_effects(),
            vec![
                EditorEffect::SetFullscreen(true),
                EditorEffect::SetFullscreen(false)
            ]
        );
    }

    #[test]
    fn test_unknown_tool_name() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Hand).unwrap();
        assert_eq!(
            editor.set_tool_by_name("lasso"),
            Err(EditorError::Tool(ToolError::UnknownTool("lasso".to_string())))
        );
        assert_eq!(editor.active_tool(), ToolKind::Hand);
    }

    #[test]
    fn test_hand_pans_on_empty_space() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Hand).unwrap();
        editor.pointer_down(Point::new(100.0, 100.0));
        assert_eq!(editor.surface().cursor, Cursor::Grabbing);
        editor.pointer_move(Point::new(130.0, 80.0));
        editor.pointer_up(Point::new(150.0, 90.0));
        assert_eq!(editor.camera().offset, Vec2::new(30.0, -20.0));
        assert_eq!(editor.surface().cursor, Cursor::Grab);
    }

    #[test]
    fn test_select_drag_moves_object_with_undo() {
        let mut editor = editor();
        editor.set_shape_fill(Some(SerializableColor::white()));
        editor.set_tool(ToolKind::Shape).unwrap();
        drag(&mut editor, Point::new(10.0, 10.0), Point::new(60.0, 60.0));
        editor.tick(Duration::from_millis(100));

        drag(&mut editor, Point::new(30.0, 30.0), Point::new(130.0, 30.0));
        let id = editor.scene().active().map(|s| s.id().to_string()).unwrap();
        assert_eq!(editor.scene().get(&id).unwrap().bounds().x0, 110.0);

        assert!(editor.undo());
        assert_eq!(editor.scene().get(&id).unwrap().bounds().x0, 10.0);
        assert!(editor.redo());
        assert_eq!(editor.scene().get(&id).unwrap().bounds().x0, 110.0);
    }

    #[test]
    fn test_hover_cursor() {
        let mut editor = editor();
        editor.set_shape_fill(Some(SerializableColor::white()));
        editor.set_tool(ToolKind::Shape).unwrap();
        drag(&mut editor, Point::new(10.0, 10.0), Point::new(60.0, 60.0));
        editor.tick(Duration::from_millis(100));

        editor.pointer_move(Point::new(30.0, 30.0));
        assert_eq!(editor.surface().cursor, Cursor::Move);
        assert!(editor.scene().widgets.hovered().is_some());
        editor.pointer_move(Point::new(500.0, 500.0));
        assert_eq!(editor.surface().cursor, Cursor::Default);
        assert!(editor.scene().widgets.hovered().is_none());
    }

    #[test]
    fn test_delete_prefers_drawing_object() {
        let mut editor = editor();
        editor.add_node(NodeKind::Custom).unwrap();
        editor.add_node(NodeKind::Custom).unwrap();
        editor.connect("node-1", "node-2").unwrap();
        editor.select_node("node-1", false).unwrap();

        editor.set_tool(ToolKind::Shape).unwrap();
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(20.0, 20.0));
        assert!(editor.delete_key());
        assert!(editor.scene().is_empty());
        assert_eq!(editor.graph().nodes().len(), 2);

        assert!(editor.delete_key());
        assert_eq!(editor.graph().nodes().len(), 1);
        assert!(editor.graph().edges().is_empty());
        assert!(!editor.delete_key());
    }

    #[test]
    fn test_style_ops_need_selection() {
        let mut editor = editor();
        assert_eq!(
            editor.apply_line_style_to_selected_path(),
            Err(EditorError::NoSuitableSelection("line style"))
        );
        assert_eq!(
            editor.apply_text_format(TextFormat::Bold(true)),
            Err(EditorError::NoSuitableSelection("text format"))
        );
        assert!(editor.tool_state().bold);
    }

    #[test]
    fn test_apply_line_style_to_path() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Pencil).unwrap();
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(50.0, 0.0));
        editor.set_tool(ToolKind::Select).unwrap();
        editor.pointer_down(Point::new(25.0, 0.0));
        editor.pointer_up(Point::new(25.0, 0.0));

        editor.set_line_style(StrokeStyle::Dashed);
        editor.apply_line_style_to_selected_path().unwrap();
        let path = editor.scene().active().unwrap();
        assert_eq!(path.style().stroke_style, StrokeStyle::Dashed);
    }

    #[test]
    fn test_pencil_brush_follows_line_style() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Pencil).unwrap();
        editor.set_line_style(StrokeStyle::Dotted);
        assert_eq!(
            editor.surface().brush.map(|b| b.stroke_style),
            Some(StrokeStyle::Dotted)
        );
        assert_eq!(editor.surface().attached[0].1, PointerHandlers::DRAG);
    }

    #[test]
    fn test_set_shape_kind_switches_tool() {
        let mut editor = editor();
        editor.set_shape_kind(ShapeKind::Circle).unwrap();
        assert_eq!(editor.active_tool(), ToolKind::Shape);
        assert_eq!(editor.tool_state().shape_kind, ShapeKind::Circle);
    }

    #[test]
    fn test_wheel_follows_composition() {
        let mut editor = editor();
        editor.set_tool(ToolKind::Pencil).unwrap();
        editor.wheel(Point::new(400.0, 300.0), Vec2::new(0.0, -100.0));
        assert_eq!(editor.camera().zoom, 1.0);

        editor.set_tool(ToolKind::Select).unwrap();
        editor.wheel(Point::new(400.0, 300.0), Vec2::new(0.0, -100.0));
        assert!(editor.camera().zoom > 1.0);

        editor.set_tool(ToolKind::Hand).unwrap();
        let before = editor.camera().offset;
        editor.wheel(Point::new(400.0, 300.0), Vec2::new(0.0, 40.0));
        assert_eq!(editor.camera().offset, before - Vec2::new(0.0, 40.0));
    }

    #[test]
    fn test_update_node_payload() {
        let mut editor = editor();
        let id = editor.add_node(NodeKind::UiGenerator).unwrap();
        let patch = serde_json::json!({ "uiCode": "<p/>" })
            .as_object()
            .cloned()
            .unwrap();
        editor.update_node_payload(&id, patch).unwrap();
        let NodePayload::UiGenerator(ui) = &editor.graph().node(&id).unwrap().payload else {
            panic!("expected ui node");
        };
        assert_eq!(ui.ui_code.as_deref(), Some("<p/>"));
        assert_eq!(
            editor.graph().node(&id).unwrap().position,
            Point::new(250.0, 250.0)
        );
    }

    #[test]
    fn test_save_notifies() {
        let store = Arc::new(MemoryStore::new());
        let id = block_on(store.create(NewDocument::default())).unwrap();
        let mut editor = editor();
        editor.add_node(NodeKind::Custom).unwrap();

        let mut bridge = PersistenceBridge::new(store.clone(), id);
        assert!(block_on(editor.save(&mut bridge)));
        let mut missing = PersistenceBridge::new(store, "missing");
        assert!(!block_on(editor.save(&mut missing)));

        let effects = editor.take_effects();
        assert!(matches!(
            effects.last(),
            Some(EditorEffect::Notify {
                level: NotifyLevel::Error,
                ..
            })
        ));
    }

    #[test]
    fn test_view_only_hydrate() {
        let mut source = editor();
        source.set_tool(ToolKind::Shape).unwrap();
        drag(&mut source, Point::new(10.0, 10.0), Point::new(60.0, 40.0));
        source.add_node(NodeKind::Custom).unwrap();
        let snapshot = source.get_current_snapshot();

        let mut document = Document::new("Shared", "u1");
        document.objects = snapshot.objects;
        document.nodes = snapshot.nodes;

        let mut viewer = editor();
        let renders = viewer.surface().render_count;
        let report = viewer.hydrate(&document, OpenMode::ViewOnly).unwrap();
        assert_eq!(viewer.surface().render_count, renders + 1);
        assert_eq!((report.objects, report.nodes), (1, 1));
        assert_eq!(viewer.active_tool(), ToolKind::Select);

        viewer.pointer_down(Point::new(10.0, 20.0));
        viewer.pointer_move(Point::new(100.0, 100.0));
        viewer.pointer_up(Point::new(100.0, 100.0));
        assert!(viewer.scene().active().is_none());
        assert_eq!(viewer.get_current_snapshot().objects[0].x, 10.0);

        assert!(viewer.set_tool(ToolKind::Pencil).is_err());
        assert!(viewer.add_node(NodeKind::Custom).is_err());
        assert!(!viewer.delete_key());
        assert!(!viewer.graph_view().interaction.nodes_draggable);
    }
}
