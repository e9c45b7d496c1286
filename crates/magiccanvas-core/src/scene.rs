//! Drawing object model: the ordered set of vector objects on the drawing layer.

use crate::shapes::{ObjectFlags, ObjectId, Shape};
use crate::widget::{EditingKind, WidgetManager};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashMap;

/// Maximum number of undo states to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// A snapshot of the object set for undo/redo.
#[derive(Debug, Clone)]
struct SceneSnapshot {
    objects: HashMap<ObjectId, Shape>,
    z_order: Vec<ObjectId>,
}

/// All drawing objects plus their UI state.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: HashMap<ObjectId, Shape>,
    /// Back to front.
    z_order: Vec<ObjectId>,
    /// Selection, editing and hover state.
    pub widgets: WidgetManager,
    undo_stack: Vec<SceneSnapshot>,
    redo_stack: Vec<SceneSnapshot>,
    /// Flags each object had before [`Scene::lock`] cleared them.
    locked: Option<HashMap<ObjectId, ObjectFlags>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            objects: self.objects.clone(),
            z_order: self.z_order.clone(),
        }
    }

    fn restore(&mut self, snapshot: SceneSnapshot) {
        self.objects = snapshot.objects;
        self.z_order = snapshot.z_order;
        let stale: Vec<ObjectId> = [self.widgets.active(), self.widgets.hovered()]
            .into_iter()
            .flatten()
            .filter(|id| !self.objects.contains_key(*id))
            .map(str::to_string)
            .collect();
        for id in stale {
            self.widgets.remove(&id);
        }
    }

    /// Push current state to the undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        self.undo_stack.push(self.snapshot());
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last change. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(self.snapshot());
        self.restore(snapshot);
        true
    }

    /// Redo the last undone change. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(self.snapshot());
        self.restore(snapshot);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Add an object on top of the stack. An object with the same id is replaced in place.
    pub fn add(&mut self, shape: Shape) {
        let id = shape.id().to_string();
        if self.objects.insert(id.clone(), shape).is_none() {
            self.z_order.push(id);
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Shape> {
        self.z_order.retain(|existing| existing != id);
        self.widgets.remove(id);
        self.objects.remove(id)
    }

    /// Remove every object and forget all UI state. History is kept; a lock is lifted.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.z_order.clear();
        self.widgets.clear();
        self.locked = None;
    }

    /// Make every object inert for viewing. The objects' own flags are remembered so that
    /// [`Scene::own_flags`] still reports them.
    pub fn lock(&mut self) {
        if self.locked.is_none() {
            let saved = self
                .objects
                .iter()
                .map(|(id, shape)| (id.clone(), shape.flags()))
                .collect();
            self.locked = Some(saved);
        }
        self.widgets.clear();
        self.set_all_flags(ObjectFlags::empty());
    }

    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    /// Flags of `shape` ignoring a view lock.
    pub fn own_flags(&self, shape: &Shape) -> ObjectFlags {
        self.locked
            .as_ref()
            .and_then(|saved| saved.get(shape.id()))
            .copied()
            .unwrap_or_else(|| shape.flags())
    }

    /// Drop the undo/redo history.
    pub fn reset_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn get(&self, id: &str) -> Option<&Shape> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Shape> {
        self.objects.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    /// Objects back to front.
    pub fn objects_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.objects.get(id))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Bounding box of every object.
    pub fn bounds(&self) -> Option<Rect> {
        self.objects
            .values()
            .map(Shape::bounds)
            .reduce(|acc, b| acc.union(b))
    }

    /// Interactive objects under a point, front to back.
    pub fn objects_at_point(&self, point: Point, tolerance: f64) -> Vec<ObjectId> {
        self.z_order
            .iter()
            .rev()
            .filter(|id| {
                self.objects
                    .get(*id)
                    .is_some_and(|s| s.is_interactive() && s.hit_test(point, tolerance))
            })
            .cloned()
            .collect()
    }

    /// Topmost selectable object under a point.
    pub fn topmost_selectable_at(&self, point: Point, tolerance: f64) -> Option<ObjectId> {
        self.objects_at_point(point, tolerance)
            .into_iter()
            .find(|id| self.objects.get(id).is_some_and(Shape::is_selectable))
    }

    /// The active object.
    pub fn active(&self) -> Option<&Shape> {
        self.widgets.active().and_then(|id| self.objects.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut Shape> {
        let id = self.widgets.active()?.to_string();
        self.objects.get_mut(&id)
    }

    /// Make an object active. Non-selectable or unknown objects are ignored.
    pub fn select(&mut self, id: &str) -> bool {
        match self.objects.get(id) {
            Some(shape) if shape.is_selectable() => {
                self.widgets.select(id);
                true
            }
            _ => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.widgets.clear_selection();
    }

    /// Put a text object into editing with its content selected.
    pub fn begin_text_editing(&mut self, id: &str) -> bool {
        match self.objects.get(id) {
            Some(Shape::Text(_)) => {
                self.widgets.enter_editing(id, EditingKind::Text { select_all: true });
                true
            }
            _ => false,
        }
    }

    pub fn end_text_editing(&mut self) {
        self.widgets.exit_editing();
    }

    /// Move an object by a world-space delta.
    pub fn translate(&mut self, id: &str, delta: Vec2) {
        if let Some(shape) = self.objects.get_mut(id) {
            shape.translate(delta);
        }
    }

    /// Set interaction flags on every object.
    pub fn set_all_flags(&mut self, flags: ObjectFlags) {
        for shape in self.objects.values_mut() {
            *shape.flags_mut() = flags;
        }
    }

    /// Remove the active object. Returns the removed id.
    pub fn remove_active(&mut self) -> Option<ObjectId> {
        let id = self.widgets.active()?.to_string();
        self.push_undo();
        self.remove(&id);
        log::debug!("Removed drawing object {id}");
        Some(id)
    }
}
