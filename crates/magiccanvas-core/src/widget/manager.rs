//! Widget manager for tracking UI state of drawing objects.

use super::state::{EditingKind, WidgetState};
use crate::shapes::ObjectId;
use std::collections::HashMap;

/// Tracks the single active object, the object being edited and the hovered object.
#[derive(Debug, Clone, Default)]
pub struct WidgetManager {
    states: HashMap<ObjectId, WidgetState>,
    active: Option<ObjectId>,
    focused: Option<ObjectId>,
    hovered: Option<ObjectId>,
}

impl WidgetManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: &str) -> WidgetState {
        self.states.get(id).cloned().unwrap_or_default()
    }

    fn set_state(&mut self, id: &str, state: WidgetState) {
        if state.is_editing() {
            self.focused = Some(id.to_string());
        } else if self.focused.as_deref() == Some(id) {
            self.focused = None;
        }
        if state == WidgetState::Normal {
            self.states.remove(id);
        } else {
            self.states.insert(id.to_string(), state);
        }
    }

    /// The active (selected) object.
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.active.as_deref() == Some(id)
    }

    /// The object receiving keyboard input, if any.
    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn set_hovered(&mut self, id: Option<&str>) {
        if self.hovered.as_deref() == id {
            return;
        }
        if let Some(old) = self.hovered.take() {
            if self.state(&old) == WidgetState::Hovered {
                self.set_state(&old, WidgetState::Normal);
            }
        }
        if let Some(new) = id {
            if self.state(new) == WidgetState::Normal {
                self.set_state(new, WidgetState::Hovered);
            }
        }
        self.hovered = id.map(str::to_string);
    }

    /// Make `id` the active object, clearing any previous selection.
    pub fn select(&mut self, id: &str) {
        if self.is_selected(id) {
            return;
        }
        self.clear_selection();
        self.set_state(id, WidgetState::Selected);
        self.active = Some(id.to_string());
    }

    pub fn clear_selection(&mut self) {
        if let Some(id) = self.active.take() {
            self.set_state(&id, WidgetState::Normal);
        }
    }

    /// Enter editing mode for an object, selecting it first.
    pub fn enter_editing(&mut self, id: &str, kind: EditingKind) {
        if self.focused.as_deref().is_some_and(|f| f != id) {
            self.exit_editing();
        }
        self.select(id);
        self.set_state(id, WidgetState::Editing(kind));
    }

    /// Leave editing mode; the object stays selected.
    pub fn exit_editing(&mut self) {
        if let Some(id) = self.focused.clone() {
            self.set_state(&id, WidgetState::Selected);
        }
    }

    pub fn is_editing(&self) -> bool {
        self.focused.is_some()
    }

    /// Forget a deleted object.
    pub fn remove(&mut self, id: &str) {
        self.states.remove(id);
        if self.active.as_deref() == Some(id) {
            self.active = None;
        }
        if self.focused.as_deref() == Some(id) {
            self.focused = None;
        }
        if self.hovered.as_deref() == Some(id) {
            self.hovered = None;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_active_object() {
        let mut widgets = WidgetManager::new();
        widgets.select("a");
        widgets.select("b");
        assert_eq!(widgets.active(), Some("b"));
        assert_eq!(widgets.state("a"), WidgetState::Normal);
        assert!(widgets.state("b").is_selected());
    }

    #[test]
    fn test_editing_implies_selection() {
        let mut widgets = WidgetManager::new();
        widgets.enter_editing("t", EditingKind::Text { select_all: true });
        assert_eq!(widgets.active(), Some("t"));
        assert_eq!(widgets.focused(), Some("t"));

        widgets.exit_editing();
        assert!(!widgets.is_editing());
        assert_eq!(widgets.state("t"), WidgetState::Selected);
    }

    #[test]
    fn test_hover_does_not_override_selection() {
        let mut widgets = WidgetManager::new();
        widgets.select("a");
        widgets.set_hovered(Some("a"));
        assert_eq!(widgets.state("a"), WidgetState::Selected);

        widgets.set_hovered(Some("b"));
        assert_eq!(widgets.state("b"), WidgetState::Hovered);
        widgets.set_hovered(None);
        assert_eq!(widgets.state("b"), WidgetState::Normal);
    }

    #[test]
    fn test_remove_clears_references() {
        let mut widgets = WidgetManager::new();
        widgets.enter_editing("t", EditingKind::Text { select_all: false });
        widgets.remove("t");
        assert_eq!(widgets.active(), None);
        assert!(!widgets.is_editing());
    }
}
