//! Widget state definitions.

/// The UI state of a drawing object.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WidgetState {
    #[default]
    Normal,
    Hovered,
    /// The active object.
    Selected,
    /// Selected and receiving keyboard input.
    Editing(EditingKind),
}

impl WidgetState {
    /// Check if widget is selected (either just selected or editing).
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected | Self::Editing(_))
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing(_))
    }
}

/// Kind of editing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditingKind {
    /// Inline text editing with the whole content selected on entry.
    Text { select_all: bool },
}
