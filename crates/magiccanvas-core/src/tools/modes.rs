//! Transition table: what each pointer-owning mode installs on the drawing surface.

use super::{Brush, ToolKind, ToolState};
use crate::config::EditorConfig;
use bitflags::bitflags;

bitflags! {
    /// Pointer events a mode listens to on the drawing surface.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PointerHandlers: u8 {
        const PRESS = 1 << 0;
        const MOVE = 1 << 1;
        const RELEASE = 1 << 2;
        const DOUBLE_CLICK = 1 << 3;
    }
}

impl PointerHandlers {
    /// Press, move and release.
    pub const DRAG: Self = Self::PRESS.union(Self::MOVE).union(Self::RELEASE);
}

/// Cursor shown over the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Move,
    Grab,
    Grabbing,
    Crosshair,
    Text,
}

/// Contextual options panel shown next to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SidePanel {
    #[default]
    Hidden,
    Brush,
    Eraser,
    Shape,
    Text,
}

impl SidePanel {
    pub fn is_visible(self) -> bool {
        self != SidePanel::Hidden
    }
}

/// Everything a mode installs when it takes the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeConfig {
    pub mode: ToolKind,
    pub handlers: PointerHandlers,
    pub cursor: Cursor,
    /// Cursor over an object.
    pub hover_cursor: Cursor,
    /// Free-draw brush; `None` leaves free drawing off.
    pub brush: Option<Brush>,
    /// Rubber-band selection on the drawing surface.
    pub selection_enabled: bool,
    /// Whether existing objects can be picked.
    pub objects_selectable: bool,
    pub side_panel: SidePanel,
}

/// Look up the mode entered for `tool`. One-shot tools own nothing and return `None`.
pub fn mode_config(tool: ToolKind, state: &ToolState, config: &EditorConfig) -> Option<ModeConfig> {
    let mode = match tool {
        ToolKind::Select => ModeConfig {
            mode: tool,
            handlers: PointerHandlers::DRAG | PointerHandlers::DOUBLE_CLICK,
            cursor: Cursor::Default,
            hover_cursor: Cursor::Move,
            brush: None,
            selection_enabled: true,
            objects_selectable: true,
            side_panel: SidePanel::Hidden,
        },
        ToolKind::Hand => ModeConfig {
            mode: tool,
            handlers: PointerHandlers::DRAG,
            cursor: Cursor::Grab,
            hover_cursor: Cursor::Grab,
            brush: None,
            selection_enabled: false,
            objects_selectable: true,
            side_panel: SidePanel::Hidden,
        },
        ToolKind::Pencil => ModeConfig {
            mode: tool,
            handlers: PointerHandlers::DRAG,
            cursor: Cursor::Crosshair,
            hover_cursor: Cursor::Crosshair,
            brush: Some(Brush::pencil(state, config)),
            selection_enabled: false,
            objects_selectable: false,
            side_panel: SidePanel::Brush,
        },
        ToolKind::Eraser => ModeConfig {
            mode: tool,
            handlers: PointerHandlers::DRAG,
            cursor: Cursor::Crosshair,
            hover_cursor: Cursor::Crosshair,
            brush: Some(Brush::eraser(state, config)),
            selection_enabled: false,
            objects_selectable: false,
            side_panel: SidePanel::Eraser,
        },
        ToolKind::Shape => ModeConfig {
            mode: tool,
            handlers: PointerHandlers::DRAG,
            cursor: Cursor::Crosshair,
            hover_cursor: Cursor::Crosshair,
            brush: None,
            selection_enabled: false,
            objects_selectable: false,
            side_panel: SidePanel::Shape,
        },
        // Text insertion happens on entry; afterwards the mode behaves like select.
        ToolKind::Text => ModeConfig {
            mode: tool,
            handlers: PointerHandlers::DRAG | PointerHandlers::DOUBLE_CLICK,
            cursor: Cursor::Text,
            hover_cursor: Cursor::Move,
            brush: None,
            selection_enabled: true,
            objects_selectable: true,
            side_panel: SidePanel::Text,
        },
        ToolKind::Image | ToolKind::Fullscreen => return None,
    };
    Some(mode)
}
