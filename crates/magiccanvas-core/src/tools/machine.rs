//! Tool-mode state machine.
//!
//! Exactly one mode owns the pointer. Entering a mode always detaches every handler set
//! from the drawing surface before attaching its own, so re-entering a mode (for example
//! after a brush color change) never stacks handlers.

use super::modes::{ModeConfig, mode_config};
use super::{ToolError, ToolKind, ToolState};
use crate::config::EditorConfig;
use crate::surface::DrawingSurface;

/// Outcome of a tool selection.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// A pointer-owning mode was (re)entered.
    Entered { from: ToolKind, to: ToolKind },
    /// A one-shot tool ran; the pointer-owning mode is unchanged.
    OneShot(ToolKind),
}

/// Owns the tool state and the currently installed mode.
#[derive(Debug, Clone, Default)]
pub struct ToolMachine {
    state: ToolState,
    installed: Option<ModeConfig>,
    view_only: bool,
}

impl ToolMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    /// Mutable access for authoring parameters. Call [`ToolMachine::reinstall`] afterwards
    /// if the active mode depends on what changed.
    pub fn state_mut(&mut self) -> &mut ToolState {
        &mut self.state
    }

    pub fn active_tool(&self) -> ToolKind {
        self.state.active_tool
    }

    /// Configuration of the installed mode.
    pub fn installed(&self) -> Option<&ModeConfig> {
        self.installed.as_ref()
    }

    pub fn is_view_only(&self) -> bool {
        self.view_only
    }

    /// Lock to passive select (view-only documents) or unlock.
    pub fn set_view_only(
        &mut self,
        view_only: bool,
        surface: &mut dyn DrawingSurface,
        config: &EditorConfig,
    ) -> Result<(), ToolError> {
        self.view_only = view_only;
        if view_only && self.state.active_tool != ToolKind::Select {
            self.enter(ToolKind::Select, surface, config)?;
        }
        Ok(())
    }

    /// Select a tool.
    pub fn select(
        &mut self,
        tool: ToolKind,
        surface: &mut dyn DrawingSurface,
        config: &EditorConfig,
    ) -> Result<Transition, ToolError> {
        if self.view_only && tool != ToolKind::Select && tool != ToolKind::Fullscreen {
            log::warn!("Ignoring {tool}: document is view-only");
            return Err(ToolError::ViewOnly(tool));
        }
        if !tool.owns_pointer() {
            return Ok(Transition::OneShot(tool));
        }
        let from = self.state.active_tool;
        self.enter(tool, surface, config)?;
        Ok(Transition::Entered { from, to: tool })
    }

    /// Re-install the current mode so it picks up changed tool state.
    pub fn reinstall(
        &mut self,
        surface: &mut dyn DrawingSurface,
        config: &EditorConfig,
    ) -> Result<(), ToolError> {
        self.enter(self.state.active_tool, surface, config)
    }

    fn enter(
        &mut self,
        tool: ToolKind,
        surface: &mut dyn DrawingSurface,
        config: &EditorConfig,
    ) -> Result<(), ToolError> {
        let Some(mut mode) = mode_config(tool, &self.state, config) else {
            return Ok(());
        };
        if self.view_only {
            mode.objects_selectable = false;
            mode.selection_enabled = false;
        }

        surface.detach_all_handlers();
        self.installed = None;
        surface
            .attach_handlers(tool, mode.handlers)
            .map_err(|e| ToolError::Attach(e.to_string()))?;
        surface.set_cursor(mode.cursor);
        surface.set_brush(mode.brush);
        surface.set_selection_enabled(mode.selection_enabled);

        if self.state.active_tool != tool {
            log::debug!("Tool {} -> {}", self.state.active_tool, tool);
        }
        self.state.active_tool = tool;
        self.installed = Some(mode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::SerializableColor;
    use crate::surface::HeadlessSurface;
    use crate::tools::{Cursor, PointerHandlers};

    fn setup() -> (ToolMachine, HeadlessSurface, EditorConfig) {
        let mut machine = ToolMachine::new();
        let mut surface = HeadlessSurface::new();
        let config = EditorConfig::default();
        machine.select(ToolKind::Select, &mut surface, &config).unwrap();
        (machine, surface, config)
    }

    #[test]
    fn test_at_most_one_handler_set() {
        let (mut machine, mut surface, config) = setup();
        let sequence = [
            ToolKind::Pencil,
            ToolKind::Select,
            ToolKind::Pencil,
            ToolKind::Pencil,
            ToolKind::Eraser,
            ToolKind::Image,
            ToolKind::Shape,
            ToolKind::Hand,
            ToolKind::Fullscreen,
            ToolKind::Text,
            ToolKind::Select,
        ];
        for tool in sequence {
            machine.select(tool, &mut surface, &config).unwrap();
            assert!(surface.attached.len() <= 1);
        }
        assert_eq!(surface.max_attached, 1);
        assert_eq!(surface.attached_mode(), Some(ToolKind::Select));
    }

    #[test]
    fn test_one_shot_tools_keep_mode() {
        let (mut machine, mut surface, config) = setup();
        machine.select(ToolKind::Shape, &mut surface, &config).unwrap();
        assert_eq!(
            machine.select(ToolKind::Image, &mut surface, &config),
            Ok(Transition::OneShot(ToolKind::Image))
        );
        assert_eq!(machine.active_tool(), ToolKind::Shape);
        assert_eq!(surface.cursor, Cursor::Crosshair);
    }

    #[test]
    fn test_reinstall_updates_brush() {
        let (mut machine, mut surface, config) = setup();
        machine.select(ToolKind::Pencil, &mut surface, &config).unwrap();
        let red = SerializableColor::new(255, 0, 0, 255);
        machine.state_mut().active_color = red;
        machine.reinstall(&mut surface, &config).unwrap();

        assert_eq!(surface.brush.map(|b| b.color), Some(red));
        assert_eq!(surface.attached.len(), 1);
        assert_eq!(surface.attached[0].1, PointerHandlers::DRAG);
    }

    #[test]
    fn test_view_only_blocks_pointer_modes() {
        let (mut machine, mut surface, config) = setup();
        machine.select(ToolKind::Pencil, &mut surface, &config).unwrap();
        machine.set_view_only(true, &mut surface, &config).unwrap();
        assert_eq!(machine.active_tool(), ToolKind::Select);
        assert!(!surface.selection_enabled);

        for tool in [ToolKind::Pencil, ToolKind::Hand, ToolKind::Shape, ToolKind::Image] {
            assert_eq!(
                machine.select(tool, &mut surface, &config),
                Err(ToolError::ViewOnly(tool))
            );
        }
        assert!(machine.select(ToolKind::Select, &mut surface, &config).is_ok());
        assert!(!machine.installed().unwrap().objects_selectable);
    }
}
