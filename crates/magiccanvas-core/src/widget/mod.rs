//! Per-object UI state for the drawing layer.
//!
//! Objects remain pure data; selection, text editing and hover live here.

mod manager;
mod state;

pub use manager::WidgetManager;
pub use state::{EditingKind, WidgetState};
