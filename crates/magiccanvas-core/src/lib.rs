//! Magic Canvas core library
//!
//! Platform-agnostic core of the dual-layer canvas editor: a vector drawing layer and a
//! node/edge graph layer sharing one viewport, with tool modes and document persistence.

pub mod camera;
pub mod compositor;
pub mod config;
pub mod document;
pub mod editor;
pub mod graph;
pub mod persistence;
pub mod scene;
pub mod shapes;
pub mod storage;
pub mod surface;
pub mod tools;
pub mod widget;

pub use camera::Camera;
pub use compositor::{Composition, Compositor, GraphInteraction, LayerState, composition};
pub use config::{ConfigError, EditorConfig};
pub use document::{Document, EdgeRecord, NodeRecord, ObjectRecord};
pub use editor::{Editor, EditorEffect, EditorError, NotifyLevel, TextFormat};
pub use graph::{GraphDocument, GraphEdge, GraphError, GraphNode, NodeKind};
pub use persistence::{OpenMode, PersistenceBridge, Snapshot, capture_snapshot, hydrate};
pub use scene::Scene;
pub use storage::{DocumentStore, FileStore, MemoryStore, StorageError, StorageResult};
pub use surface::{
    DrawingSurface, GraphView, HeadlessGraphView, HeadlessSurface, Paint, SurfaceError,
};
pub use tools::{ToolError, ToolKind, ToolMachine, ToolState};
pub use widget::{EditingKind, WidgetManager, WidgetState};
