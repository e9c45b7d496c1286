//! Bridge between the two in-memory models and the document store.
//!
//! The drawing scene and the graph only meet here: a snapshot captures both, and
//! hydration rebuilds both from a stored document.

use crate::document::{Document, EdgeRecord, NodeRecord, ObjectRecord};
use crate::graph::GraphDocument;
use crate::scene::Scene;
use crate::shapes::{ObjectFlags, new_object_id};
use crate::storage::{DocumentStore, DocumentUpdate, StorageResult};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// Both models in stored form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub name: String,
    pub objects: Vec<ObjectRecord>,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.nodes.is_empty() && self.edges.is_empty()
    }
}

impl From<Snapshot> for DocumentUpdate {
    fn from(snapshot: Snapshot) -> Self {
        DocumentUpdate {
            name: Some(snapshot.name),
            objects: Some(snapshot.objects),
            nodes: Some(snapshot.nodes),
            edges: Some(snapshot.edges),
        }
    }
}

/// How a document is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    #[default]
    Edit,
    /// Shared link: nothing can be selected, edited or moved.
    ViewOnly,
}

/// Capture the scene and the graph, back to front for objects.
pub fn capture_snapshot(name: &str, scene: &Scene, graph: &GraphDocument) -> Snapshot {
    let objects = scene
        .objects_ordered()
        .map(|shape| {
            let mut record = ObjectRecord::from(shape);
            record.selectable = Some(scene.own_flags(shape).contains(ObjectFlags::SELECTABLE));
            record
        })
        .collect();
    let nodes = graph
        .nodes()
        .iter()
        .filter_map(|node| {
            NodeRecord::try_from(node)
                .inspect_err(|e| log::error!("Cannot store node {}: {e}", node.id))
                .ok()
        })
        .collect();
    let edges = graph.edges().iter().map(EdgeRecord::from).collect();
    Snapshot {
        name: name.to_string(),
        objects,
        nodes,
        edges,
    }
}

/// What hydration had to fix up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrateReport {
    pub objects: usize,
    pub nodes: usize,
    pub edges: usize,
    /// Records dropped because they could not be loaded.
    pub skipped: usize,
    /// Objects whose id clashed and was regenerated.
    pub renamed: usize,
}

/// Replace both models with the contents of `document`.
pub fn hydrate(
    document: &Document,
    scene: &mut Scene,
    graph: &mut GraphDocument,
    mode: OpenMode,
) -> HydrateReport {
    let mut report = HydrateReport::default();

    scene.clear();
    scene.reset_history();
    let mut seen = HashSet::new();
    for record in &document.objects {
        let Some(mut shape) = record.to_shape() else {
            log::warn!("Skipping object with unknown kind {:?}", record.kind);
            report.skipped += 1;
            continue;
        };
        if !seen.insert(shape.id().to_string()) {
            let fresh = new_object_id();
            log::warn!("Duplicate object id {}, renamed to {fresh}", shape.id());
            shape.set_id(fresh.clone());
            seen.insert(fresh);
            report.renamed += 1;
        }
        scene.add(shape);
        report.objects += 1;
    }
    if mode == OpenMode::ViewOnly {
        scene.lock();
    }

    graph.set_read_only(false);
    graph.clear();
    for record in &document.nodes {
        match record.to_node() {
            Ok(node) => {
                graph.insert_node(node);
                report.nodes += 1;
            }
            Err(e) => {
                log::warn!("Skipping node {}: {e}", record.id);
                report.skipped += 1;
            }
        }
    }
    for record in &document.edges {
        match graph.insert_edge(record.to_edge()) {
            Ok(()) => report.edges += 1,
            Err(e) => {
                log::warn!("Dropping edge: {e}");
                report.skipped += 1;
            }
        }
    }
    graph.set_read_only(mode == OpenMode::ViewOnly);

    log::info!(
        "Hydrated {}: {} objects, {} nodes, {} edges",
        document.id,
        report.objects,
        report.nodes,
        report.edges
    );
    report
}

/// Saves snapshots of one document through a store.
pub struct PersistenceBridge<St: DocumentStore + ?Sized> {
    store: Arc<St>,
    document_id: String,
    saving: bool,
    last_saved: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl<St: DocumentStore + ?Sized> PersistenceBridge<St> {
    pub fn new(store: Arc<St>, document_id: impl Into<String>) -> Self {
        Self {
            store,
            document_id: document_id.into(),
            saving: false,
            last_saved: None,
            last_error: None,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// True while a save is in flight.
    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Message of the last failed save, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetch the document.
    pub async fn load(&self) -> StorageResult<Document> {
        self.store.get_by_id(&self.document_id).await
    }

    /// Replace the stored arrays with `snapshot`. Failures are logged and reported as
    /// `false`; there is no retry.
    pub async fn save(&mut self, snapshot: Snapshot) -> bool {
        if self.saving {
            log::debug!("Save already in progress for {}", self.document_id);
            return false;
        }
        self.saving = true;
        let result = self
            .store
            .update(&self.document_id, DocumentUpdate::from(snapshot))
            .await;
        self.saving = false;

        match result {
            Ok(document) => {
                log::info!("Saved {}", self.document_id);
                self.last_saved = Some(document.updated_at);
                self.last_error = None;
                true
            }
            Err(e) => {
                log::error!("Failed to save {}: {e}", self.document_id);
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Capture both models and save them, as done before navigating away. A view-only
    /// document is never written back.
    pub async fn save_before_leave(
        &mut self,
        name: &str,
        scene: &Scene,
        graph: &GraphDocument,
    ) -> bool {
        if scene.is_locked() || graph.is_read_only() {
            log::debug!("Not saving view-only document {}", self.document_id);
            return false;
        }
        self.save(capture_snapshot(name, scene, graph)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ObjectRecord;
    use crate::graph::NodeKind;
    use crate::shapes::{Rectangle, Shape};
    use crate::storage::{MemoryStore, NewDocument, block_on};
    use kurbo::Point;

    fn sample_models() -> (Scene, GraphDocument) {
        let mut scene = Scene::new();
        scene.add(Shape::Rectangle(Rectangle::new(Point::new(10.0, 10.0), 50.0, 30.0)));
        let mut graph = GraphDocument::new();
        graph.add_node(NodeKind::Custom, Point::new(250.0, 250.0)).unwrap();
        graph.add_node(NodeKind::AiChat, Point::new(600.0, 250.0)).unwrap();
        graph.connect("node-1", "node-2").unwrap();
        (scene, graph)
    }

    fn document_from(snapshot: &Snapshot) -> Document {
        let mut document = Document::new(snapshot.name.clone(), "u1");
        document.objects = snapshot.objects.clone();
        document.nodes = snapshot.nodes.clone();
        document.edges = snapshot.edges.clone();
        document
    }

    #[test]
    fn test_round_trip() {
        let (scene, graph) = sample_models();
        let snapshot = capture_snapshot("Board", &scene, &graph);

        let mut scene2 = Scene::new();
        let mut graph2 = GraphDocument::new();
        hydrate(&document_from(&snapshot), &mut scene2, &mut graph2, OpenMode::Edit);
        assert_eq!(capture_snapshot("Board", &scene2, &graph2), snapshot);
    }

    #[test]
    fn test_empty_round_trip() {
        let snapshot = capture_snapshot("Empty", &Scene::new(), &GraphDocument::new());
        assert!(snapshot.is_empty());

        let (mut scene, mut graph) = sample_models();
        hydrate(&document_from(&snapshot), &mut scene, &mut graph, OpenMode::Edit);
        assert!(scene.is_empty());
        assert!(graph.is_empty());
    }

    #[test]
    fn test_view_only_locks_everything() {
        let (scene, graph) = sample_models();
        let document = document_from(&capture_snapshot("Board", &scene, &graph));

        let mut scene2 = Scene::new();
        let mut graph2 = GraphDocument::new();
        hydrate(&document, &mut scene2, &mut graph2, OpenMode::ViewOnly);
        assert!(scene2.objects_ordered().all(|s| s.flags().is_empty()));
        assert!(scene2.objects_at_point(Point::new(10.0, 20.0), 5.0).is_empty());
        assert!(graph2.is_read_only());
    }

    #[test]
    fn test_view_only_lock_is_not_persisted() {
        let (scene, graph) = sample_models();
        let document = document_from(&capture_snapshot("Board", &scene, &graph));

        let mut scene2 = Scene::new();
        let mut graph2 = GraphDocument::new();
        hydrate(&document, &mut scene2, &mut graph2, OpenMode::ViewOnly);
        let snapshot = capture_snapshot("Board", &scene2, &graph2);
        assert_eq!(snapshot.objects, document.objects);
        assert_eq!(snapshot.objects[0].selectable, Some(true));

        let store = Arc::new(MemoryStore::new());
        let id = block_on(store.create(NewDocument::default())).unwrap();
        let mut bridge = PersistenceBridge::new(store.clone(), id.clone());
        assert!(!block_on(bridge.save_before_leave("Board", &scene2, &graph2)));
        assert!(block_on(store.get_by_id(&id)).unwrap().objects.is_empty());
    }

    #[test]
    fn test_malformed_records_repaired() {
        let mut document = Document::new("Board", "u1");
        let rect = ObjectRecord {
            id: Some("dup".to_string()),
            kind: "rect".to_string(),
            width: Some(5.0),
            height: Some(5.0),
            ..Default::default()
        };
        document.objects = vec![
            rect.clone(),
            rect,
            ObjectRecord {
                kind: "sparkle".to_string(),
                ..Default::default()
            },
        ];
        document.edges = vec![EdgeRecord {
            id: "e1".to_string(),
            source: "node-1".to_string(),
            target: "ghost".to_string(),
            ..Default::default()
        }];

        let mut scene = Scene::new();
        let mut graph = GraphDocument::new();
        let report = hydrate(&document, &mut scene, &mut graph, OpenMode::Edit);
        assert_eq!(report.objects, 2);
        assert_eq!(report.renamed, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(scene.len(), 2);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_save_and_failure() {
        let store = Arc::new(MemoryStore::new());
        let id = block_on(store.create(NewDocument::default())).unwrap();
        let (scene, graph) = sample_models();

        let mut bridge = PersistenceBridge::new(store.clone(), id.clone());
        assert!(block_on(bridge.save_before_leave("Board", &scene, &graph)));
        assert!(!bridge.is_saving());
        assert!(bridge.last_saved().is_some());

        let stored = block_on(bridge.load()).unwrap();
        assert_eq!(stored.objects.len(), 1);
        assert_eq!(stored.nodes.len(), 2);
        assert_eq!(stored.edges.len(), 1);

        let mut missing = PersistenceBridge::new(store, "missing");
        assert!(!block_on(missing.save(Snapshot::default())));
        assert!(missing.last_error().is_some());
    }
}
