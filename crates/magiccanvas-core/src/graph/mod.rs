//! Graph document model: typed nodes joined by directed edges.

mod edge;
pub mod generator;
mod node;

pub use edge::GraphEdge;
pub use generator::{CHAT_ERROR_REPLY, Generator, GeneratorError};
pub use node::{
    ChatMessage, ChatPayload, ChatRole, GraphNode, ImagePayload, NodeBehavior, NodeCard,
    NodeData, NodeKind, NodePayload, TextPayload, UiPayload,
};

use kurbo::{Point, Rect};
use thiserror::Error;

/// Graph model errors.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Unknown node: {0}")]
    UnknownNode(String),
    #[error("Edge {edge} references missing node {node}")]
    DanglingEdge { edge: String, node: String },
    #[error("Graph is view-only")]
    ViewOnly,
    #[error("Invalid node data: {0}")]
    Payload(String),
}

/// Nodes and edges of one canvas.
///
/// Every edge endpoint names a node in `nodes`; removing a node removes its edges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphDocument {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    read_only: bool,
}

impl GraphDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    fn check_writable(&self) -> Result<(), GraphError> {
        if self.read_only {
            Err(GraphError::ViewOnly)
        } else {
            Ok(())
        }
    }

    /// Drop every node and edge.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// Next free `node-N` id, starting from the node count plus one.
    fn next_node_id(&self) -> String {
        let mut seq = self.nodes.len() + 1;
        loop {
            let id = format!("node-{seq}");
            if !self.contains_node(&id) {
                return id;
            }
            seq += 1;
        }
    }

    /// Add a node of `kind` with its default payload. Returns the new id.
    pub fn add_node(&mut self, kind: NodeKind, position: Point) -> Result<String, GraphError> {
        self.check_writable()?;
        let id = self.next_node_id();
        self.nodes.push(GraphNode::new(id.clone(), kind, position));
        log::debug!("Added {} node {id}", kind.type_name());
        Ok(id)
    }

    /// Insert a fully built node, used when loading. A node with a taken id gets a fresh one.
    /// Returns the id the node ended up with.
    pub fn insert_node(&mut self, mut node: GraphNode) -> String {
        if node.id.is_empty() || self.contains_node(&node.id) {
            let fresh = self.next_node_id();
            log::warn!("Node id {:?} already in use, renamed to {fresh}", node.id);
            node.id = fresh;
        }
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    /// Insert a loaded edge after checking both endpoints.
    pub fn insert_edge(&mut self, edge: GraphEdge) -> Result<(), GraphError> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.contains_node(endpoint) {
                return Err(GraphError::DanglingEdge {
                    edge: edge.id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
        if self.edges.iter().any(|e| e.id == edge.id) {
            log::warn!("Skipping duplicate edge {}", edge.id);
            return Ok(());
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Connect `source` to `target`. Returns `None` if the connection already exists.
    pub fn connect(&mut self, source: &str, target: &str) -> Result<Option<String>, GraphError> {
        self.check_writable()?;
        for endpoint in [source, target] {
            if !self.contains_node(endpoint) {
                return Err(GraphError::UnknownNode(endpoint.to_string()));
            }
        }
        if self.edges.iter().any(|e| e.joins(source, target)) {
            return Ok(None);
        }
        let edge = GraphEdge::new(source, target);
        let id = edge.id.clone();
        self.edges.push(edge);
        Ok(Some(id))
    }

    /// Remove a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Result<GraphNode, GraphError> {
        self.check_writable()?;
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        let node = self.nodes.remove(index);
        let before = self.edges.len();
        self.edges.retain(|e| !e.touches(id));
        log::debug!("Removed node {id} and {} edges", before - self.edges.len());
        Ok(node)
    }

    pub fn remove_edge(&mut self, id: &str) -> Result<Option<GraphEdge>, GraphError> {
        self.check_writable()?;
        let index = self.edges.iter().position(|e| e.id == id);
        Ok(index.map(|i| self.edges.remove(i)))
    }

    /// Delete selected nodes (with their edges) and selected edges.
    /// Returns the number of nodes and edges removed.
    pub fn delete_selected(&mut self) -> Result<(usize, usize), GraphError> {
        self.check_writable()?;
        let (nodes_before, edges_before) = (self.nodes.len(), self.edges.len());
        let doomed: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id.clone())
            .collect();
        self.nodes.retain(|n| !n.selected);
        self.edges
            .retain(|e| !e.selected && !doomed.iter().any(|id| e.touches(id)));
        Ok((
            nodes_before - self.nodes.len(),
            edges_before - self.edges.len(),
        ))
    }

    pub fn has_selection(&self) -> bool {
        self.nodes.iter().any(|n| n.selected) || self.edges.iter().any(|e| e.selected)
    }

    pub fn move_node(&mut self, id: &str, position: Point) -> Result<(), GraphError> {
        self.check_writable()?;
        let node = self
            .node_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        node.position = position;
        Ok(())
    }

    /// Shallow-merge `patch` into a node's data.
    pub fn update_node_payload(&mut self, id: &str, patch: NodeData) -> Result<(), GraphError> {
        self.check_writable()?;
        let node = self
            .node_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        node.update_payload(patch)
    }

    /// Select one node. With `additive` the existing selection is kept.
    pub fn select_node(&mut self, id: &str, additive: bool) -> Result<(), GraphError> {
        if !self.contains_node(id) {
            return Err(GraphError::UnknownNode(id.to_string()));
        }
        if !additive {
            self.clear_selection();
        }
        if let Some(node) = self.node_mut(id) {
            node.selected = true;
        }
        Ok(())
    }

    /// Select one edge. Returns false if there is no such edge.
    pub fn select_edge(&mut self, id: &str, additive: bool) -> bool {
        if self.edge(id).is_none() {
            return false;
        }
        if !additive {
            self.clear_selection();
        }
        for edge in &mut self.edges {
            if edge.id == id {
                edge.selected = true;
            }
        }
        true
    }

    pub fn clear_selection(&mut self) {
        self.nodes.iter_mut().for_each(|n| n.selected = false);
        self.edges.iter_mut().for_each(|e| e.selected = false);
    }

    /// Bounding box of every node card.
    pub fn bounds(&self) -> Option<Rect> {
        self.nodes
            .iter()
            .map(GraphNode::bounds)
            .reduce(|acc, r| acc.union(r))
    }

    /// Send a chat prompt through an AI node.
    pub async fn submit_chat(
        &mut self,
        id: &str,
        prompt: &str,
        generator: &dyn Generator,
    ) -> Result<bool, GraphError> {
        self.check_writable()?;
        let node = self
            .node_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))?;
        match &mut node.payload {
            NodePayload::AiChat(chat) => Ok(chat.submit(prompt, generator).await),
            other => Err(GraphError::Payload(format!(
                "{} nodes do not chat",
                other.kind().type_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph_with(n: usize) -> GraphDocument {
        let mut graph = GraphDocument::new();
        for _ in 0..n {
            graph.add_node(NodeKind::Custom, Point::new(250.0, 250.0)).unwrap();
        }
        graph
    }

    #[test]
    fn test_sequential_ids_never_collide() {
        let mut graph = graph_with(3);
        graph.remove_node("node-1").unwrap();
        // Two nodes left; "node-3" is taken so the next id skips ahead.
        let id = graph.add_node(NodeKind::AiChat, Point::ZERO).unwrap();
        assert_eq!(id, "node-4");
        assert_eq!(graph.node(&id).unwrap().payload.label(), "AI Response");
    }

    #[test]
    fn test_connect_rules() {
        let mut graph = graph_with(2);
        let id = graph.connect("node-1", "node-2").unwrap();
        assert_eq!(id.as_deref(), Some("reactflow__edge-node-1-node-2"));
        assert_eq!(graph.connect("node-1", "node-2").unwrap(), None);
        assert_eq!(
            graph.connect("node-1", "node-9"),
            Err(GraphError::UnknownNode("node-9".to_string()))
        );
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_node_removal_cascades() {
        let mut graph = graph_with(3);
        graph.connect("node-1", "node-2").unwrap();
        graph.connect("node-2", "node-3").unwrap();
        graph.connect("node-1", "node-3").unwrap();

        graph.remove_node("node-2").unwrap();
        assert_eq!(graph.edges().len(), 1);
        for edge in graph.edges() {
            assert!(graph.contains_node(&edge.source));
            assert!(graph.contains_node(&edge.target));
        }
    }

    #[test]
    fn test_delete_selected() {
        let mut graph = graph_with(3);
        graph.connect("node-1", "node-2").unwrap();
        let edge = graph.connect("node-2", "node-3").unwrap().unwrap();

        graph.select_node("node-1", false).unwrap();
        assert!(graph.select_edge(&edge, true));
        assert_eq!(graph.delete_selected().unwrap(), (1, 2));
        assert!(graph.edges().is_empty());
        assert!(!graph.has_selection());
    }

    #[test]
    fn test_insert_edge_rejects_dangling() {
        let mut graph = graph_with(1);
        let result = graph.insert_edge(GraphEdge::new("node-1", "ghost"));
        assert!(matches!(result, Err(GraphError::DanglingEdge { .. })));
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_insert_node_renames_duplicate() {
        let mut graph = graph_with(1);
        let id = graph.insert_node(GraphNode::new("node-1", NodeKind::Custom, Point::ZERO));
        assert_eq!(id, "node-2");
        assert_eq!(graph.nodes().len(), 2);
    }

    #[test]
    fn test_read_only_rejects_mutation() {
        let mut graph = graph_with(2);
        graph.set_read_only(true);
        assert_eq!(graph.add_node(NodeKind::Custom, Point::ZERO), Err(GraphError::ViewOnly));
        assert_eq!(graph.connect("node-1", "node-2"), Err(GraphError::ViewOnly));
        assert_eq!(graph.move_node("node-1", Point::ZERO), Err(GraphError::ViewOnly));
        assert!(graph.remove_node("node-1").is_err());
        assert_eq!(graph.nodes().len(), 2);
    }

    #[test]
    fn test_update_payload_merges() {
        let mut graph = graph_with(1);
        let patch = json!({ "content": "hello" }).as_object().cloned().unwrap();
        graph.update_node_payload("node-1", patch).unwrap();
        let node = graph.node("node-1").unwrap();
        assert_eq!(node.payload.content(), "hello");
        assert_eq!(node.payload.label(), "Text Node");
    }

    #[test]
    fn test_bounds_cover_cards() {
        let mut graph = GraphDocument::new();
        assert_eq!(graph.bounds(), None);
        graph.add_node(NodeKind::Custom, Point::new(0.0, 0.0)).unwrap();
        graph.add_node(NodeKind::Custom, Point::new(100.0, 400.0)).unwrap();
        assert_eq!(graph.bounds(), Some(Rect::new(0.0, 0.0, 400.0, 550.0)));
    }
}
