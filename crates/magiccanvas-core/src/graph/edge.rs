//! Directed connections between graph nodes.

/// A directed edge. Both endpoints must name nodes of the same graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Edge renderer type, when not the default.
    pub kind: Option<String>,
    pub animated: bool,
    pub selected: bool,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: Self::default_id(&source, &target),
            source,
            target,
            kind: None,
            animated: false,
            selected: false,
        }
    }

    /// Id the graph view assigns to a handle-less connection.
    pub fn default_id(source: &str, target: &str) -> String {
        format!("reactflow__edge-{source}-{target}")
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    pub fn joins(&self, source: &str, target: &str) -> bool {
        self.source == source && self.target == target
    }
}
