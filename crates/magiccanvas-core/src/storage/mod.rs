//! Document store abstraction for persistence.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::document::{Document, EdgeRecord, NodeRecord, ObjectRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid document: {0}")]
    Invalid(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future returned by stores and generators.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Fields needed to create a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner_id: String,
}

/// Partial update. Present arrays replace the stored ones wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects: Option<Vec<ObjectRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<NodeRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<EdgeRecord>>,
}

impl DocumentUpdate {
    /// Check the update against the document it will replace parts of. Object and node ids
    /// must be unique and every edge must join two nodes.
    pub fn validate(&self, current: &Document) -> StorageResult<()> {
        let objects = self.objects.as_ref().unwrap_or(&current.objects);
        let mut seen = HashSet::new();
        for id in objects.iter().filter_map(|o| o.id.as_deref()) {
            if !seen.insert(id) {
                return Err(StorageError::Invalid(format!("duplicate object id {id}")));
            }
        }

        let nodes = self.nodes.as_ref().unwrap_or(&current.nodes);
        let mut node_ids = HashSet::new();
        for node in nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(StorageError::Invalid(format!("duplicate node id {}", node.id)));
            }
        }

        let edges = self.edges.as_ref().unwrap_or(&current.edges);
        for edge in edges {
            for end in [&edge.source, &edge.target] {
                if !node_ids.contains(end.as_str()) {
                    return Err(StorageError::Invalid(format!(
                        "edge {} references unknown node {end}",
                        edge.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validate, then apply to `document` and bump its modification time. An invalid
    /// update leaves the document untouched.
    pub fn apply(self, document: &mut Document) -> StorageResult<()> {
        self.validate(document)?;
        if let Some(name) = self.name {
            document.name = name;
        }
        if let Some(objects) = self.objects {
            document.objects = objects;
        }
        if let Some(nodes) = self.nodes {
            document.nodes = nodes;
        }
        if let Some(edges) = self.edges {
            document.edges = edges;
        }
        document.touch();
        Ok(())
    }
}

/// Backend that keeps canvas documents.
///
/// Implementations can keep documents in memory, on the filesystem or behind a remote
/// database service.
pub trait DocumentStore: Send + Sync {
    /// Create an empty document and return its id.
    fn create(&self, new: NewDocument) -> BoxFuture<'_, StorageResult<String>>;

    fn get_by_id(&self, id: &str) -> BoxFuture<'_, StorageResult<Document>>;

    /// Apply an update and return the stored result.
    fn update(&self, id: &str, update: DocumentUpdate) -> BoxFuture<'_, StorageResult<Document>>;

    /// Delete a document. Deleting a missing document succeeds.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;

    /// Documents of one owner, most recently updated first.
    fn list_by_owner(&self, owner_id: &str) -> BoxFuture<'_, StorageResult<Vec<Document>>>;
}

fn sort_recent_first(documents: &mut [Document]) {
    documents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// Simple blocking executor for tests.
#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}
