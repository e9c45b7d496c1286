//! In-memory document store.

use super::{
    BoxFuture, DocumentStore, DocumentUpdate, NewDocument, StorageError, StorageResult,
    sort_recent_first,
};
use crate::document::Document;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store for tests and ephemeral servers.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Document>>,
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {e}"))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a complete document, replacing any with the same id.
    pub fn insert(&self, document: Document) -> StorageResult<()> {
        let mut docs = self.documents.write().map_err(lock_error)?;
        docs.insert(document.id.clone(), document);
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn create(&self, new: NewDocument) -> BoxFuture<'_, StorageResult<String>> {
        Box::pin(async move {
            let document = Document::new(new.name, new.owner_id);
            let id = document.id.clone();
            self.insert(document)?;
            Ok(id)
        })
    }

    fn get_by_id(&self, id: &str) -> BoxFuture<'_, StorageResult<Document>> {
        let id = id.to_string();
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            docs.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn update(&self, id: &str, update: DocumentUpdate) -> BoxFuture<'_, StorageResult<Document>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut docs = self.documents.write().map_err(lock_error)?;
            let document = docs.get_mut(&id).ok_or(StorageError::NotFound(id))?;
            update.apply(document)?;
            Ok(document.clone())
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut docs = self.documents.write().map_err(lock_error)?;
            docs.remove(&id);
            Ok(())
        })
    }

    fn list_by_owner(&self, owner_id: &str) -> BoxFuture<'_, StorageResult<Vec<Document>>> {
        let owner_id = owner_id.to_string();
        Box::pin(async move {
            let docs = self.documents.read().map_err(lock_error)?;
            let mut owned: Vec<Document> = docs
                .values()
                .filter(|d| d.owner_id == owner_id)
                .cloned()
                .collect();
            sort_recent_first(&mut owned);
            Ok(owned)
        })
    }
}
