//! File-based document store.

use super::{
    BoxFuture, DocumentStore, DocumentUpdate, NewDocument, StorageError, StorageResult,
    sort_recent_first,
};
use crate::document::Document;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each document as a JSON file in one directory.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {e}"))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Store under the user's local data directory, `magiccanvas/canvases`.
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("magiccanvas").join("canvases"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File of document `id`. Ids other than ASCII letters, digits, `-` and `_` are
    /// rejected so that two ids never share a file.
    fn document_path(&self, id: &str) -> StorageResult<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::Invalid(format!("document id {id:?}")));
        }
        Ok(self.base_path.join(format!("{id}.json")))
    }

    fn read(&self, id: &str) -> StorageResult<Document> {
        let path = self.document_path(id)?;
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let json = fs::read_to_string(&path)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {e}", path.display())))?;
        Document::from_json(&json).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    fn write(&self, document: &Document) -> StorageResult<()> {
        let path = self.document_path(&document.id)?;
        let json = document
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&path, json)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", path.display())))
    }

    fn read_all(&self) -> StorageResult<Vec<Document>> {
        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| StorageError::Io(format!("Failed to read directory: {e}")))?;
        let mut documents = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|json| Document::from_json(&json).map_err(|e| e.to_string()));
            match parsed {
                Ok(document) => documents.push(document),
                Err(e) => log::warn!("Skipping unreadable document {}: {e}", path.display()),
            }
        }
        Ok(documents)
    }
}

impl DocumentStore for FileStore {
    fn create(&self, new: NewDocument) -> BoxFuture<'_, StorageResult<String>> {
        Box::pin(async move {
            let document = Document::new(new.name, new.owner_id);
            self.write(&document)?;
            log::info!("Created document {}", document.id);
            Ok(document.id)
        })
    }

    fn get_by_id(&self, id: &str) -> BoxFuture<'_, StorageResult<Document>> {
        let id = id.to_string();
        Box::pin(async move { self.read(&id) })
    }

    fn update(&self, id: &str, update: DocumentUpdate) -> BoxFuture<'_, StorageResult<Document>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut document = self.read(&id)?;
            update.apply(&mut document)?;
            self.write(&document)?;
            Ok(document)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.document_path(id);
        Box::pin(async move {
            let path = path?;
            if path.exists() {
                fs::remove_file(&path).map_err(|e| {
                    StorageError::Io(format!("Failed to delete {}: {e}", path.display()))
                })?;
            }
            Ok(())
        })
    }

    fn list_by_owner(&self, owner_id: &str) -> BoxFuture<'_, StorageResult<Vec<Document>>> {
        let owner_id = owner_id.to_string();
        Box::pin(async move {
            let mut owned: Vec<Document> = self
                .read_all()?
                .into_iter()
                .filter(|d| d.owner_id == owner_id)
                .collect();
            sort_recent_first(&mut owned);
            Ok(owned)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NodeRecord;
    use crate::storage::block_on;
    use tempfile::tempdir;

    fn new_doc(owner: &str) -> NewDocument {
        NewDocument {
            name: "Test Document".to_string(),
            owner_id: owner.to_string(),
        }
    }

    #[test]
    fn test_create_and_load() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        let id = block_on(store.create(new_doc("u1"))).unwrap();
        let loaded = block_on(store.get_by_id(&id)).unwrap();
        assert_eq!(loaded.name, "Test Document");
        assert!(dir.path().join(format!("{id}.json")).exists());
    }

    #[test]
    fn test_not_found() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let result = block_on(store.get_by_id("nonexistent"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_update_persists() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let id = block_on(store.create(new_doc("u1"))).unwrap();

        let update = DocumentUpdate {
            nodes: Some(vec![NodeRecord {
                id: "node-1".to_string(),
                kind: "custom".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        };
        block_on(store.update(&id, update)).unwrap();

        let reopened = FileStore::new(dir.path().to_path_buf()).unwrap();
        let loaded = block_on(reopened.get_by_id(&id)).unwrap();
        assert_eq!(loaded.nodes.len(), 1);
    }

    #[test]
    fn test_list_skips_foreign_and_garbage() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        block_on(store.create(new_doc("u1"))).unwrap();
        block_on(store.create(new_doc("u2"))).unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let list = block_on(store.list_by_owner("u1")).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        let id = block_on(store.create(new_doc("u1"))).unwrap();
        block_on(store.delete(&id)).unwrap();
        block_on(store.delete(&id)).unwrap();
        assert!(block_on(store.get_by_id(&id)).is_err());
    }

    #[test]
    fn test_rejects_unsafe_ids() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            store.document_path("doc-1_a").unwrap(),
            dir.path().join("doc-1_a.json")
        );
        for id in ["a/b", "../escape", "a:b", "", "caf\u{e9}"] {
            assert!(
                matches!(store.document_path(id), Err(StorageError::Invalid(_))),
                "{id}"
            );
        }
        block_on(store.create(new_doc("u1"))).unwrap();
        assert!(matches!(
            block_on(store.get_by_id("a/b")),
            Err(StorageError::Invalid(_))
        ));
        assert!(block_on(store.delete("a/b")).is_err());
    }
}
