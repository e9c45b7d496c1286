//! Server settings read from the environment.

use magiccanvas_core::{DocumentStore, FileStore, MemoryStore, StorageError};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

const ADDR_VAR: &str = "MAGICCANVAS_ADDR";
const DATA_DIR_VAR: &str = "MAGICCANVAS_DATA_DIR";
const DEFAULT_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 3030);

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Directory for the file store. Documents stay in memory when unset.
    pub data_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(DEFAULT_ADDR),
            data_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(addr) = get(ADDR_VAR) {
            match addr.parse() {
                Ok(addr) => config.addr = addr,
                Err(e) => tracing::warn!("Ignoring {ADDR_VAR}={addr}: {e}"),
            }
        }
        config.data_dir = get(DATA_DIR_VAR)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);
        config
    }

    /// Open the configured document store.
    pub fn open_store(&self) -> Result<Arc<dyn DocumentStore>, StorageError> {
        match &self.data_dir {
            Some(dir) => {
                tracing::info!("Storing canvases in {}", dir.display());
                Ok(Arc::new(FileStore::new(dir.clone())?))
            }
            None => {
                tracing::info!("Storing canvases in memory");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_vars(vars(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr.port(), 3030);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_vars(vars(&[
            (ADDR_VAR, "127.0.0.1:8080"),
            (DATA_DIR_VAR, "/tmp/canvases"),
        ]));
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/canvases")));
    }

    #[test]
    fn test_bad_addr_keeps_default() {
        let config = ServerConfig::from_vars(vars(&[(ADDR_VAR, "nowhere"), (DATA_DIR_VAR, " ")]));
        assert_eq!(config, ServerConfig::default());
    }
}
