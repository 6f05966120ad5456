use std::{collections::HashMap, future::Future, sync::Arc};

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::{errors::AppResult, models::domain::Document};

pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[derive(Default)]
struct CacheTables {
    by_hash: HashMap<String, Arc<Vec<Document>>>,
    hash_by_name: HashMap<String, String>,
}

/// Memoized chunk sequences of uploaded files, keyed by the SHA-256 of their bytes.
///
/// Uploading different bytes under a name seen before drops the entry that name
/// pointed to.
#[derive(Clone, Default)]
pub struct ChunkCache {
    tables: Arc<RwLock<CacheTables>>,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_try_insert_with<F, Fut>(
        &self,
        file_name: &str,
        bytes: &[u8],
        load: F,
    ) -> AppResult<Arc<Vec<Document>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Vec<Document>>>,
    {
        let key = content_hash(bytes);

        {
            let mut tables = self.tables.write().await;
            tables.forget_if_changed(file_name, &key);
            if let Some(hit) = tables.by_hash.get(&key).cloned() {
                log::debug!("Chunk cache hit for {} ({})", file_name, &key[..12]);
                tables.hash_by_name.insert(file_name.to_string(), key);
                return Ok(hit);
            }
        }

        log::debug!("Chunk cache miss for {} ({})", file_name, &key[..12]);
        let documents = Arc::new(load().await?);

        let mut tables = self.tables.write().await;
        tables.forget_if_changed(file_name, &key);
        let documents = tables
            .by_hash
            .entry(key.clone())
            .or_insert(documents)
            .clone();
        tables.hash_by_name.insert(file_name.to_string(), key);
        Ok(documents)
    }

    pub async fn entry_count(&self) -> usize {
        self.tables.read().await.by_hash.len()
    }
}

impl CacheTables {
    /// Drop `file_name` and, once no other name uses it, the entry it pointed to.
    fn forget(&mut self, file_name: &str) -> bool {
        match self.hash_by_name.remove(file_name) {
            Some(hash) => {
                if !self.hash_by_name.values().any(|h| *h == hash) {
                    self.by_hash.remove(&hash);
                }
                true
            }
            None => false,
        }
    }

    fn forget_if_changed(&mut self, file_name: &str, key: &str) {
        if self
            .hash_by_name
            .get(file_name)
            .is_some_and(|previous| previous != key)
        {
            log::info!("Upload {} changed content, invalidating cached chunks", file_name);
            self.forget(file_name);
        }
    }
}
