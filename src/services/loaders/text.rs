use std::path::Path;

use async_trait::async_trait;

use super::{check_file_size, default_max_file_size, file_title, DocumentLoader};
use crate::{
    errors::AppResult,
    models::domain::{Document, DocumentMetadata},
};

pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
        }
    }
}

#[async_trait]
impl DocumentLoader for TextLoader {
    async fn load(&self, path: &Path) -> AppResult<Vec<Document>> {
        check_file_size(path, self.max_file_size).await?;

        let bytes = tokio::fs::read(path).await?;
        let content = String::from_utf8_lossy(&bytes).into_owned();

        let mut metadata = DocumentMetadata::new(path.display().to_string(), "text/plain");
        metadata.title = file_title(path);

        Ok(vec![Document::new(content, metadata)])
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt"]
    }
}
