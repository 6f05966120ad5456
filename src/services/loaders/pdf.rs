use std::path::Path;

use async_trait::async_trait;

use super::{check_file_size, default_max_file_size, file_title, DocumentLoader};
use crate::{
    errors::{AppError, AppResult},
    models::domain::{Document, DocumentMetadata},
};

pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
        }
    }
}

#[async_trait]
impl DocumentLoader for PdfLoader {
    async fn load(&self, path: &Path) -> AppResult<Vec<Document>> {
        check_file_size(path, self.max_file_size).await?;

        let path_buf = path.to_path_buf();
        let content = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text(&path_buf)
                .map_err(|e| AppError::DocumentLoad(format!("PDF extraction failed: {}", e)))
        })
        .await??;

        let mut metadata = DocumentMetadata::new(path.display().to_string(), "application/pdf");
        metadata.title = file_title(path);

        Ok(vec![Document::new(content, metadata)])
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}
