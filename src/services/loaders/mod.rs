pub mod docx;
pub mod pdf;
pub mod text;

use std::path::Path;

use async_trait::async_trait;

use crate::{
    config::DEFAULT_MAX_UPLOAD_BYTES,
    errors::{AppError, AppResult},
    models::domain::{source::SUPPORTED_FILE_EXTENSIONS, Document},
    services::text_splitter::TextChunker,
};

pub use docx::DocxLoader;
pub use pdf::PdfLoader;
pub use text::TextLoader;

#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, path: &Path) -> AppResult<Vec<Document>>;

    fn supported_extensions(&self) -> &[&str];
}

/// Lower-cased extension of a file name or path.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn ensure_supported(path: &Path) -> AppResult<String> {
    let ext = extension_of(path).unwrap_or_default();
    if SUPPORTED_FILE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(AppError::UnsupportedFormat(format!(
            "'{}' is not one of: {}",
            path.display(),
            SUPPORTED_FILE_EXTENSIONS.join(", ")
        )))
    }
}

pub fn loader_for(path: &Path, max_file_size: u64) -> AppResult<Box<dyn DocumentLoader>> {
    match ensure_supported(path)?.as_str() {
        "pdf" => Ok(Box::new(PdfLoader { max_file_size })),
        "docx" => Ok(Box::new(DocxLoader { max_file_size })),
        _ => Ok(Box::new(TextLoader { max_file_size })),
    }
}

/// Load a cached upload with the loader for its extension and split the result.
pub async fn load_and_split(
    path: &Path,
    splitter: &TextChunker,
    max_file_size: u64,
) -> AppResult<Vec<Document>> {
    let loader = loader_for(path, max_file_size)?;
    let documents = loader.load(path).await?;
    Ok(splitter.split_documents(&documents))
}

pub(crate) async fn check_file_size(path: &Path, max_file_size: u64) -> AppResult<u64> {
    let meta = tokio::fs::metadata(path).await?;
    if meta.len() > max_file_size {
        return Err(AppError::DocumentLoad(format!(
            "file too large: {} bytes (limit {})",
            meta.len(),
            max_file_size
        )));
    }
    Ok(meta.len())
}

pub(crate) fn file_title(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
}

pub(crate) const fn default_max_file_size() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES as u64
}
