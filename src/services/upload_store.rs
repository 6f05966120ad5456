use std::path::PathBuf;

use crate::errors::{AppError, AppResult};

/// Raw uploads cached on disk as `<root>/<file-name>`.
///
/// A second upload with the same name replaces the earlier bytes.
#[derive(Clone, Debug)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, file_name: &str) -> AppResult<PathBuf> {
        Ok(self.root.join(sanitize_file_name(file_name)?))
    }

    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> AppResult<PathBuf> {
        let path = self.path_for(file_name)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, bytes).await?;

        log::info!("Cached upload {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// Keep only the final path component of a client supplied name.
pub fn sanitize_file_name(file_name: &str) -> AppResult<String> {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::ValidationError(format!(
            "Invalid upload file name '{}'",
            file_name
        )));
    }
    Ok(name.to_string())
}
