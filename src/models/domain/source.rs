use serde::{Deserialize, Serialize};

/// Where the quiz context comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    WikipediaArticle,
    File,
}

/// Extensions accepted by the upload control.
pub const SUPPORTED_FILE_EXTENSIONS: &[&str] = &["pdf", "txt", "docx"];
