use std::path::Path;

use async_trait::async_trait;
use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};

use super::{check_file_size, default_max_file_size, file_title, DocumentLoader};
use crate::{
    errors::{AppError, AppResult},
    models::domain::{Document, DocumentMetadata},
};

const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub struct DocxLoader {
    pub max_file_size: u64,
}

impl Default for DocxLoader {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
        }
    }
}

#[async_trait]
impl DocumentLoader for DocxLoader {
    async fn load(&self, path: &Path) -> AppResult<Vec<Document>> {
        check_file_size(path, self.max_file_size).await?;

        let bytes = tokio::fs::read(path).await?;
        let content = tokio::task::spawn_blocking(move || docx_to_text(&bytes)).await??;

        let mut metadata = DocumentMetadata::new(path.display().to_string(), DOCX_CONTENT_TYPE);
        metadata.title = file_title(path);

        Ok(vec![Document::new(content, metadata)])
    }

    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }
}

/// Body text of a `.docx`, one line per non-empty paragraph.
pub fn docx_to_text(bytes: &[u8]) -> AppResult<String> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| AppError::DocumentLoad(format!("DOCX parse failed: {:?}", e)))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(para) => Some(paragraph_text(para)),
            _ => None,
        })
        .filter(|text| !text.trim().is_empty())
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(para: &Paragraph) -> String {
    let mut out = String::new();
    push_children(&para.children, &mut out);
    out
}

fn push_children(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for rc in &run.children {
                    match rc {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_children(&link.children, out),
            _ => {}
        }
    }
}
