use crate::models::domain::Document;

pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Join document contents, in order, into the prompt context.
pub fn format_docs(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
