use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::domain::{document::Document, source::SourceKind};

/// State of one interactive quiz session.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub source: SourceKind,
    pub topic: Option<String>,
    pub file_name: Option<String>,
    pub documents: Arc<Vec<Document>>,
    pub quiz: Option<String>,
    /// Bumped by every user action that invalidates in-flight work.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source: SourceKind::default(),
            topic: None,
            file_name: None,
            documents: Arc::new(Vec::new()),
            quiz: None,
            revision: 0,
            created_at: now,
            modified_at: now,
        }
    }

    pub fn can_generate(&self) -> bool {
        !self.documents.is_empty()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_on_wikipedia_without_documents() {
        let session = Session::new();

        assert_eq!(session.source, SourceKind::WikipediaArticle);
        assert!(session.documents.is_empty());
        assert!(!session.can_generate());
        assert_eq!(session.revision, 0);
    }

    #[test]
    fn sessions_get_distinct_ids() {
        assert_ne!(Session::new().id, Session::new().id);
    }
}
