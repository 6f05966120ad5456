use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    constants::quiz_prompt::WELCOME_MESSAGE,
    models::domain::{quiz::QuizQuestion, Document, ParsedQuiz, Session, SourceKind},
};

const SUMMARY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummaryDto {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    pub chars: usize,
    pub preview: String,
}

impl From<&Document> for DocumentSummaryDto {
    fn from(doc: &Document) -> Self {
        let preview = doc
            .metadata
            .extra
            .get("summary")
            .map(String::as_str)
            .unwrap_or(&doc.content)
            .chars()
            .take(SUMMARY_PREVIEW_CHARS)
            .collect();

        DocumentSummaryDto {
            source: doc.metadata.source.clone(),
            title: doc.metadata.title.clone(),
            chunk_index: doc.metadata.chunk_index,
            chars: doc.content.chars().count(),
            preview,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponseDto {
    pub id: Uuid,
    pub source: SourceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub document_count: usize,
    pub documents: Vec<DocumentSummaryDto>,
    pub can_generate: bool,
    /// Welcome text while there is nothing to quiz on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<Session> for SessionResponseDto {
    fn from(session: Session) -> Self {
        let can_generate = session.can_generate();
        SessionResponseDto {
            id: session.id,
            source: session.source,
            topic: session.topic,
            file_name: session.file_name,
            document_count: session.documents.len(),
            documents: session.documents.iter().map(DocumentSummaryDto::from).collect(),
            can_generate,
            message: (!can_generate).then(|| WELCOME_MESSAGE.to_string()),
            quiz: session.quiz,
            created_at: session.created_at,
            modified_at: session.modified_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizResponseDto {
    pub session_id: Uuid,
    pub raw: String,
    pub question_count: usize,
    pub questions: Vec<QuizQuestion>,
}

impl QuizResponseDto {
    pub fn new(session_id: Uuid, quiz: ParsedQuiz) -> Self {
        QuizResponseDto {
            session_id,
            raw: quiz.raw,
            question_count: quiz.questions.len(),
            questions: quiz.questions,
        }
    }
}
