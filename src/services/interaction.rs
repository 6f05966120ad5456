//! Session state transitions.
//!
//! Every user interaction is an [`Action`]. [`reduce`] maps the current session
//! and an action to the next session plus at most one [`Effect`] for the runner
//! to execute. Results of effects come back as actions tagged with the revision
//! that requested them; results for an outdated revision are dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    models::domain::{Document, Session, SourceKind},
    services::formatter::format_docs,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SelectSource(SourceKind),
    UploadFile { file_name: String, bytes: Vec<u8> },
    SubmitTopic(String),
    Generate,
    DocumentsLoaded {
        revision: u64,
        documents: Arc<Vec<Document>>,
    },
    QuizCompleted { revision: u64, quiz: String },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SelectSource(_) => "select_source",
            Action::UploadFile { .. } => "upload_file",
            Action::SubmitTopic(_) => "submit_topic",
            Action::Generate => "generate",
            Action::DocumentsLoaded { .. } => "documents_loaded",
            Action::QuizCompleted { .. } => "quiz_completed",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    LoadFile {
        revision: u64,
        file_name: String,
        bytes: Vec<u8>,
    },
    SearchTopic { revision: u64, topic: String },
    GenerateQuiz { revision: u64, context: String },
}

impl Effect {
    pub fn revision(&self) -> u64 {
        match self {
            Effect::LoadFile { revision, .. }
            | Effect::SearchTopic { revision, .. }
            | Effect::GenerateQuiz { revision, .. } => *revision,
        }
    }
}

/// Next state for `session` after `action`, and the side effect it asks for.
pub fn reduce(session: &Session, action: Action, now: DateTime<Utc>) -> (Session, Option<Effect>) {
    let mut next = session.clone();

    let effect = match action {
        Action::SelectSource(source) => {
            if source == session.source {
                return (next, None);
            }
            start_revision(&mut next, now);
            next.source = source;
            next.topic = None;
            next.file_name = None;
            None
        }
        Action::UploadFile { file_name, bytes } => {
            if session.source != SourceKind::File {
                return (next, None);
            }
            start_revision(&mut next, now);
            next.file_name = Some(file_name.clone());
            Some(Effect::LoadFile {
                revision: next.revision,
                file_name,
                bytes,
            })
        }
        Action::SubmitTopic(topic) => {
            if session.source != SourceKind::WikipediaArticle {
                return (next, None);
            }
            start_revision(&mut next, now);
            let topic = topic.trim().to_string();
            if topic.is_empty() {
                next.topic = None;
                None
            } else {
                next.topic = Some(topic.clone());
                Some(Effect::SearchTopic {
                    revision: next.revision,
                    topic,
                })
            }
        }
        Action::Generate => {
            if !session.can_generate() {
                return (next, None);
            }
            next.revision += 1;
            next.quiz = None;
            next.modified_at = now;
            Some(Effect::GenerateQuiz {
                revision: next.revision,
                context: format_docs(&session.documents),
            })
        }
        Action::DocumentsLoaded {
            revision,
            documents,
        } => {
            if revision != session.revision {
                return (next, None);
            }
            next.documents = documents;
            next.modified_at = now;
            None
        }
        Action::QuizCompleted { revision, quiz } => {
            if revision != session.revision {
                return (next, None);
            }
            next.quiz = Some(quiz);
            next.modified_at = now;
            None
        }
    };

    (next, effect)
}

/// Forget everything derived from the previous source selection.
fn start_revision(session: &mut Session, now: DateTime<Utc>) {
    session.revision += 1;
    session.documents = Arc::new(Vec::new());
    session.quiz = None;
    session.modified_at = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::DocumentMetadata;

    fn docs(texts: &[&str]) -> Arc<Vec<Document>> {
        Arc::new(
            texts
                .iter()
                .map(|t| Document::new(*t, DocumentMetadata::new("test", "text/plain")))
                .collect(),
        )
    }

    fn apply(session: &Session, action: Action) -> (Session, Option<Effect>) {
        reduce(session, action, Utc::now())
    }

    fn with_documents(source: SourceKind, texts: &[&str]) -> Session {
        let mut session = Session::new();
        session.source = source;
        session.documents = docs(texts);
        session
    }

    #[test]
    fn selecting_same_source_changes_nothing() {
        let session = with_documents(SourceKind::WikipediaArticle, &["kept"]);
        let (next, effect) = apply(&session, Action::SelectSource(SourceKind::WikipediaArticle));

        assert_eq!(next, session);
        assert!(effect.is_none());
    }

    #[test]
    fn switching_source_drops_documents_and_quiz() {
        let mut session = with_documents(SourceKind::WikipediaArticle, &["old"]);
        session.topic = Some("Rome".to_string());
        session.quiz = Some("Question: ...".to_string());

        let (next, effect) = apply(&session, Action::SelectSource(SourceKind::File));

        assert_eq!(next.source, SourceKind::File);
        assert!(next.documents.is_empty());
        assert!(next.quiz.is_none());
        assert!(next.topic.is_none());
        assert_eq!(next.revision, session.revision + 1);
        assert!(effect.is_none());
    }

    #[test]
    fn upload_in_wikipedia_mode_is_ignored() {
        let session = Session::new();
        let (next, effect) = apply(
            &session,
            Action::UploadFile {
                file_name: "a.txt".to_string(),
                bytes: b"text".to_vec(),
            },
        );

        assert_eq!(next, session);
        assert!(effect.is_none());
    }

    #[test]
    fn upload_in_file_mode_requests_load() {
        let mut session = Session::new();
        session.source = SourceKind::File;

        let (next, effect) = apply(
            &session,
            Action::UploadFile {
                file_name: "a.txt".to_string(),
                bytes: b"text".to_vec(),
            },
        );

        assert_eq!(next.file_name.as_deref(), Some("a.txt"));
        assert_eq!(
            effect,
            Some(Effect::LoadFile {
                revision: next.revision,
                file_name: "a.txt".to_string(),
                bytes: b"text".to_vec(),
            })
        );
    }

    #[test]
    fn topic_in_file_mode_is_ignored() {
        let mut session = Session::new();
        session.source = SourceKind::File;

        let (next, effect) = apply(&session, Action::SubmitTopic("Rome".to_string()));
        assert_eq!(next, session);
        assert!(effect.is_none());
    }

    #[test]
    fn blank_topic_clears_documents_without_search() {
        let session = with_documents(SourceKind::WikipediaArticle, &["previous"]);

        let (next, effect) = apply(&session, Action::SubmitTopic("   ".to_string()));

        assert!(next.documents.is_empty());
        assert!(!next.can_generate());
        assert!(effect.is_none());
    }

    #[test]
    fn topic_is_trimmed_and_searched() {
        let session = Session::new();
        let (next, effect) = apply(&session, Action::SubmitTopic("  Roman Empire ".to_string()));

        assert_eq!(next.topic.as_deref(), Some("Roman Empire"));
        assert_eq!(
            effect,
            Some(Effect::SearchTopic {
                revision: 1,
                topic: "Roman Empire".to_string(),
            })
        );
    }

    #[test]
    fn generate_without_documents_is_a_noop() {
        let session = Session::new();
        let (next, effect) = apply(&session, Action::Generate);

        assert_eq!(next, session);
        assert!(effect.is_none());
    }

    #[test]
    fn generate_formats_documents_into_context() {
        let session = with_documents(SourceKind::File, &["first", "second"]);
        let (next, effect) = apply(&session, Action::Generate);

        assert_eq!(
            effect,
            Some(Effect::GenerateQuiz {
                revision: next.revision,
                context: "first\n\nsecond".to_string(),
            })
        );
    }

    #[test]
    fn stale_results_are_dropped() {
        let session = Session::new();
        let (searching, effect) = apply(&session, Action::SubmitTopic("Rome".to_string()));
        let stale_revision = effect.unwrap().revision();
        let (switched, _) = apply(&searching, Action::SelectSource(SourceKind::File));

        let (after, _) = apply(
            &switched,
            Action::DocumentsLoaded {
                revision: stale_revision,
                documents: docs(&["late"]),
            },
        );

        assert!(after.documents.is_empty());
    }

    #[test]
    fn current_results_are_applied() {
        let session = Session::new();
        let (searching, effect) = apply(&session, Action::SubmitTopic("Rome".to_string()));
        let revision = effect.unwrap().revision();

        let (loaded, _) = apply(
            &searching,
            Action::DocumentsLoaded {
                revision,
                documents: docs(&["Rome is..."]),
            },
        );
        assert!(loaded.can_generate());

        let (generating, effect) = apply(&loaded, Action::Generate);
        let revision = effect.unwrap().revision();
        let (done, _) = apply(
            &generating,
            Action::QuizCompleted {
                revision,
                quiz: "Question: ?".to_string(),
            },
        );
        assert_eq!(done.quiz.as_deref(), Some("Question: ?"));
    }

    #[test]
    fn action_names_match_interaction_vocabulary() {
        assert_eq!(Action::SelectSource(SourceKind::File).name(), "select_source");
        assert_eq!(Action::SubmitTopic(String::new()).name(), "submit_topic");
        assert_eq!(Action::Generate.name(), "generate");
    }
}
