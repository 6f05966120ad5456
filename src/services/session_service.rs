use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use chrono::Utc;
use futures::{stream, StreamExt};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    errors::{AppError, AppResult},
    models::domain::{Document, Session, SourceKind},
    services::{
        chat_model::TokenStream,
        chunk_cache::ChunkCache,
        interaction::{reduce, Action, Effect},
        loaders::{ensure_supported, file_title, load_and_split},
        quiz_service::QuizService,
        retriever::Retriever,
        text_splitter::TextChunker,
        upload_store::{sanitize_file_name, UploadStore},
    },
};

type SessionMap = Arc<RwLock<HashMap<Uuid, Session>>>;

#[derive(Default)]
struct Transcript {
    text: String,
    failed: bool,
}

/// Owns every live session and runs the effects their actions ask for.
///
/// No lock is held while a file is loaded, Wikipedia is queried or the model
/// streams; results are applied through [`reduce`] with the revision that
/// requested them.
#[derive(Clone)]
pub struct SessionService {
    sessions: SessionMap,
    uploads: UploadStore,
    cache: ChunkCache,
    splitter: Arc<TextChunker>,
    retriever: Arc<dyn Retriever>,
    quiz_service: Arc<QuizService>,
    max_upload_bytes: usize,
}

impl SessionService {
    pub fn new(
        uploads: UploadStore,
        splitter: Arc<TextChunker>,
        retriever: Arc<dyn Retriever>,
        quiz_service: Arc<QuizService>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            uploads,
            cache: ChunkCache::new(),
            splitter,
            retriever,
            quiz_service,
            max_upload_bytes,
        }
    }

    pub async fn create_session(&self) -> Session {
        let session = Session::new();
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        log::info!("Created session {}", session.id);
        session
    }

    pub async fn get_session(&self, id: &Uuid) -> AppResult<Session> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| session_not_found(id))
    }

    pub async fn select_source(&self, id: Uuid, source: SourceKind) -> AppResult<Session> {
        let (session, _) = apply(&self.sessions, id, Action::SelectSource(source)).await?;
        Ok(session)
    }

    pub async fn submit_topic(&self, id: Uuid, topic: String) -> AppResult<Session> {
        let (session, effect) = apply(&self.sessions, id, Action::SubmitTopic(topic)).await?;
        match effect {
            Some(effect) => self.run(id, effect).await,
            None => Ok(session),
        }
    }

    pub async fn upload_file(
        &self,
        id: Uuid,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> AppResult<Session> {
        let file_name = sanitize_file_name(file_name)?;
        ensure_supported(Path::new(&file_name))?;
        if bytes.is_empty() {
            return Err(AppError::ValidationError(format!("{} is empty", file_name)));
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(AppError::ValidationError(format!(
                "{} is {} bytes, the limit is {}",
                file_name,
                bytes.len(),
                self.max_upload_bytes
            )));
        }

        let (session, effect) =
            apply(&self.sessions, id, Action::UploadFile { file_name, bytes }).await?;
        match effect {
            Some(effect) => self.run(id, effect).await,
            None => Ok(session),
        }
    }

    /// Start streaming a quiz for the session's documents.
    ///
    /// `None` means there is nothing to quiz on yet. The finished text is stored
    /// on the session once the stream has been drained without error.
    pub async fn generate(&self, id: Uuid) -> AppResult<Option<TokenStream>> {
        let (_, effect) = apply(&self.sessions, id, Action::Generate).await?;
        let Some(Effect::GenerateQuiz { revision, context }) = effect else {
            return Ok(None);
        };

        let tokens = self.quiz_service.generate(&context).await?;

        let transcript = Arc::new(Mutex::new(Transcript::default()));
        let sink = transcript.clone();
        let tokens = tokens.inspect(move |item| {
            if let Ok(mut t) = sink.lock() {
                match item {
                    Ok(text) => t.text.push_str(text),
                    Err(_) => t.failed = true,
                }
            }
        });

        let sessions = self.sessions.clone();
        let finish = stream::once(async move {
            let quiz = match transcript.lock() {
                Ok(t) if !t.failed => Some(t.text.clone()),
                _ => None,
            };
            match quiz {
                Some(quiz) => {
                    if let Err(e) =
                        apply(&sessions, id, Action::QuizCompleted { revision, quiz }).await
                    {
                        log::warn!("Could not store quiz for session {}: {}", id, e);
                    }
                }
                None => log::warn!("Quiz stream for session {} ended with an error", id),
            }
        })
        .filter_map(|_| async { None::<AppResult<String>> });

        Ok(Some(Box::pin(tokens.chain(finish))))
    }

    async fn run(&self, id: Uuid, effect: Effect) -> AppResult<Session> {
        let revision = effect.revision();
        let documents = match effect {
            Effect::LoadFile {
                file_name, bytes, ..
            } => self.load_file(&file_name, bytes).await?,
            Effect::SearchTopic { topic, .. } => Arc::new(self.retriever.retrieve(&topic).await?),
            Effect::GenerateQuiz { .. } => {
                return Err(AppError::InternalError(
                    "quiz generation is streamed, not run inline".to_string(),
                ))
            }
        };

        log::info!(
            "Session {} revision {} loaded {} document(s)",
            id,
            revision,
            documents.len()
        );
        let (session, _) = apply(
            &self.sessions,
            id,
            Action::DocumentsLoaded {
                revision,
                documents,
            },
        )
        .await?;
        Ok(session)
    }

    async fn load_file(&self, file_name: &str, bytes: Vec<u8>) -> AppResult<Arc<Vec<Document>>> {
        let path = self.uploads.save(file_name, &bytes).await?;
        let splitter = self.splitter.clone();
        let max_file_size = self.max_upload_bytes as u64;

        let documents = self
            .cache
            .get_or_try_insert_with(file_name, &bytes, || async {
                load_and_split(&path, &splitter, max_file_size).await
            })
            .await?;
        log::debug!("Chunk cache holds {} file(s)", self.cache.entry_count().await);

        Ok(relabel(documents, &path))
    }
}

/// Point cached chunks at the upload they are being served for.
///
/// Identical bytes share one cache entry, so chunks first loaded from another
/// file name still carry that file's source and title.
fn relabel(documents: Arc<Vec<Document>>, path: &Path) -> Arc<Vec<Document>> {
    let source = path.display().to_string();
    let title = file_title(path);
    if documents
        .iter()
        .all(|d| d.metadata.source == source && d.metadata.title == title)
    {
        return documents;
    }

    let relabelled = documents
        .iter()
        .map(|d| {
            let mut d = d.clone();
            d.metadata.source = source.clone();
            d.metadata.title = title.clone();
            d
        })
        .collect();
    Arc::new(relabelled)
}

async fn apply(
    sessions: &SessionMap,
    id: Uuid,
    action: Action,
) -> AppResult<(Session, Option<Effect>)> {
    let mut sessions = sessions.write().await;
    let current = sessions.get(&id).ok_or_else(|| session_not_found(&id))?;

    log::debug!("Session {} <- {}", id, action.name());
    let (next, effect) = reduce(current, action, Utc::now());
    sessions.insert(id, next.clone());
    Ok((next, effect))
}

fn session_not_found(id: &Uuid) -> AppError {
    AppError::NotFound(format!("Session {} not found", id))
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use mockall::predicate::{always, eq};

    use super::*;
    use crate::{
        models::domain::DocumentMetadata,
        services::{
            chat_model::MockChatModel,
            retriever::MockRetriever,
            text_splitter::{Characters, SplitterConfig},
        },
    };

    fn service(
        dir: &Path,
        retriever: MockRetriever,
        model: MockChatModel,
    ) -> SessionService {
        let splitter = TextChunker::new(
            SplitterConfig {
                chunk_size: 20,
                chunk_overlap: 0,
            },
            Arc::new(Characters),
        )
        .unwrap();

        SessionService::new(
            UploadStore::new(dir),
            Arc::new(splitter),
            Arc::new(retriever),
            Arc::new(QuizService::new(Arc::new(model))),
            1024,
        )
    }

    fn article(text: &str) -> Document {
        Document::new(text, DocumentMetadata::new("wikipedia:Rome", "text/plain"))
    }

    fn streaming_model(parts: &'static [&'static str]) -> MockChatModel {
        let mut model = MockChatModel::new();
        model.expect_model_name().return_const("mock-model".to_string());
        model
            .expect_stream_chat()
            .with(always(), eq(0.1f32))
            .times(1)
            .returning(move |_, _| {
                let items: Vec<AppResult<String>> =
                    parts.iter().map(|p| Ok(p.to_string())).collect();
                Ok(Box::pin(stream::iter(items)))
            });
        model
    }

    async fn drain(tokens: TokenStream) -> String {
        tokens
            .map(|t| t.unwrap())
            .collect::<Vec<_>>()
            .await
            .concat()
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), MockRetriever::new(), MockChatModel::new());

        let err = svc.get_session(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn topic_search_fills_documents() {
        let dir = tempfile::tempdir().unwrap();
        let mut retriever = MockRetriever::new();
        retriever
            .expect_retrieve()
            .withf(|topic| topic == "Rome")
            .times(1)
            .returning(|_| Ok(vec![article("Rome is the capital of Italy.")]));
        let svc = service(dir.path(), retriever, MockChatModel::new());

        let session = svc.create_session().await;
        let session = svc.submit_topic(session.id, " Rome ".to_string()).await.unwrap();

        assert_eq!(session.topic.as_deref(), Some("Rome"));
        assert_eq!(session.documents.len(), 1);
        assert!(session.can_generate());
    }

    #[tokio::test]
    async fn retrieval_failure_leaves_nothing_to_generate() {
        let dir = tempfile::tempdir().unwrap();
        let mut retriever = MockRetriever::new();
        retriever
            .expect_retrieve()
            .returning(|_| Err(AppError::Retrieval("offline".to_string())));
        let svc = service(dir.path(), retriever, MockChatModel::new());

        let session = svc.create_session().await;
        let err = svc.submit_topic(session.id, "Rome".to_string()).await.unwrap_err();

        assert!(matches!(err, AppError::Retrieval(_)));
        assert!(!svc.get_session(&session.id).await.unwrap().can_generate());
    }

    #[tokio::test]
    async fn file_mode_never_searches_wikipedia() {
        let dir = tempfile::tempdir().unwrap();
        let mut retriever = MockRetriever::new();
        retriever.expect_retrieve().times(0);
        let svc = service(dir.path(), retriever, MockChatModel::new());

        let session = svc.create_session().await;
        svc.select_source(session.id, SourceKind::File).await.unwrap();
        let session = svc
            .submit_topic(session.id, "Rome".to_string())
            .await
            .unwrap();

        assert!(session.topic.is_none());
        assert!(session.documents.is_empty());
    }

    #[tokio::test]
    async fn upload_in_wikipedia_mode_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), MockRetriever::new(), MockChatModel::new());

        let session = svc.create_session().await;
        let session = svc
            .upload_file(session.id, "notes.txt", b"some notes".to_vec())
            .await
            .unwrap();

        assert!(session.file_name.is_none());
        assert!(session.documents.is_empty());
        assert!(!dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn uploaded_text_is_saved_and_chunked() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), MockRetriever::new(), MockChatModel::new());

        let session = svc.create_session().await;
        svc.select_source(session.id, SourceKind::File).await.unwrap();
        let session = svc
            .upload_file(
                session.id,
                "notes.txt",
                b"first line here\nsecond line here\nthird".to_vec(),
            )
            .await
            .unwrap();

        assert_eq!(session.file_name.as_deref(), Some("notes.txt"));
        assert_eq!(session.documents.len(), 3);
        assert!(session.documents.iter().all(|d| d.content.chars().count() <= 20));
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn identical_bytes_under_new_name_are_saved_and_relabelled() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), MockRetriever::new(), MockChatModel::new());
        let bytes = b"first line here\nsecond line here".to_vec();

        let session = svc.create_session().await;
        svc.select_source(session.id, SourceKind::File).await.unwrap();
        svc.upload_file(session.id, "a.txt", bytes.clone())
            .await
            .unwrap();
        let session = svc
            .upload_file(session.id, "b.txt", bytes)
            .await
            .unwrap();

        assert!(dir.path().join("b.txt").exists());
        assert_eq!(session.file_name.as_deref(), Some("b.txt"));
        assert_eq!(session.documents.len(), 2);
        for doc in session.documents.iter() {
            assert!(doc.metadata.source.ends_with("b.txt"));
            assert_eq!(doc.metadata.title.as_deref(), Some("b.txt"));
        }
    }

    #[tokio::test]
    async fn unsupported_upload_is_rejected_before_state_changes() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), MockRetriever::new(), MockChatModel::new());

        let session = svc.create_session().await;
        let before = svc.select_source(session.id, SourceKind::File).await.unwrap();
        let err = svc
            .upload_file(session.id, "slides.pptx", b"PK".to_vec())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnsupportedFormat(_)));
        assert_eq!(svc.get_session(&session.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), MockRetriever::new(), MockChatModel::new());

        let session = svc.create_session().await;
        svc.select_source(session.id, SourceKind::File).await.unwrap();
        let err = svc
            .upload_file(session.id, "big.txt", vec![b'a'; 2048])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn generate_without_documents_skips_the_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut model = MockChatModel::new();
        model.expect_stream_chat().times(0);
        let svc = service(dir.path(), MockRetriever::new(), model);

        let session = svc.create_session().await;
        assert!(svc.generate(session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn generated_quiz_is_stored_after_the_stream_ends() {
        let dir = tempfile::tempdir().unwrap();
        let mut retriever = MockRetriever::new();
        retriever
            .expect_retrieve()
            .returning(|_| Ok(vec![article("Rome was founded in 753 BC.")]));
        let model = streaming_model(&["Question: When was Rome founded?\n", "Answers: 753 BC(o)|1 AD"]);
        let svc = service(dir.path(), retriever, model);

        let session = svc.create_session().await;
        svc.submit_topic(session.id, "Rome".to_string()).await.unwrap();

        let tokens = svc.generate(session.id).await.unwrap().unwrap();
        assert!(svc.get_session(&session.id).await.unwrap().quiz.is_none());

        let text = drain(tokens).await;
        assert_eq!(text, "Question: When was Rome founded?\nAnswers: 753 BC(o)|1 AD");

        let stored = svc.get_session(&session.id).await.unwrap();
        assert_eq!(stored.quiz.as_deref(), Some(text.as_str()));
    }

    #[tokio::test]
    async fn quiz_for_abandoned_source_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let mut retriever = MockRetriever::new();
        retriever
            .expect_retrieve()
            .returning(|_| Ok(vec![article("Rome was founded in 753 BC.")]));
        let model = streaming_model(&["Question: ?"]);
        let svc = service(dir.path(), retriever, model);

        let session = svc.create_session().await;
        svc.submit_topic(session.id, "Rome".to_string()).await.unwrap();
        let tokens = svc.generate(session.id).await.unwrap().unwrap();

        svc.select_source(session.id, SourceKind::File).await.unwrap();
        drain(tokens).await;

        let stored = svc.get_session(&session.id).await.unwrap();
        assert!(stored.quiz.is_none());
        assert_eq!(stored.source, SourceKind::File);
    }
}
