use std::sync::Arc;

use crate::{
    config::Config,
    errors::AppResult,
    services::{
        text_splitter::{SplitterConfig, TextChunker},
        upload_store::UploadStore,
        ChatModel, OpenAiChatModel, QuizService, Retriever, SessionService, WikipediaRetriever,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub session_service: Arc<SessionService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let retriever = Arc::new(WikipediaRetriever::from_config(&config)?);
        let model = Arc::new(OpenAiChatModel::from_config(&config));
        let splitter = TextChunker::from_tiktoken_encoder(SplitterConfig::from_config(&config))?;

        Ok(Self::with_components(config, retriever, model, splitter))
    }

    /// Wire the state around caller-supplied retriever and model.
    pub fn with_components(
        config: Config,
        retriever: Arc<dyn Retriever>,
        model: Arc<dyn ChatModel>,
        splitter: TextChunker,
    ) -> Self {
        let session_service = SessionService::new(
            UploadStore::new(config.cache_dir.clone()),
            Arc::new(splitter),
            retriever,
            Arc::new(QuizService::new(model)),
            config.max_upload_bytes,
        );

        Self {
            session_service: Arc::new(session_service),
            config: Arc::new(config),
        }
    }
}
