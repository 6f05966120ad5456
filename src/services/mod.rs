pub mod chat_model;
pub mod chunk_cache;
pub mod formatter;
pub mod interaction;
pub mod loaders;
pub mod quiz_service;
pub mod retriever;
pub mod session_service;
pub mod text_splitter;
pub mod upload_store;

pub use chat_model::{ChatModel, OpenAiChatModel};
pub use quiz_service::QuizService;
pub use retriever::{Retriever, WikipediaRetriever};
pub use session_service::SessionService;
