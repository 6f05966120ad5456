//! Token-bounded chunking of loaded documents.
//!
//! Splitting is delegated to `text-splitter`, which breaks at the highest
//! semantic level that fits: line breaks first, then sentences, words and
//! finally graphemes. Chunk size is measured by a pluggable [`ChunkSizer`].

use std::sync::Arc;

use once_cell::sync::Lazy;
use text_splitter::{ChunkConfig, TextSplitter};
use tiktoken_rs::CoreBPE;

use crate::{
    config::{Config, DEFAULT_CHUNK_SIZE_TOKENS},
    errors::{AppError, AppResult},
    models::domain::Document,
};

pub use text_splitter::{Characters, ChunkSizer};

static CL100K: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| tiktoken_rs::cl100k_base().map_err(|e| e.to_string()));

/// Token counter backed by the `cl100k_base` encoding used by the chat models.
#[derive(Clone, Copy)]
pub struct TiktokenSizer {
    bpe: &'static CoreBPE,
}

impl TiktokenSizer {
    pub fn cl100k() -> AppResult<Self> {
        match &*CL100K {
            Ok(bpe) => Ok(Self { bpe }),
            Err(e) => Err(AppError::InternalError(format!(
                "Failed to load cl100k_base encoding: {}",
                e
            ))),
        }
    }
}

impl ChunkSizer for TiktokenSizer {
    fn size(&self, chunk: &str) -> usize {
        self.bpe.encode_ordinary(chunk).len()
    }
}

#[derive(Clone)]
struct SharedSizer(Arc<dyn ChunkSizer + Send + Sync>);

impl ChunkSizer for SharedSizer {
    fn size(&self, chunk: &str) -> usize {
        self.0.size(chunk)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE_TOKENS,
            chunk_overlap: 0,
        }
    }
}

impl SplitterConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.chunk_size_tokens,
            chunk_overlap: config.chunk_overlap_tokens,
        }
    }
}

/// Splits documents into trimmed chunks that never exceed `chunk_size`.
pub struct TextChunker {
    config: SplitterConfig,
    sizer: SharedSizer,
    splitter: TextSplitter<SharedSizer>,
}

impl TextChunker {
    pub fn new(config: SplitterConfig, sizer: Arc<dyn ChunkSizer + Send + Sync>) -> AppResult<Self> {
        if config.chunk_size == 0 {
            return Err(AppError::ValidationError(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(AppError::ValidationError(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }

        let sizer = SharedSizer(sizer);
        let chunk_config = ChunkConfig::new(config.chunk_size)
            .with_sizer(sizer.clone())
            .with_overlap(config.chunk_overlap)
            .map_err(|e| AppError::ValidationError(e.to_string()))?
            .with_trim(true);

        Ok(Self {
            config,
            sizer,
            splitter: TextSplitter::new(chunk_config),
        })
    }

    pub fn from_tiktoken_encoder(config: SplitterConfig) -> AppResult<Self> {
        Self::new(config, Arc::new(TiktokenSizer::cl100k()?))
    }

    pub fn size_of(&self, text: &str) -> usize {
        self.sizer.size(text)
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.splitter.chunks(text).map(str::to_string).collect()
    }

    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        let chunks: Vec<Document> = documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .enumerate()
                    .map(|(i, chunk)| doc.fragment(chunk, i))
                    .collect::<Vec<_>>()
            })
            .collect();

        log::debug!(
            "Split {} document(s) into {} chunk(s) (chunk_size={}, overlap={})",
            documents.len(),
            chunks.len(),
            self.config.chunk_size,
            self.config.chunk_overlap
        );
        chunks
    }
}
