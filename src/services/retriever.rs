use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    config::{Config, MAX_WIKIPEDIA_RESULTS},
    errors::{AppError, AppResult},
    models::domain::{Document, DocumentMetadata},
};

/// Topic search returning whole documents, most relevant first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, topic: &str) -> AppResult<Vec<Document>>;
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
    pageid: u64,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    query: Option<PageQuery>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: String,
    fullurl: Option<String>,
    #[serde(default)]
    missing: bool,
}

/// MediaWiki API client: full-text search, then the plain-text extract of each hit.
pub struct WikipediaRetriever {
    client: reqwest::Client,
    api_url: String,
    top_k: usize,
    doc_content_chars_max: usize,
}

impl WikipediaRetriever {
    pub fn new(
        api_url: impl Into<String>,
        top_k: usize,
        doc_content_chars_max: usize,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            top_k: top_k.clamp(1, MAX_WIKIPEDIA_RESULTS),
            doc_content_chars_max,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.wikipedia_api_url.clone(),
            config.wikipedia_top_k,
            config.wikipedia_doc_chars_max,
        )
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    async fn search(&self, topic: &str) -> AppResult<Vec<SearchHit>> {
        let limit = self.top_k.to_string();
        let response: SearchResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", topic),
                ("srlimit", limit.as_str()),
                ("srprop", ""),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(api_error(err));
        }
        Ok(response.query.map(|q| q.search).unwrap_or_default())
    }

    async fn fetch_page(&self, hit: &SearchHit) -> AppResult<Option<Document>> {
        let page_id = hit.pageid.to_string();
        let response: PageResponse = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts|info"),
                ("inprop", "url"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("pageids", page_id.as_str()),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(api_error(err));
        }

        let page = response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .filter(|p| !p.missing);

        Ok(page.map(|page| self.page_to_document(page)))
    }

    fn page_to_document(&self, page: Page) -> Document {
        let content: String = page.extract.chars().take(self.doc_content_chars_max).collect();
        let summary = page
            .extract
            .split("\n")
            .map(str::trim)
            .find(|p| !p.is_empty())
            .unwrap_or_default()
            .to_string();
        let source = page
            .fullurl
            .unwrap_or_else(|| format!("wikipedia:{}", page.title));

        Document::new(
            content,
            DocumentMetadata::new(source, "text/plain")
                .with_title(page.title)
                .with_extra("summary", summary),
        )
    }
}

fn api_error(err: ApiError) -> AppError {
    AppError::Retrieval(format!("Wikipedia API error {}: {}", err.code, err.info))
}

#[async_trait]
impl Retriever for WikipediaRetriever {
    async fn retrieve(&self, topic: &str) -> AppResult<Vec<Document>> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Ok(Vec::new());
        }

        log::info!("Searching Wikipedia for '{}'", topic);
        let hits = self.search(topic).await?;

        let mut documents = Vec::with_capacity(self.top_k);
        for hit in hits.iter().take(self.top_k) {
            match self.fetch_page(hit).await? {
                Some(doc) => documents.push(doc),
                None => log::warn!("Wikipedia page '{}' vanished between search and fetch", hit.title),
            }
        }

        log::info!("Retrieved {} Wikipedia document(s) for '{}'", documents.len(), topic);
        Ok(documents)
    }
}
