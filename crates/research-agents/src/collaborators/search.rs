use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{CollaboratorError, PaperSearch};
use crate::literature::Paper;

const SERVICE: &str = "paper search";
const FIELDS: &str = "title,authors,abstract,year,citationCount,url,venue";
// The API refuses larger pages.
const MAX_PAGE: usize = 100;

/// Semantic Scholar Graph API paper search.
pub struct SemanticScholarClient {
    client: Client,
    base_url: String,
}

impl SemanticScholarClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "https://api.semanticscholar.org/graph/v1".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for SemanticScholarClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(default)]
    authors: Vec<SearchAuthor>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    year: Option<i32>,
    citation_count: Option<u64>,
    url: Option<String>,
    venue: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchAuthor {
    name: Option<String>,
}

impl SearchHit {
    fn into_paper(self, index: usize) -> Paper {
        Paper {
            id: self.paper_id.unwrap_or_else(|| index.to_string()),
            title: self.title.unwrap_or_else(|| "Unknown".to_string()),
            authors: self.authors.into_iter().filter_map(|a| a.name).collect(),
            abstract_text: self.abstract_text.unwrap_or_default(),
            year: self
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            citations: self.citation_count.unwrap_or(0),
            url: self.url.unwrap_or_default(),
            venue: self.venue.unwrap_or_default(),
            ..Paper::default()
        }
    }
}

#[async_trait]
impl PaperSearch for SemanticScholarClient {
    async fn search(&self, topic: &str, limit: usize) -> Result<Vec<Paper>, CollaboratorError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let limit = limit.min(MAX_PAGE);
        let response = self
            .client
            .get(format!("{}/paper/search", self.base_url))
            .query(&[
                ("query", topic.to_string()),
                ("limit", limit.to_string()),
                ("fields", FIELDS.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CollaboratorError::Status {
                service: SERVICE,
                status: response.status().as_u16(),
            });
        }

        let page: SearchPage = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Decode {
                service: SERVICE,
                message: e.to_string(),
            })?;

        Ok(page
            .data
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, hit)| hit.into_paper(index))
            .collect())
    }
}
