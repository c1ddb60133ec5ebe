use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{CollaboratorError, MetadataLookup, WorkMetadata};

const SERVICE: &str = "crossref";

/// Crossref REST API (`GET /works/{doi}`).
pub struct CrossrefClient {
    client: Client,
    base_url: String,
}

impl CrossrefClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: "https://api.crossref.org".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for CrossrefClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct WorkEnvelope {
    message: Work,
}

#[derive(Debug, Deserialize)]
struct Work {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    author: Vec<Author>,
    #[serde(rename = "container-title", default)]
    container_title: Vec<String>,
    #[serde(rename = "published-print")]
    published_print: Option<PartialDate>,
    #[serde(rename = "published-online")]
    published_online: Option<PartialDate>,
    issued: Option<PartialDate>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    given: String,
    #[serde(default)]
    family: String,
}

#[derive(Debug, Deserialize)]
struct PartialDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i32>>>,
}

impl PartialDate {
    fn year(&self) -> Option<i32> {
        self.date_parts.first()?.first().copied().flatten()
    }
}

impl From<Work> for WorkMetadata {
    fn from(work: Work) -> Self {
        let year = [&work.published_print, &work.published_online, &work.issued]
            .into_iter()
            .flatten()
            .find_map(PartialDate::year);

        WorkMetadata {
            title: work.title.into_iter().find(|t| !t.trim().is_empty()),
            authors: work
                .author
                .into_iter()
                .map(|a| format!("{} {}", a.given, a.family).trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            journal: work.container_title.into_iter().find(|t| !t.trim().is_empty()),
            year,
        }
    }
}

#[async_trait]
impl MetadataLookup for CrossrefClient {
    async fn lookup(&self, doi: &str) -> Result<WorkMetadata, CollaboratorError> {
        let url = format!("{}/works/{}", self.base_url, doi);
        log::debug!("Looking up DOI metadata: {}", url);

        let response = self.client.get(&url).send().await?;
        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(CollaboratorError::NotFound(doi.to_string())),
            status => {
                return Err(CollaboratorError::Status {
                    service: SERVICE,
                    status: status.as_u16(),
                })
            }
        }

        let envelope: WorkEnvelope =
            response
                .json()
                .await
                .map_err(|e| CollaboratorError::Decode {
                    service: SERVICE,
                    message: e.to_string(),
                })?;

        Ok(envelope.message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn network_tests_disabled() -> bool {
        std::env::var_os("CODEX_SANDBOX_NETWORK_DISABLED").is_some()
    }

    #[test]
    fn year_falls_back_to_online_then_issued() {
        let work: Work = serde_json::from_value(json!({
            "title": ["Deep Learning"],
            "author": [{ "given": "Yann", "family": "LeCun" }, { "family": "Bengio" }],
            "container-title": ["Nature"],
            "published-online": { "date-parts": [[2015, 5, 27]] },
            "issued": { "date-parts": [[2014]] }
        }))
        .unwrap();

        let metadata = WorkMetadata::from(work);
        assert_eq!(metadata.title.as_deref(), Some("Deep Learning"));
        assert_eq!(metadata.authors, vec!["Yann LeCun", "Bengio"]);
        assert_eq!(metadata.journal.as_deref(), Some("Nature"));
        assert_eq!(metadata.year, Some(2015));
    }

    #[tokio::test]
    async fn lookup_reads_work_message() {
        if network_tests_disabled() {
            return;
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/works/10.1038/nature14539"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "message": {
                    "title": ["Deep learning"],
                    "author": [{ "given": "Yann", "family": "LeCun" }],
                    "container-title": ["Nature"],
                    "published-print": { "date-parts": [[2015, 5]] }
                }
            })))
            .mount(&server)
            .await;

        let client = CrossrefClient::new().with_base_url(server.uri());
        let metadata = client.lookup("10.1038/nature14539").await.unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Deep learning"));
        assert_eq!(metadata.year, Some(2015));
    }

    #[tokio::test]
    async fn lookup_maps_missing_doi_to_not_found() {
        if network_tests_disabled() {
            return;
        }

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Resource not found."))
            .mount(&server)
            .await;

        let client = CrossrefClient::new().with_base_url(server.uri());
        let err = client.lookup("10.0000/missing").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::NotFound(doi) if doi == "10.0000/missing"));
    }
}
