//! External services the capability modules depend on but do not own.

mod crossref;
mod search;

use async_trait::async_trait;
use thiserror::Error;

use crate::literature::Paper;

pub use crossref::CrossrefClient;
pub use search::SemanticScholarClient;

#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },

    #[error("No record found for {0}")]
    NotFound(String),

    #[error("Unexpected response from {service}: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

/// Bibliographic fields needed to format a citation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkMetadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub journal: Option<String>,
    pub year: Option<i32>,
}

/// Academic-metadata lookup keyed by DOI.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn lookup(&self, doi: &str) -> Result<WorkMetadata, CollaboratorError>;
}

/// Academic-paper search keyed by free-text topic.
#[async_trait]
pub trait PaperSearch: Send + Sync {
    async fn search(&self, topic: &str, limit: usize) -> Result<Vec<Paper>, CollaboratorError>;
}
