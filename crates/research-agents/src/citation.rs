use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use research_llm::LLMGateway;
use serde_json::json;

use crate::agent::{log_activity, ResearchAgent};
use crate::collaborators::MetadataLookup;
use crate::error::{require_non_empty, Result};
use crate::parser;
use crate::prompt::{PromptFields, PromptTemplate};

/// Supported style keys and their full names, in display order.
pub const CITATION_STYLES: [(&str, &str); 7] = [
    ("apa", "American Psychological Association"),
    ("mla", "Modern Language Association"),
    ("chicago", "Chicago Manual of Style"),
    ("harvard", "Harvard Referencing"),
    ("ieee", "IEEE"),
    ("vancouver", "Vancouver"),
    ("ama", "American Medical Association"),
];

const TEMPERATURE: f32 = 0.3;

const CITE_FROM_DOI: PromptTemplate = PromptTemplate {
    id: "citation.from_doi",
    system: "You are a citation expert. Generate accurate citations in the requested format.",
    body: r#"
Generate a {style_name} citation for the following paper metadata:

Title: {title}
Authors: {authors}
Journal: {journal}
Year: {year}
DOI: {doi}

Please format this as a proper {style_code} citation.
"#,
    fields: &["style_name", "title", "authors", "journal", "year", "doi", "style_code"],
};

const CITE_FROM_URL: PromptTemplate = PromptTemplate {
    id: "citation.from_url",
    system: "You are a citation expert. Generate citations based on available information and note when manual verification is needed.",
    body: r#"
Generate a {style_name} citation for the following paper URL:

URL: {url}

Please analyze the URL and generate an appropriate citation. If you cannot determine specific details, use placeholders like [Author] or [Title] and note that manual verification is needed.

Format as a proper {style_code} citation.
"#,
    fields: &["style_name", "url", "style_code"],
};

pub(crate) const TEMPLATES: &[&PromptTemplate] = &[&CITE_FROM_DOI, &CITE_FROM_URL];

lazy_static! {
    // Tried in order; the first pattern that matches wins.
    static ref DOI_PATTERNS: [Regex; 3] = [
        Regex::new(r"doi\.org/(.+)").expect("Failed to compile doi.org regex"),
        Regex::new(r"doi:(.+)").expect("Failed to compile doi: regex"),
        Regex::new(r"10\.\d{4,}/[-._;()/:\w]+").expect("Failed to compile bare DOI regex"),
    ];
}

/// Pull a DOI out of a URL. Uses the first capture group when the pattern
/// has one, the whole match otherwise.
pub fn extract_doi(url: &str) -> Option<String> {
    DOI_PATTERNS.iter().find_map(|pattern| {
        pattern.captures(url).and_then(|caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
        })
    })
}

/// Full style name for known keys; anything else is used literally.
pub fn style_name(style: &str) -> &str {
    CITATION_STYLES
        .iter()
        .find(|(key, _)| *key == style)
        .map(|(_, name)| *name)
        .unwrap_or(style)
}

pub struct CitationAgent {
    llm: Arc<dyn LLMGateway>,
    metadata: Arc<dyn MetadataLookup>,
}

impl CitationAgent {
    pub fn new(llm: Arc<dyn LLMGateway>, metadata: Arc<dyn MetadataLookup>) -> Self {
        Self { llm, metadata }
    }

    pub fn available_styles(&self) -> Vec<&'static str> {
        CITATION_STYLES.iter().map(|(key, _)| *key).collect()
    }

    pub async fn generate_citation(&self, paper_url: &str, style: &str) -> Result<String> {
        require_non_empty(&[("paper_url", paper_url)])?;
        log_activity(
            self.name(),
            "generate_citation",
            json!({ "paper_url": paper_url, "style": style }),
        );

        match extract_doi(paper_url) {
            Some(doi) => self
                .citation_from_doi(&doi, style)
                .await
                .map_err(|e| e.context("Failed to generate citation from DOI")),
            None => self
                .citation_from_url(paper_url, style)
                .await
                .map_err(|e| e.context("Failed to generate citation from URL")),
        }
    }

    async fn citation_from_doi(&self, doi: &str, style: &str) -> Result<String> {
        let metadata = self.metadata.lookup(doi).await?;
        let or_unknown = |value: Option<String>| value.unwrap_or_else(|| "Unknown".to_string());

        let authors = if metadata.authors.is_empty() {
            "Unknown".to_string()
        } else {
            metadata.authors.join(", ")
        };

        let fields = PromptFields::new()
            .with("style_name", style_name(style))
            .with("title", or_unknown(metadata.title))
            .with("authors", authors)
            .with("journal", or_unknown(metadata.journal))
            .with("year", or_unknown(metadata.year.map(|y| y.to_string())))
            .with("doi", doi)
            .with("style_code", style.to_uppercase());

        let text = self
            .llm
            .complete(&CITE_FROM_DOI.render(&fields), TEMPERATURE)
            .await?;
        Ok(parser::plain_text(&text))
    }

    async fn citation_from_url(&self, url: &str, style: &str) -> Result<String> {
        let fields = PromptFields::new()
            .with("style_name", style_name(style))
            .with("url", url)
            .with("style_code", style.to_uppercase());

        let text = self
            .llm
            .complete(&CITE_FROM_URL.render(&fields), TEMPERATURE)
            .await?;
        Ok(parser::plain_text(&text))
    }
}

impl ResearchAgent for CitationAgent {
    fn key(&self) -> &'static str {
        "citation"
    }

    fn name(&self) -> &'static str {
        "CitationAgent"
    }

    fn description(&self) -> &'static str {
        "Research Paper Citation Assistant - Generates citations in various formats"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "Generate citations from paper URLs",
            "Generate citations from DOIs",
            "Support multiple citation styles",
            "Extract metadata from academic papers",
        ]
    }
}
