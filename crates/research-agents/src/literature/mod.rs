mod paper;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use research_llm::LLMGateway;
use serde::Serialize;
use serde_json::{json, Value};

use crate::agent::{log_activity, ResearchAgent};
use crate::collaborators::PaperSearch;
use crate::error::{require_non_empty, Result};
use crate::parser;
use crate::prompt::{PromptFields, PromptTemplate};

pub use paper::Paper;

pub const CATEGORIES: [&str; 9] = [
    "Methodology",
    "Findings",
    "Theory",
    "Review",
    "Case Study",
    "Experimental",
    "Survey",
    "Meta-analysis",
    "Systematic Review",
];

/// Keyword rules for categorizing without the model. First rule with a
/// matching keyword wins.
const FALLBACK_RULES: [(&str, &[&str]); 6] = [
    ("Methodology", &["method", "methodology", "approach"]),
    ("Findings", &["finding", "result", "outcome"]),
    ("Theory", &["theory", "theoretical"]),
    ("Review", &["review", "survey"]),
    ("Case Study", &["case study", "case"]),
    ("Experimental", &["experiment", "experimental"]),
];

const FALLBACK_CATEGORY: &str = "Review";

const SEARCH_WITH_LLM: PromptTemplate = PromptTemplate {
    id: "literature.search",
    system: "You are a research assistant. Generate realistic academic paper information based on the given topic.",
    body: r#"
Generate a list of {max_results} academic papers related to the topic: "{topic}"

For each paper, provide:
- Title
- Authors (comma-separated)
- Abstract (brief summary)
- Year of publication
- Journal/Conference venue
- Estimated citation count

Format as a JSON array of objects with keys: title, authors, abstract, year, citations, venue, id
"#,
    fields: &["max_results", "topic"],
};

const CATEGORIZE: PromptTemplate = PromptTemplate {
    id: "literature.categorize",
    system: "You are a research methodology expert. Categorize papers based on their research approach and focus.",
    body: r#"
Categorize the following academic papers into the most appropriate categories:

Available categories: {categories}

Papers:
{papers}

For each paper, determine the primary category based on its title, abstract, and venue.
Return a JSON object where keys are category names and values are arrays of paper indices (0-based).
"#,
    fields: &["categories", "papers"],
};

const SUMMARIZE: PromptTemplate = PromptTemplate {
    id: "literature.summary",
    system: "You are a literature review expert. Generate comprehensive summaries of academic literature.",
    body: r#"
Generate a comprehensive literature review summary based on the following papers:

{papers}

The summary should include:
1. Main themes and trends
2. Key findings across papers
3. Research gaps identified
4. Future research directions

Write in academic style with clear structure.
"#,
    fields: &["papers"],
};

pub(crate) const TEMPLATES: &[&PromptTemplate] = &[&SEARCH_WITH_LLM, &CATEGORIZE, &SUMMARIZE];

/// Category name to papers, always holding every category in declared order.
pub type CategorizedPapers = IndexMap<String, Vec<Paper>>;

#[derive(Debug, Clone, Serialize)]
pub struct LiteratureReview {
    pub papers: Vec<Paper>,
    pub categorized_papers: CategorizedPapers,
    pub summary: String,
    pub topic: String,
    pub search_date: DateTime<Utc>,
}

pub struct LiteratureAgent {
    llm: Arc<dyn LLMGateway>,
    search: Arc<dyn PaperSearch>,
}

impl LiteratureAgent {
    pub fn new(llm: Arc<dyn LLMGateway>, search: Arc<dyn PaperSearch>) -> Self {
        Self { llm, search }
    }

    /// Search for papers on `topic`. When the search service is unavailable
    /// the model is asked to produce plausible records instead; those are
    /// approximate and unverified.
    pub async fn search_papers(&self, topic: &str, max_results: usize) -> Result<Vec<Paper>> {
        require_non_empty(&[("topic", topic)])?;
        log_activity(
            self.name(),
            "search_papers",
            json!({ "topic": topic, "max_results": max_results }),
        );

        match self.search.search(topic, max_results).await {
            Ok(mut papers) => {
                papers.truncate(max_results);
                Ok(papers)
            }
            Err(e) => {
                log::warn!("Paper search failed, asking the model instead: {}", e);
                Ok(self.search_with_llm(topic, max_results).await)
            }
        }
    }

    async fn search_with_llm(&self, topic: &str, max_results: usize) -> Vec<Paper> {
        let fields = PromptFields::new()
            .with("max_results", max_results)
            .with("topic", topic);

        let placeholder = || -> Vec<Paper> {
            std::iter::once(Paper::placeholder(topic))
                .take(max_results)
                .collect()
        };

        let response = match self.llm.complete(&SEARCH_WITH_LLM.render(&fields), 0.7).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Model paper search failed: {}", e);
                return placeholder();
            }
        };

        match parser::decode_array(&response) {
            Ok(items) => {
                let papers: Vec<Paper> = items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value::<Paper>(item).ok())
                    .filter(Paper::has_title)
                    .take(max_results)
                    .collect();
                if papers.is_empty() {
                    log::warn!("Model paper list had no titled records");
                    return placeholder();
                }
                papers
            }
            Err(e) => {
                log::warn!("Could not parse model paper list: {}", e);
                placeholder()
            }
        }
    }

    /// Assign each paper to one of [`CATEGORIES`]. Unknown category names
    /// and out-of-range indices from the model are dropped; if the model
    /// call or its output fails, keyword rules place every paper.
    pub async fn categorize_papers(&self, papers: &[Paper]) -> CategorizedPapers {
        log_activity(
            self.name(),
            "categorize_papers",
            json!({ "paper_count": papers.len() }),
        );

        if papers.is_empty() {
            return empty_categories();
        }

        let listing = papers
            .iter()
            .map(|p| format!("Title: {}\nAbstract: {}\nVenue: {}", p.title, p.abstract_text, p.venue))
            .collect::<Vec<_>>()
            .join("\n\n");
        let fields = PromptFields::new()
            .with("categories", CATEGORIES.join(", "))
            .with("papers", listing);

        let response = match self.llm.complete(&CATEGORIZE.render(&fields), 0.5).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Categorization call failed, using keyword rules: {}", e);
                return fallback_categorization(papers);
            }
        };

        match parser::decode_object(&response) {
            Ok(assignment) => apply_assignment(papers, assignment.into_iter()),
            Err(e) => {
                log::warn!("Could not parse categorization, using keyword rules: {}", e);
                fallback_categorization(papers)
            }
        }
    }

    pub async fn generate_literature_summary(&self, papers: &[Paper]) -> Result<String> {
        log_activity(
            self.name(),
            "generate_literature_summary",
            json!({ "paper_count": papers.len() }),
        );

        let listing = papers
            .iter()
            .map(|p| format!("Title: {}\nAbstract: {}\nYear: {}", p.title, p.abstract_text, p.year))
            .collect::<Vec<_>>()
            .join("\n\n");

        let text = self
            .llm
            .complete(&SUMMARIZE.render(&PromptFields::new().with("papers", listing)), 0.7)
            .await?;
        Ok(parser::plain_text(&text))
    }

    /// Search, categorize and summarize in one pass.
    pub async fn review(&self, topic: &str, max_results: usize) -> Result<LiteratureReview> {
        let papers = self.search_papers(topic, max_results).await?;
        let categorized_papers = self.categorize_papers(&papers).await;
        let summary = self.generate_literature_summary(&papers).await?;

        Ok(LiteratureReview {
            papers,
            categorized_papers,
            summary,
            topic: topic.to_string(),
            search_date: Utc::now(),
        })
    }
}

impl ResearchAgent for LiteratureAgent {
    fn key(&self) -> &'static str {
        "literature"
    }

    fn name(&self) -> &'static str {
        "LiteratureAgent"
    }

    fn description(&self) -> &'static str {
        "Literature Review Assistant - Searches and categorizes academic papers"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "Search academic papers by topic",
            "Categorize papers by methodology",
            "Extract key information from papers",
            "Generate literature summaries",
        ]
    }
}

fn empty_categories() -> CategorizedPapers {
    CATEGORIES
        .iter()
        .map(|c| (c.to_string(), Vec::new()))
        .collect()
}

fn apply_assignment(
    papers: &[Paper],
    assignment: impl Iterator<Item = (String, Value)>,
) -> CategorizedPapers {
    let mut categorized = empty_categories();

    for (category, indices) in assignment {
        let Some(bucket) = categorized.get_mut(category.as_str()) else {
            continue;
        };
        let Value::Array(indices) = indices else {
            continue;
        };
        for index in indices.iter().filter_map(Value::as_u64) {
            if let Some(paper) = usize::try_from(index).ok().and_then(|i| papers.get(i)) {
                bucket.push(paper.clone());
            }
        }
    }

    categorized
}

fn fallback_category(paper: &Paper) -> &'static str {
    let text = paper.searchable_text();
    FALLBACK_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(FALLBACK_CATEGORY)
}

/// Keyword-only categorization. Every paper lands in exactly one category.
pub fn fallback_categorization(papers: &[Paper]) -> CategorizedPapers {
    let mut categorized = empty_categories();
    for paper in papers {
        if let Some(bucket) = categorized.get_mut(fallback_category(paper)) {
            bucket.push(paper.clone());
        }
    }
    categorized
}
