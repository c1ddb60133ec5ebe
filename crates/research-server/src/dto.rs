//! Request bodies accepted by the HTTP API.

use indexmap::IndexMap;
use research_agents::{TaskPriority, TaskStatus};
use serde::Deserialize;
use serde_json::{Map, Value};

fn default_style() -> String {
    "apa".to_string()
}

fn default_max_results() -> usize {
    10
}

fn default_extraction_type() -> String {
    "tables".to_string()
}

fn default_chart_type() -> String {
    "bar".to_string()
}

#[derive(Debug, Deserialize)]
pub struct CitationRequest {
    pub paper_url: String,
    #[serde(default = "default_style")]
    pub citation_style: String,
}

#[derive(Debug, Deserialize)]
pub struct LiteratureRequest {
    pub topic: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub papers: Vec<research_agents::Paper>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub paper_id: String,
    pub comment: String,
    pub user_id: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub line_number: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TaskRequest {
    pub paper_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub priority: TaskPriority,
}

#[derive(Debug, Deserialize)]
pub struct TaskStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct CollaboratorRequest {
    pub paper_id: String,
    pub user_id: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VersionRequest {
    pub paper_id: String,
    pub content: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ExtractionRequest {
    pub file_content: String,
    #[serde(default = "default_extraction_type")]
    pub extraction_type: String,
}

#[derive(Debug, Deserialize)]
pub struct VisualizationRequest {
    pub data: Value,
    #[serde(default = "default_chart_type")]
    pub chart_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ImproveRequest {
    pub proposal_text: String,
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct SectionRequest {
    pub section: String,
    #[serde(default)]
    pub context: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub proposal: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct FundingRequest {
    pub proposal: Map<String, Value>,
    #[serde(default)]
    pub funding_amount: Option<String>,
}
