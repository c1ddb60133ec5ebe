use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const AI_AUTHOR: &str = "ai_assistant";
pub const DEFAULT_SECTION: &str = "general";
pub const DEFAULT_ROLE: &str = "collaborator";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: String,
    pub paper_id: String,
    pub user_id: String,
    pub comment: String,
    pub section: String,
    pub line_number: Option<u32>,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    #[serde(default)]
    pub is_ai: bool,
    /// Comment this one answers; set on assistant replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub paper_id: String,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collaborator {
    pub user_id: String,
    pub role: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaperVersion {
    pub id: String,
    pub paper_id: String,
    pub content: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    /// 1-based; assigned by the store on append.
    pub version_number: u32,
}
