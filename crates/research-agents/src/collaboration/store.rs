use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use super::records::{Collaborator, Comment, PaperVersion, Task, TaskStatus};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Collaboration store unavailable: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Per-paper collaboration records. Sequences are returned in insertion
/// order (replies sit right after the comment they answer).
#[async_trait]
pub trait CollaborationStore: Send + Sync {
    async fn comments(&self, paper_id: &str) -> StoreResult<Vec<Comment>>;

    async fn append_comment(&self, comment: Comment) -> StoreResult<()>;

    /// Place `reply` directly after the comment named by `reply.reply_to`
    /// and any replies it already has. Appends when the parent is unknown.
    async fn insert_reply(&self, reply: Comment) -> StoreResult<()>;

    async fn tasks(&self, paper_id: &str) -> StoreResult<Vec<Task>>;

    async fn append_task(&self, task: Task) -> StoreResult<()>;

    /// Returns false when no task has `task_id`.
    async fn update_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    async fn collaborators(&self, paper_id: &str) -> StoreResult<Vec<Collaborator>>;

    /// Returns false, and stores nothing, when the user is already listed.
    async fn add_collaborator(&self, paper_id: &str, collaborator: Collaborator)
        -> StoreResult<bool>;

    async fn versions(&self, paper_id: &str) -> StoreResult<Vec<PaperVersion>>;

    /// Stores `version` with the next version number for its paper.
    async fn append_version(&self, version: PaperVersion) -> StoreResult<PaperVersion>;
}

#[derive(Debug, Default)]
struct PaperRecords {
    comments: Vec<Comment>,
    tasks: Vec<Task>,
    collaborators: Vec<Collaborator>,
    versions: Vec<PaperVersion>,
}

/// Process-lifetime store. Nothing is evicted.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    papers: RwLock<HashMap<String, PaperRecords>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn read<T>(&self, paper_id: &str, f: impl FnOnce(&PaperRecords) -> T) -> Option<T> {
        self.papers.read().await.get(paper_id).map(f)
    }
}

#[async_trait]
impl CollaborationStore for InMemoryStore {
    async fn comments(&self, paper_id: &str) -> StoreResult<Vec<Comment>> {
        Ok(self
            .read(paper_id, |r| r.comments.clone())
            .await
            .unwrap_or_default())
    }

    async fn append_comment(&self, comment: Comment) -> StoreResult<()> {
        let mut papers = self.papers.write().await;
        papers
            .entry(comment.paper_id.clone())
            .or_default()
            .comments
            .push(comment);
        Ok(())
    }

    async fn insert_reply(&self, reply: Comment) -> StoreResult<()> {
        let mut papers = self.papers.write().await;
        let comments = &mut papers.entry(reply.paper_id.clone()).or_default().comments;

        let position = reply.reply_to.as_deref().and_then(|parent| {
            let start = comments.iter().position(|c| c.id == parent)? + 1;
            let replies = comments[start..]
                .iter()
                .take_while(|c| c.reply_to.as_deref() == Some(parent))
                .count();
            Some(start + replies)
        });

        match position {
            Some(index) => comments.insert(index, reply),
            None => comments.push(reply),
        }
        Ok(())
    }

    async fn tasks(&self, paper_id: &str) -> StoreResult<Vec<Task>> {
        Ok(self
            .read(paper_id, |r| r.tasks.clone())
            .await
            .unwrap_or_default())
    }

    async fn append_task(&self, task: Task) -> StoreResult<()> {
        let mut papers = self.papers.write().await;
        papers
            .entry(task.paper_id.clone())
            .or_default()
            .tasks
            .push(task);
        Ok(())
    }

    async fn update_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut papers = self.papers.write().await;
        let task = papers
            .values_mut()
            .flat_map(|r| r.tasks.iter_mut())
            .find(|t| t.id == task_id);

        Ok(match task {
            Some(task) => {
                task.status = status;
                task.updated_at = at;
                true
            }
            None => false,
        })
    }

    async fn collaborators(&self, paper_id: &str) -> StoreResult<Vec<Collaborator>> {
        Ok(self
            .read(paper_id, |r| r.collaborators.clone())
            .await
            .unwrap_or_default())
    }

    async fn add_collaborator(
        &self,
        paper_id: &str,
        collaborator: Collaborator,
    ) -> StoreResult<bool> {
        let mut papers = self.papers.write().await;
        let collaborators = &mut papers.entry(paper_id.to_string()).or_default().collaborators;

        if collaborators
            .iter()
            .any(|c| c.user_id == collaborator.user_id)
        {
            return Ok(false);
        }
        collaborators.push(collaborator);
        Ok(true)
    }

    async fn versions(&self, paper_id: &str) -> StoreResult<Vec<PaperVersion>> {
        Ok(self
            .read(paper_id, |r| r.versions.clone())
            .await
            .unwrap_or_default())
    }

    async fn append_version(&self, mut version: PaperVersion) -> StoreResult<PaperVersion> {
        let mut papers = self.papers.write().await;
        let versions = &mut papers.entry(version.paper_id.clone()).or_default().versions;

        version.version_number = u32::try_from(versions.len()).unwrap_or(u32::MAX).saturating_add(1);
        versions.push(version.clone());
        Ok(version)
    }
}
