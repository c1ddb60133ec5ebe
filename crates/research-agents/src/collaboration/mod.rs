mod records;
mod store;

use std::sync::Arc;

use chrono::Utc;
use research_llm::LLMGateway;
use serde_json::json;
use uuid::Uuid;

use crate::agent::{log_activity, ResearchAgent};
use crate::error::{require_non_empty, Result};
use crate::parser;
use crate::prompt::{PromptFields, PromptTemplate};

pub use records::{
    Collaborator, Comment, PaperVersion, Task, TaskPriority, TaskStatus, AI_AUTHOR, DEFAULT_ROLE,
    DEFAULT_SECTION,
};
pub use store::{CollaborationStore, InMemoryStore, StoreError, StoreResult};

const AI_REPLY: PromptTemplate = PromptTemplate {
    id: "collaboration.ai_reply",
    system: "You are an AI research assistant helping with paper collaboration. Provide constructive, helpful feedback.",
    body: r#"
A researcher has made the following comment on the {section} section of their paper:

"{comment}"

Provide a helpful, constructive response that:
1. Acknowledges the comment
2. Offers specific suggestions for improvement
3. Maintains a collaborative and supportive tone
4. Is concise but thorough

Respond as an AI research assistant.
"#,
    fields: &["section", "comment"],
};

const SUMMARY: PromptTemplate = PromptTemplate {
    id: "collaboration.summary",
    system: "You are a project management assistant. Generate concise collaboration summaries.",
    body: r#"
Generate a collaboration summary for a research paper with the following activity:

Comments: {comment_count} total comments
Tasks: {task_count} tasks (pending: {pending_count}, completed: {completed_count})
Versions: {version_count} versions created
Collaborators: {collaborator_count} team members

Recent activity:
- Latest comment: {latest_comment}
- Latest task: {latest_task}
- Latest version: Version {latest_version}

Provide a brief summary of the collaboration progress and suggest next steps.
"#,
    fields: &[
        "comment_count",
        "task_count",
        "pending_count",
        "completed_count",
        "version_count",
        "collaborator_count",
        "latest_comment",
        "latest_task",
        "latest_version",
    ],
};

pub(crate) const TEMPLATES: &[&PromptTemplate] = &[&AI_REPLY, &SUMMARY];

const COMMENT_PREVIEW_CHARS: usize = 100;

pub struct CollaborationAgent {
    llm: Arc<dyn LLMGateway>,
    store: Arc<dyn CollaborationStore>,
}

impl CollaborationAgent {
    pub fn new(llm: Arc<dyn LLMGateway>, store: Arc<dyn CollaborationStore>) -> Self {
        Self { llm, store }
    }

    /// Store a human comment and, when the model answers, an assistant reply
    /// right after it. Returns the human comment's id either way.
    pub async fn add_comment(
        &self,
        paper_id: &str,
        comment: &str,
        user_id: &str,
        section: Option<&str>,
        line_number: Option<u32>,
    ) -> Result<String> {
        require_non_empty(&[
            ("paper_id", paper_id),
            ("comment", comment),
            ("user_id", user_id),
        ])?;
        let section = section
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_SECTION);
        log_activity(
            self.name(),
            "add_comment",
            json!({ "paper_id": paper_id, "user_id": user_id, "section": section }),
        );

        let human = Comment {
            id: Uuid::new_v4().to_string(),
            paper_id: paper_id.to_string(),
            user_id: user_id.to_string(),
            comment: comment.to_string(),
            section: section.to_string(),
            line_number,
            timestamp: Utc::now(),
            status: "active".to_string(),
            is_ai: false,
            reply_to: None,
        };
        let comment_id = human.id.clone();
        self.store.append_comment(human).await?;

        if let Some(reply) = self.ai_reply(comment, section).await {
            let stored = self
                .store
                .insert_reply(Comment {
                    id: Uuid::new_v4().to_string(),
                    paper_id: paper_id.to_string(),
                    user_id: AI_AUTHOR.to_string(),
                    comment: reply,
                    section: section.to_string(),
                    line_number,
                    timestamp: Utc::now(),
                    status: "active".to_string(),
                    is_ai: true,
                    reply_to: Some(comment_id.clone()),
                })
                .await;
            if let Err(e) = stored {
                log::warn!("Could not store AI reply to comment {}: {}", comment_id, e);
            }
        }

        Ok(comment_id)
    }

    async fn ai_reply(&self, comment: &str, section: &str) -> Option<String> {
        let fields = PromptFields::new()
            .with("section", section)
            .with("comment", comment);

        match self.llm.complete(&AI_REPLY.render(&fields), 0.7).await {
            Ok(text) => {
                let reply = parser::plain_text(&text);
                (!reply.is_empty()).then_some(reply)
            }
            Err(e) => {
                log::warn!("Skipping AI reply to comment: {}", e);
                None
            }
        }
    }

    pub async fn get_comments(&self, paper_id: &str) -> Result<Vec<Comment>> {
        Ok(self.store.comments(paper_id).await?)
    }

    pub async fn create_task(
        &self,
        paper_id: &str,
        title: &str,
        description: &str,
        assigned_to: &str,
        priority: TaskPriority,
    ) -> Result<String> {
        require_non_empty(&[("paper_id", paper_id), ("title", title)])?;
        log_activity(
            self.name(),
            "create_task",
            json!({ "paper_id": paper_id, "assigned_to": assigned_to, "priority": priority }),
        );

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            paper_id: paper_id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            assigned_to: assigned_to.to_string(),
            priority,
            status: TaskStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let task_id = task.id.clone();
        self.store.append_task(task).await?;
        Ok(task_id)
    }

    /// False when no task has `task_id`.
    pub async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<bool> {
        log_activity(
            self.name(),
            "update_task_status",
            json!({ "task_id": task_id, "status": status }),
        );
        Ok(self
            .store
            .update_task_status(task_id, status, Utc::now())
            .await?)
    }

    pub async fn get_tasks(&self, paper_id: &str) -> Result<Vec<Task>> {
        Ok(self.store.tasks(paper_id).await?)
    }

    /// False when the user already collaborates on the paper.
    pub async fn add_collaborator(
        &self,
        paper_id: &str,
        user_id: &str,
        role: Option<&str>,
    ) -> Result<bool> {
        require_non_empty(&[("paper_id", paper_id), ("user_id", user_id)])?;
        let role = role.filter(|r| !r.trim().is_empty()).unwrap_or(DEFAULT_ROLE);
        log_activity(
            self.name(),
            "add_collaborator",
            json!({ "paper_id": paper_id, "user_id": user_id, "role": role }),
        );

        let collaborator = Collaborator {
            user_id: user_id.to_string(),
            role: role.to_string(),
            added_at: Utc::now(),
        };
        Ok(self.store.add_collaborator(paper_id, collaborator).await?)
    }

    pub async fn get_collaborators(&self, paper_id: &str) -> Result<Vec<Collaborator>> {
        Ok(self.store.collaborators(paper_id).await?)
    }

    pub async fn create_paper_version(
        &self,
        paper_id: &str,
        content: &str,
        user_id: &str,
    ) -> Result<PaperVersion> {
        require_non_empty(&[("paper_id", paper_id), ("user_id", user_id)])?;
        log_activity(
            self.name(),
            "create_paper_version",
            json!({ "paper_id": paper_id, "user_id": user_id }),
        );

        let version = PaperVersion {
            id: Uuid::new_v4().to_string(),
            paper_id: paper_id.to_string(),
            content: content.to_string(),
            created_by: user_id.to_string(),
            created_at: Utc::now(),
            version_number: 0,
        };
        Ok(self.store.append_version(version).await?)
    }

    pub async fn get_paper_versions(&self, paper_id: &str) -> Result<Vec<PaperVersion>> {
        Ok(self.store.versions(paper_id).await?)
    }

    pub async fn get_latest_version(&self, paper_id: &str) -> Result<Option<PaperVersion>> {
        Ok(self
            .store
            .versions(paper_id)
            .await?
            .into_iter()
            .max_by_key(|v| v.version_number))
    }

    pub async fn generate_collaboration_summary(&self, paper_id: &str) -> Result<String> {
        require_non_empty(&[("paper_id", paper_id)])?;
        log_activity(
            self.name(),
            "generate_collaboration_summary",
            json!({ "paper_id": paper_id }),
        );

        let comments = self.store.comments(paper_id).await?;
        let tasks = self.store.tasks(paper_id).await?;
        let versions = self.store.versions(paper_id).await?;
        let collaborators = self.store.collaborators(paper_id).await?;

        let count_status = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        let latest_comment = comments
            .last()
            .map(|c| {
                let preview: String = c.comment.chars().take(COMMENT_PREVIEW_CHARS).collect();
                format!("{}...", preview)
            })
            .unwrap_or_else(|| "None".to_string());

        let fields = PromptFields::new()
            .with("comment_count", comments.len())
            .with("task_count", tasks.len())
            .with("pending_count", count_status(TaskStatus::Pending))
            .with("completed_count", count_status(TaskStatus::Completed))
            .with("version_count", versions.len())
            .with("collaborator_count", collaborators.len())
            .with("latest_comment", latest_comment)
            .with(
                "latest_task",
                tasks.last().map_or("None", |t| t.title.as_str()),
            )
            .with(
                "latest_version",
                versions
                    .last()
                    .map_or_else(|| "None".to_string(), |v| v.version_number.to_string()),
            );

        let text = self.llm.complete(&SUMMARY.render(&fields), 0.5).await?;
        Ok(parser::plain_text(&text))
    }
}

impl ResearchAgent for CollaborationAgent {
    fn key(&self) -> &'static str {
        "collaboration"
    }

    fn name(&self) -> &'static str {
        "CollaborationAgent"
    }

    fn description(&self) -> &'static str {
        "Research Paper Collaboration Assistant - Enables real-time collaboration on papers"
    }

    fn capabilities(&self) -> &'static [&'static str] {
        &[
            "Add comments to papers",
            "Assign tasks to collaborators",
            "Track collaboration history",
            "Real-time paper editing",
            "Version control for papers",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGateway;

    fn agent(llm: ScriptedGateway) -> (CollaborationAgent, Arc<ScriptedGateway>) {
        let llm = Arc::new(llm);
        let agent = CollaborationAgent::new(llm.clone(), Arc::new(InMemoryStore::new()));
        (agent, llm)
    }

    #[tokio::test]
    async fn comment_gets_ai_reply_right_after_it() {
        let (agent, llm) = agent(
            ScriptedGateway::new()
                .reply("  Good point, consider adding a baseline.  ")
                .reply("Agreed."),
        );

        let first = agent
            .add_comment("paper-1", "Needs a baseline", "alice", Some("methods"), Some(12))
            .await
            .unwrap();
        let second = agent
            .add_comment("paper-1", "Typo in abstract", "bob", None, None)
            .await
            .unwrap();

        let comments = agent.get_comments("paper-1").await.unwrap();
        assert_eq!(comments.len(), 4);
        assert_eq!(comments[0].id, first);
        assert!(!comments[0].is_ai);
        assert_eq!(comments[1].user_id, AI_AUTHOR);
        assert!(comments[1].is_ai);
        assert_eq!(comments[1].comment, "Good point, consider adding a baseline.");
        assert_eq!(comments[1].reply_to.as_deref(), Some(first.as_str()));
        assert_eq!(comments[1].section, "methods");
        assert_eq!(comments[1].line_number, Some(12));
        assert_eq!(comments[2].id, second);
        assert_eq!(comments[2].section, "general");
        assert_eq!(comments[3].reply_to.as_deref(), Some(second.as_str()));

        let calls = llm.calls();
        assert_eq!(calls[0].temperature, 0.7);
        assert!(calls[0].user().contains("on the methods section"));
        assert!(calls[0].user().contains("\"Needs a baseline\""));
    }

    #[tokio::test]
    async fn failed_reply_still_stores_the_comment() {
        let (agent, _) = agent(ScriptedGateway::new().fail("model offline"));

        let id = agent
            .add_comment("paper-1", "Looks good", "alice", None, None)
            .await
            .unwrap();

        let comments = agent.get_comments("paper-1").await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, id);
    }

    /// Delegates to `InMemoryStore` but refuses every reply.
    struct ReplylessStore(InMemoryStore);

    #[async_trait::async_trait]
    impl CollaborationStore for ReplylessStore {
        async fn comments(&self, paper_id: &str) -> StoreResult<Vec<Comment>> {
            self.0.comments(paper_id).await
        }

        async fn append_comment(&self, comment: Comment) -> StoreResult<()> {
            self.0.append_comment(comment).await
        }

        async fn insert_reply(&self, _reply: Comment) -> StoreResult<()> {
            Err(StoreError::Backend("replies disabled".to_string()))
        }

        async fn tasks(&self, paper_id: &str) -> StoreResult<Vec<Task>> {
            self.0.tasks(paper_id).await
        }

        async fn append_task(&self, task: Task) -> StoreResult<()> {
            self.0.append_task(task).await
        }

        async fn update_task_status(
            &self,
            task_id: &str,
            status: TaskStatus,
            at: chrono::DateTime<Utc>,
        ) -> StoreResult<bool> {
            self.0.update_task_status(task_id, status, at).await
        }

        async fn collaborators(&self, paper_id: &str) -> StoreResult<Vec<Collaborator>> {
            self.0.collaborators(paper_id).await
        }

        async fn add_collaborator(
            &self,
            paper_id: &str,
            collaborator: Collaborator,
        ) -> StoreResult<bool> {
            self.0.add_collaborator(paper_id, collaborator).await
        }

        async fn versions(&self, paper_id: &str) -> StoreResult<Vec<PaperVersion>> {
            self.0.versions(paper_id).await
        }

        async fn append_version(&self, version: PaperVersion) -> StoreResult<PaperVersion> {
            self.0.append_version(version).await
        }
    }

    #[tokio::test]
    async fn unstored_reply_still_reports_the_comment() {
        let llm = Arc::new(ScriptedGateway::new().reply("Nice catch."));
        let store = Arc::new(ReplylessStore(InMemoryStore::new()));
        let agent = CollaborationAgent::new(llm.clone(), store);

        let id = agent
            .add_comment("paper-1", "Figure 2 is mislabeled", "alice", None, None)
            .await
            .unwrap();

        let comments = agent.get_comments("paper-1").await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, id);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn blank_comment_is_rejected() {
        let (agent, llm) = agent(ScriptedGateway::new());

        let err = agent
            .add_comment("paper-1", " ", "alice", None, None)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(llm.call_count(), 0);
        assert!(agent.get_comments("paper-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn task_status_updates_in_place() {
        let (agent, _) = agent(ScriptedGateway::new());

        let id = agent
            .create_task("paper-1", "Write intro", "First draft", "bob", TaskPriority::High)
            .await
            .unwrap();
        assert!(agent
            .update_task_status(&id, TaskStatus::InProgress)
            .await
            .unwrap());
        assert!(!agent
            .update_task_status("missing", TaskStatus::Completed)
            .await
            .unwrap());

        let tasks = agent.get_tasks("paper-1").await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::InProgress);
        assert_eq!(tasks[0].priority, TaskPriority::High);
        assert!(tasks[0].updated_at >= tasks[0].created_at);
    }

    #[tokio::test]
    async fn adding_a_collaborator_twice_is_a_no_op() {
        let (agent, _) = agent(ScriptedGateway::new());

        assert!(agent.add_collaborator("paper-1", "carol", None).await.unwrap());
        assert!(!agent
            .add_collaborator("paper-1", "carol", Some("editor"))
            .await
            .unwrap());

        let collaborators = agent.get_collaborators("paper-1").await.unwrap();
        assert_eq!(collaborators.len(), 1);
        assert_eq!(collaborators[0].role, "collaborator");
    }

    #[tokio::test]
    async fn versions_are_numbered_and_latest_is_highest() {
        let (agent, _) = agent(ScriptedGateway::new());

        assert!(agent.get_latest_version("paper-1").await.unwrap().is_none());
        for content in ["v1", "v2", "v3"] {
            agent
                .create_paper_version("paper-1", content, "alice")
                .await
                .unwrap();
        }

        let versions = agent.get_paper_versions("paper-1").await.unwrap();
        assert_eq!(
            versions.iter().map(|v| v.version_number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        let latest = agent.get_latest_version("paper-1").await.unwrap().unwrap();
        assert_eq!(latest.content, "v3");
    }

    #[tokio::test]
    async fn summary_reports_activity_counts() {
        let (agent, llm) = agent(
            ScriptedGateway::new()
                .fail("no reply")
                .reply("Steady progress."),
        );
        agent
            .add_comment("paper-1", "Check figure 2", "alice", None, None)
            .await
            .unwrap();
        agent
            .create_task("paper-1", "Redo figure 2", "", "bob", TaskPriority::default())
            .await
            .unwrap();
        agent.create_paper_version("paper-1", "draft", "alice").await.unwrap();

        let summary = agent.generate_collaboration_summary("paper-1").await.unwrap();
        assert_eq!(summary, "Steady progress.");

        let call = &llm.calls()[1];
        assert_eq!(call.temperature, 0.5);
        let prompt = call.user();
        assert!(prompt.contains("Comments: 1 total comments"));
        assert!(prompt.contains("Tasks: 1 tasks (pending: 1, completed: 0)"));
        assert!(prompt.contains("Latest comment: Check figure 2..."));
        assert!(prompt.contains("Latest task: Redo figure 2"));
        assert!(prompt.contains("Latest version: Version 1"));
    }

    #[tokio::test]
    async fn summary_surfaces_gateway_failure() {
        let (agent, _) = agent(ScriptedGateway::new().fail("down"));
        assert!(agent.generate_collaboration_summary("paper-1").await.is_err());
    }
}
