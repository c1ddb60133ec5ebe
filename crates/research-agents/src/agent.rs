use serde::Serialize;
use serde_json::Value;

/// Self-description reported by every capability module.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
}

pub trait ResearchAgent: Send + Sync {
    /// Short key used in health output (`citation`, `literature`, ...).
    fn key(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn capabilities(&self) -> &'static [&'static str];

    fn info(&self) -> AgentInfo {
        AgentInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
            capabilities: self.capabilities().iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// One activity line per capability operation.
pub(crate) fn log_activity(agent: &str, activity: &str, data: Value) {
    log::info!("[{}] {} {}", agent, activity, data);
}
