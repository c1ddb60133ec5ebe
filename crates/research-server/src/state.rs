use std::sync::Arc;

use research_agents::{
    prompt, CitationAgent, CollaborationAgent, CollaborationStore, CrossrefClient,
    DataExtractionAgent, InMemoryStore, LiteratureAgent, MetadataLookup, PaperSearch,
    ProposalAgent, ResearchAgent, SemanticScholarClient, TemplateError,
};
use research_llm::{LLMGateway, OpenAIGateway};

use crate::config::ServerConfig;

/// The five capability modules, shared by every worker.
pub struct AppState {
    pub citation: CitationAgent,
    pub literature: LiteratureAgent,
    pub collaboration: CollaborationAgent,
    pub data_extraction: DataExtractionAgent,
    pub proposal: ProposalAgent,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self, TemplateError> {
        log::info!(
            "Creating LLM gateway with base URL: {} and model: {}",
            config.llm.base_url,
            config.llm.model
        );
        let mut gateway = OpenAIGateway::new(config.llm.api_key.clone())
            .with_base_url(config.llm.base_url.clone())
            .with_model(config.llm.model.clone());
        if let Some(timeout) = config.llm.timeout {
            gateway = gateway.with_timeout(timeout);
        }

        Self::new_with(
            Arc::new(gateway),
            Arc::new(CrossrefClient::new().with_base_url(config.crossref_base_url.clone())),
            Arc::new(SemanticScholarClient::new().with_base_url(config.search_base_url.clone())),
            Arc::new(InMemoryStore::new()),
        )
    }

    /// Build from explicit collaborators. Fails if any prompt template is
    /// inconsistent with its declared fields.
    pub fn new_with(
        llm: Arc<dyn LLMGateway>,
        metadata: Arc<dyn MetadataLookup>,
        search: Arc<dyn PaperSearch>,
        store: Arc<dyn CollaborationStore>,
    ) -> Result<Self, TemplateError> {
        let templates = prompt::validate_all()?;
        log::debug!("Validated {} prompt templates", templates);

        Ok(Self {
            citation: CitationAgent::new(llm.clone(), metadata),
            literature: LiteratureAgent::new(llm.clone(), search),
            collaboration: CollaborationAgent::new(llm.clone(), store),
            data_extraction: DataExtractionAgent::new(llm.clone()),
            proposal: ProposalAgent::new(llm),
        })
    }

    pub fn agents(&self) -> [&dyn ResearchAgent; 5] {
        [
            &self.citation,
            &self.literature,
            &self.collaboration,
            &self.data_extraction,
            &self.proposal,
        ]
    }
}
