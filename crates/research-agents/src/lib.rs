pub mod agent;
pub mod citation;
pub mod collaboration;
pub mod collaborators;
pub mod error;
pub mod extraction;
pub mod literature;
pub mod parser;
pub mod prompt;
pub mod proposal;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use agent::{AgentInfo, ResearchAgent};
pub use citation::{CitationAgent, CITATION_STYLES};
pub use collaboration::{
    CollaborationAgent, CollaborationStore, Collaborator, Comment, InMemoryStore, PaperVersion,
    StoreError, Task, TaskPriority, TaskStatus,
};
pub use collaborators::{
    CollaboratorError, CrossrefClient, MetadataLookup, PaperSearch, SemanticScholarClient,
    WorkMetadata,
};
pub use error::{AgentError, Result};
pub use extraction::{Analysis, DataExtractionAgent, ExtractionKind, ExtractionResult};
pub use literature::{CategorizedPapers, LiteratureAgent, LiteratureReview, Paper};
pub use parser::ParseError;
pub use prompt::{PromptFields, PromptTemplate, TemplateError};
pub use proposal::{
    GeneratedProposal, ImprovedProposal, ProposalAgent, ProposalRequest, ProposalReview,
    ProposalValidation, ValidationOutcome,
};
