pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAIGateway;
pub use provider::{GatewayError, LLMGateway, Result};
pub use types::{Message, Role};
