pub mod error;
pub mod jina;
pub mod openrouter;
pub mod perplexity;
pub mod types;

pub use error::{AiClientError, Result};
pub use jina::JinaClient;
pub use openrouter::OpenRouterClient;
pub use perplexity::PerplexityClient;
pub use types::{Annotation, ChatMessage, ChatRequest, ChatResponse, Citation, WebSearchResult};
