// Service exports
pub mod ollama;
pub mod openai;
pub mod provider;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::{ClassificationProvider, ProviderClassification, ProviderError};
