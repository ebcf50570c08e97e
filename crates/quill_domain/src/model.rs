use derive_setters::Setters;
use serde::{Deserialize, Serialize};

/// A single-turn request to a generative model.
#[derive(Debug, Clone, PartialEq, Setters, Serialize, Deserialize)]
#[setters(strip_option, into)]
pub struct Prompt {
    pub content: String,
    /// Sampling temperature; `None` leaves the provider default in place.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Prompt {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), temperature: None }
    }
}

/// The model boundary used by every pipeline stage: text in, text out.
///
/// Implementations own transport, authentication and retry policy. Errors
/// returned from here propagate to the caller of the pipeline unchanged.
#[async_trait::async_trait]
pub trait ChatModel: Send + Sync {
    async fn invoke(&self, prompt: Prompt) -> anyhow::Result<String>;
}

#[async_trait::async_trait]
impl<T: ChatModel + ?Sized> ChatModel for std::sync::Arc<T> {
    async fn invoke(&self, prompt: Prompt) -> anyhow::Result<String> {
        self.as_ref().invoke(prompt).await
    }
}
