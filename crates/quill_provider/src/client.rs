use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use quill_domain::{ChatModel, Prompt};
use quill_env::{ModelConfig, ProviderKind, RetryConfig};
use tracing::info;

use crate::retry::{into_retry, retry_with_config};
use crate::{Anthropic, OpenAiCompat};

#[derive(Clone)]
enum InnerClient {
    Anthropic(Anthropic),
    OpenAi(OpenAiCompat),
}

/// The configured chat model, retrying transient failures per
/// [`RetryConfig`].
#[derive(Clone)]
pub struct Client {
    inner: InnerClient,
    retry_config: RetryConfig,
}

impl Client {
    /// Builds a client for the configured provider, reading its API key from
    /// the process environment.
    pub fn from_config(config: &ModelConfig, retry_config: RetryConfig) -> anyhow::Result<Self> {
        let env_var = config.provider.api_key_var();
        let api_key = std::env::var(env_var).map_err(|_| quill_domain::Error::MissingApiKey {
            provider: config.provider.to_string(),
            env_var,
        })?;
        Self::new(config, retry_config, api_key)
    }

    pub fn new(
        config: &ModelConfig,
        retry_config: RetryConfig,
        api_key: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        let base_url = config.base_url()?;
        info!(provider = %config.provider, model = %config.model, url = %base_url, "Using model provider");

        let inner = match config.provider {
            ProviderKind::Anthropic => InnerClient::Anthropic(Anthropic::new(
                http,
                base_url,
                api_key,
                config.model.clone(),
                config.max_tokens,
            )),
            ProviderKind::OpenAi => InnerClient::OpenAi(OpenAiCompat::new(
                http,
                base_url,
                api_key,
                config.model.clone(),
                config.max_tokens,
            )),
        };
        Ok(Self { inner, retry_config })
    }

    async fn invoke_once(&self, prompt: Prompt) -> anyhow::Result<String> {
        let result = match &self.inner {
            InnerClient::Anthropic(client) => client.invoke(prompt).await,
            InnerClient::OpenAi(client) => client.invoke(prompt).await,
        };
        result.map_err(|error| into_retry(error, &self.retry_config))
    }
}

#[async_trait]
impl ChatModel for Client {
    async fn invoke(&self, prompt: Prompt) -> anyhow::Result<String> {
        retry_with_config(&self.retry_config, || self.invoke_once(prompt.clone())).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use url::Url;

    use super::*;

    fn config(server: &mockito::ServerGuard, provider: ProviderKind) -> ModelConfig {
        ModelConfig {
            provider,
            model: "test-model".to_string(),
            max_tokens: 128,
            timeout_secs: 5,
            url: Some(Url::parse(&server.url()).unwrap()),
        }
    }

    fn retry() -> RetryConfig {
        RetryConfig::default().min_delay_ms(1u64).max_retry_attempts(2usize)
    }

    #[tokio::test]
    async fn test_dispatches_to_openai_compatible_endpoint() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"GOAL: g"}}]}"#)
            .create_async()
            .await;
        let fixture = Client::new(&config(&server, ProviderKind::OpenAi), retry(), "k").unwrap();

        let actual = fixture.invoke(Prompt::new("plan")).await.unwrap();

        assert_eq!(actual, "GOAL: g");
    }

    #[tokio::test]
    async fn test_retryable_status_is_retried_until_exhausted() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;
        let fixture = Client::new(&config(&server, ProviderKind::Anthropic), retry(), "k").unwrap();

        let actual = fixture.invoke(Prompt::new("plan")).await;

        assert!(actual.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .with_status(400)
            .expect(1)
            .create_async()
            .await;
        let fixture = Client::new(&config(&server, ProviderKind::Anthropic), retry(), "k").unwrap();

        let actual = fixture.invoke(Prompt::new("plan")).await;

        assert!(actual.is_err());
        mock.assert_async().await;
    }
}
