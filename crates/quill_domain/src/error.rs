#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A transient failure the model-invocation layer may retry.
    #[error("{0}")]
    Retryable(anyhow::Error),

    #[error("No API key found for the {provider} provider. Please set {env_var}")]
    MissingApiKey {
        provider: String,
        env_var: &'static str,
    },
}

impl Error {
    /// Returns true when the error, possibly wrapped inside an
    /// `anyhow::Error`, is marked retryable.
    pub fn is_retryable(error: &anyhow::Error) -> bool {
        error
            .downcast_ref::<Error>()
            .is_some_and(|error| matches!(error, Error::Retryable(_)))
    }
}
