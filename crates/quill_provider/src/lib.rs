mod anthropic;
mod client;
mod error;
mod openai;
mod retry;

pub use anthropic::Anthropic;
pub use client::Client;
pub use error::Error;
pub use openai::OpenAiCompat;
pub use retry::{into_retry, retry_with_config};
