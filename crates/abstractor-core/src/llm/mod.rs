//! Chat-completion clients.

pub mod mock;
pub mod openai;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

pub use mock::MockClient;
pub use openai::OpenAiClient;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate limited (429)")]
    RateLimited,
    #[error("API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    Decode(String),
    #[error("completion response contained no choices")]
    NoChoices,
    #[error("{0}")]
    Other(String),
}

/// Boxed future returned by [`CompletionClient::complete`].
pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;

/// A model endpoint that turns a developer instruction and a user prompt into
/// a single text completion.
pub trait CompletionClient: Send + Sync {
    /// Human-readable name used in diagnostics (e.g. the model identifier).
    fn name(&self) -> &str;

    /// Send one two-message exchange and return the first choice's text.
    fn complete<'a>(&'a self, system: &'a str, prompt: &'a str) -> CompletionFuture<'a>;
}
