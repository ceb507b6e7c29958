//! Scripted completion client for tests.

use std::sync::Mutex;

use super::{CompletionClient, CompletionFuture, LlmError};

/// A canned reply for [`MockClient`].
#[derive(Clone, Debug)]
pub enum MockReply {
    Text(String),
    /// Simulate a transport or API failure with this message.
    Fail(String),
}

/// A hand-rolled [`CompletionClient`] that replays scripted replies.
///
/// Replies are consumed in order; once the script runs out the fallback is
/// returned for every further call. Every prompt received is recorded.
pub struct MockClient {
    script: Mutex<Vec<MockReply>>,
    fallback: MockReply,
    prompts: Mutex<Vec<String>>,
}

impl MockClient {
    /// Always reply with `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_fallback(MockReply::Text(text.into()))
    }

    /// Always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_fallback(MockReply::Fail(message.into()))
    }

    /// Reply with `replies` in order, then repeat the last one.
    pub fn with_sequence(replies: Vec<MockReply>) -> Self {
        let fallback = replies
            .last()
            .cloned()
            .unwrap_or_else(|| MockReply::Text(String::new()));
        let mut script = replies;
        script.reverse();
        Self {
            script: Mutex::new(script),
            fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn with_fallback(fallback: MockReply) -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            fallback,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn next_reply(&self) -> MockReply {
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl CompletionClient for MockClient {
    fn name(&self) -> &str {
        "mock"
    }

    fn complete<'a>(&'a self, _system: &'a str, prompt: &'a str) -> CompletionFuture<'a> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let reply = self.next_reply();
        Box::pin(async move {
            match reply {
                MockReply::Text(text) => Ok(text),
                MockReply::Fail(message) => Err(LlmError::Other(message)),
            }
        })
    }
}
