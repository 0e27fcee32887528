//! Mock provider for tests and offline runs.

use super::{Contents, FinishReason, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::sync::Mutex;

/// A single recorded `generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub model: String,
    pub contents: Contents,
}

enum Behaviour {
    Reply(String),
    Echo,
    Fail(ProviderError),
}

/// Mock text provider that records every call it receives.
pub struct MockTextProvider {
    behaviour: Behaviour,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTextProvider {
    /// Always answer with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with(Behaviour::Reply(text.into()))
    }

    /// Answer with a summary of the request, useful when running locally.
    pub fn echoing() -> Self {
        Self::with(Behaviour::Echo)
    }

    /// Always fail with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::with(Behaviour::Fail(error))
    }

    fn with(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(
        &self,
        model: &str,
        contents: &Contents,
    ) -> Result<ProviderResponse, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                model: model.to_string(),
                contents: contents.clone(),
            });
        }

        let text = match &self.behaviour {
            Behaviour::Reply(text) => text.clone(),
            Behaviour::Echo => format!(
                "Mock response from {} for {} part(s)",
                model,
                contents.part_count()
            ),
            Behaviour::Fail(err) => return Err(err.clone()),
        };

        Ok(ProviderResponse {
            text: Some(text),
            input_tokens: 0,
            output_tokens: 0,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match &self.behaviour {
            Behaviour::Fail(err) => Err(err.clone()),
            _ => Ok(()),
        }
    }
}
