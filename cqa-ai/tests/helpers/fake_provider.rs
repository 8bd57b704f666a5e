//! Scripted reasoning provider
//!
//! Replies are popped from a script; once it runs dry every call gets the
//! default reply. Calls whose prompt contains the failure marker always
//! fail with a non-transient error.

use async_trait::async_trait;
use cqa_ai::services::reasoning::{ChatRequest, ProviderError, ReasoningProvider};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    default_reply: String,
    fail_marker: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    /// Every call returns `reply`
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply: reply.into(),
            fail_marker: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Play `script` first, then fall back to `reply`
    pub fn scripted(script: Vec<Result<String, ProviderError>>, reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::always(reply)
        }
    }

    /// Fail (HTTP 400) whenever the source contains `marker`
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// Sleep before answering
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Model name of every call made, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningProvider for ScriptedProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(request.model.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(marker) = &self.fail_marker {
            if request.messages.iter().any(|m| m.content.contains(marker.as_str())) {
                return Err(ProviderError::Api(400, "rejected by test provider".to_string()));
            }
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => Ok(self.default_reply.clone()),
        }
    }
}
