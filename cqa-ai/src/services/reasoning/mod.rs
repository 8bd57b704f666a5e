//! Reasoning client
//!
//! Wraps one logical analysis call to the external provider: local size
//! check, sliding-window rate limiting, bounded retry with exponential
//! backoff, a single fallback to the secondary model, and defensive
//! response parsing.

pub mod prompt;
pub mod provider;
pub mod rate_limiter;
pub mod response;

pub use provider::{ChatCompletionsProvider, ChatMessage, ChatRequest, ProviderError, ReasoningProvider};
pub use rate_limiter::{RateLimitStatus, SlidingWindowRateLimiter};

use cqa_common::config::TomlConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::{AnalysisKind, AnalysisReport};

/// Reasoning client errors
#[derive(Debug, Error)]
pub enum ReasoningError {
    /// Rejected locally, no provider call made
    #[error("File too large: {size} bytes (max {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    /// Every attempt on every eligible model failed
    #[error("Provider failed after {attempts} attempt(s) (last model {model}): {source}")]
    Exhausted {
        attempts: u32,
        model: String,
        #[source]
        source: ProviderError,
    },
}

/// Model selection, retry and size settings
#[derive(Debug, Clone)]
pub struct ReasoningSettings {
    pub preferred_model: String,
    pub fallback_model: String,
    /// Attempts per model, at least 1
    pub max_attempts_per_model: u32,
    /// Backoff before retry `n` on a model is `base_delay * 2^(n-1)`
    pub base_delay: Duration,
    pub call_timeout: Duration,
    pub max_file_bytes: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ReasoningSettings {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            preferred_model: config.provider.preferred_model.clone(),
            fallback_model: config.provider.fallback_model.clone(),
            max_attempts_per_model: config.rate_limit.max_retries.max(1),
            base_delay: Duration::from_millis(config.rate_limit.retry_delay_ms),
            call_timeout: Duration::from_secs(config.provider.request_timeout_secs),
            max_file_bytes: config.limits.max_file_bytes,
            temperature: config.provider.temperature,
            max_tokens: config.provider.max_tokens,
        }
    }
}

impl Default for ReasoningSettings {
    fn default() -> Self {
        Self::from_config(&TomlConfig::default())
    }
}

/// Successful call result
#[derive(Debug, Clone)]
pub struct ReasoningOutcome {
    pub report: AnalysisReport,
    /// Model whose answer was used
    pub model: String,
    /// Provider calls made, including failed ones
    pub attempts: u32,
}

/// Rate-limited, retrying client over a [`ReasoningProvider`]
#[derive(Clone)]
pub struct ReasoningClient {
    provider: Arc<dyn ReasoningProvider>,
    limiter: Arc<SlidingWindowRateLimiter>,
    settings: ReasoningSettings,
}

impl ReasoningClient {
    pub fn new(
        provider: Arc<dyn ReasoningProvider>,
        limiter: Arc<SlidingWindowRateLimiter>,
        settings: ReasoningSettings,
    ) -> Self {
        Self {
            provider,
            limiter,
            settings,
        }
    }

    pub fn settings(&self) -> &ReasoningSettings {
        &self.settings
    }

    pub fn limiter(&self) -> &Arc<SlidingWindowRateLimiter> {
        &self.limiter
    }

    /// Analyze one file's content
    ///
    /// High-priority files start on the preferred model; everything else
    /// starts (and stays) on the fallback model.
    pub async fn analyze(
        &self,
        content: &str,
        language: &str,
        kinds: &[AnalysisKind],
        high_priority: bool,
    ) -> Result<ReasoningOutcome, ReasoningError> {
        let size = content.len() as u64;
        if size > self.settings.max_file_bytes {
            return Err(ReasoningError::FileTooLarge {
                size,
                max: self.settings.max_file_bytes,
            });
        }

        let kinds = AnalysisKind::normalize(kinds);
        let max_attempts = self.settings.max_attempts_per_model.max(1);

        let mut on_preferred = high_priority;
        let mut model = self.model_for(on_preferred).to_string();
        let mut attempts_on_model = 0u32;
        let mut total_attempts = 0u32;

        loop {
            let request = prompt::build_request(
                &model,
                content,
                language,
                &kinds,
                self.settings.temperature,
                self.settings.max_tokens,
            );

            self.limiter.acquire().await;
            attempts_on_model += 1;
            total_attempts += 1;

            let result = match tokio::time::timeout(
                self.settings.call_timeout,
                self.provider.complete(&request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.settings.call_timeout)),
            };

            let error = match result {
                Ok(text) => {
                    tracing::debug!(
                        model = %model,
                        attempts = total_attempts,
                        "Reasoning call succeeded"
                    );
                    return Ok(ReasoningOutcome {
                        report: response::parse_report(&text),
                        model,
                        attempts: total_attempts,
                    });
                }
                Err(error) => error,
            };

            if error.is_transient() && attempts_on_model < max_attempts {
                let delay = self.backoff(attempts_on_model);
                tracing::warn!(
                    model = %model,
                    attempt = attempts_on_model,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Reasoning call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if on_preferred && self.settings.fallback_model != self.settings.preferred_model {
                tracing::warn!(
                    model = %model,
                    fallback = %self.settings.fallback_model,
                    error = %error,
                    "Preferred model exhausted, switching to fallback"
                );
                on_preferred = false;
                model = self.model_for(false).to_string();
                attempts_on_model = 0;
                continue;
            }

            tracing::error!(
                model = %model,
                attempts = total_attempts,
                error = %error,
                "Reasoning call failed permanently"
            );
            return Err(ReasoningError::Exhausted {
                attempts: total_attempts,
                model,
                source: error,
            });
        }
    }

    fn model_for(&self, preferred: bool) -> &str {
        if preferred {
            &self.settings.preferred_model
        } else {
            &self.settings.fallback_model
        }
    }

    /// Delay after the `attempt`-th failure on a model (1-based)
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.settings.base_delay.saturating_mul(1u32 << exponent)
    }
}
