//! Rate-limit aware wrapper around a single remote call.
//!
//! [`RetryRunner::call_with_retry`] sends one request and, when the endpoint throttles it,
//! sleeps for the suggested (or default) wait, resets the model's local budget and tries
//! again. Any other failure is returned immediately. Retrying is bounded by
//! [`RetryPolicy::max_attempts`]; [`RetryPolicy::unbounded`] has to be chosen explicitly to
//! retry forever.
//!
//! Sleeping goes through the [`Sleeper`] trait so tests can record waits instead of
//! spending real time.

use crate::client_wrapper::{ClientError, ClientWrapper, Message, TokenUsage, WaitHint};
use crate::event::{EventHandler, PipelineEvent};
use crate::rate_limit::RateLimiter;
use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Wait used when the endpoint does not suggest one.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(60);
/// Attempts made by [`RetryPolicy::default`].
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// How throttled calls are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Used when the endpoint gives no wait, and for local budget cool-downs.
    pub default_wait: Duration,
    /// Upper bound applied to endpoint-suggested waits.
    pub max_wait: Option<Duration>,
    /// Whether a wait value that cannot be read is retried after `default_wait`.
    /// When `false` the call stops with an "unknown wait time" warning.
    pub retry_on_unparseable_wait: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            default_wait: DEFAULT_WAIT,
            max_wait: None,
            retry_on_unparseable_wait: false,
        }
    }
}

impl RetryPolicy {
    /// Retry throttled calls until they succeed.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            ..Self::default()
        }
    }

    /// Values below 1 are raised to 1 (a single attempt, no retries).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    pub fn with_default_wait(mut self, wait: Duration) -> Self {
        self.default_wait = wait;
        self
    }

    pub fn with_max_wait(mut self, wait: Duration) -> Self {
        self.max_wait = Some(wait);
        self
    }

    pub fn with_retry_on_unparseable_wait(mut self, retry: bool) -> Self {
        self.retry_on_unparseable_wait = retry;
        self
    }

    /// The sleep to take for `hint`, or `None` when the call must not be retried.
    pub fn wait_for(&self, hint: &WaitHint) -> Option<Duration> {
        let wait = match hint {
            WaitHint::Suggested(wait) => *wait,
            WaitHint::Absent => self.default_wait,
            WaitHint::Unparseable(_) if self.retry_on_unparseable_wait => self.default_wait,
            WaitHint::Unparseable(_) => return None,
        };
        Some(match self.max_wait {
            Some(max) => wait.min(max),
            None => wait,
        })
    }

    fn allows_attempt_after(&self, attempts_made: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts_made < max)
    }
}

/// Suspends the calling task.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A successful call.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub message: Message,
    pub usage: Option<TokenUsage>,
    /// Attempts it took, including the successful one.
    pub attempts: u32,
}

/// Why [`RetryRunner::call_with_retry`] gave up.
#[derive(Debug, Clone)]
pub enum RetryError {
    /// The endpoint kept throttling, or sent a wait that could not be read.
    RateLimitExceeded {
        attempts: u32,
        /// Raw wait value when the call stopped because it could not be read.
        unknown_wait: Option<String>,
        message: String,
    },
    /// Any other remote failure. Never retried.
    Remote(ClientError),
}

impl fmt::Display for RetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::RateLimitExceeded {
                unknown_wait: Some(raw),
                ..
            } => write!(f, "Rate limit reached, unknown wait time ('{}')", raw),
            RetryError::RateLimitExceeded { attempts, .. } => {
                write!(f, "Rate limit still reached after {} attempts", attempts)
            }
            RetryError::Remote(err) => write!(f, "{}", err),
        }
    }
}

impl Error for RetryError {}

/// Runs remote calls under a [`RetryPolicy`], charging an optional shared [`RateLimiter`].
#[derive(Clone, Copy)]
pub struct RetryRunner<'a> {
    policy: &'a RetryPolicy,
    sleeper: &'a dyn Sleeper,
    limiter: Option<&'a RateLimiter>,
    events: Option<&'a dyn EventHandler>,
}

impl<'a> RetryRunner<'a> {
    pub fn new(policy: &'a RetryPolicy, sleeper: &'a dyn Sleeper) -> Self {
        Self {
            policy,
            sleeper,
            limiter: None,
            events: None,
        }
    }

    pub fn with_limiter(mut self, limiter: &'a RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn with_events(mut self, events: &'a dyn EventHandler) -> Self {
        self.events = Some(events);
        self
    }

    /// Send `messages` through `client`, retrying throttled attempts.
    ///
    /// Every wait taken is pushed onto `notices` as a user-facing line.
    pub async fn call_with_retry(
        &self,
        client: &dyn ClientWrapper,
        messages: &[Message],
        notices: &mut Vec<String>,
    ) -> Result<RetryOutcome, RetryError> {
        let model = client.model_name().to_string();
        let mut attempts = 0u32;

        loop {
            self.cool_down_if_exhausted(&model, notices).await;

            attempts += 1;
            match client.send_message(messages).await {
                Ok(message) => {
                    let usage = client.get_last_usage().await;
                    if let Some(limiter) = self.limiter {
                        let spent = usage
                            .as_ref()
                            .map(|u| u.total_tokens as u64)
                            .filter(|t| *t > 0)
                            .unwrap_or(1);
                        limiter.record(&model, spent).await;
                    }
                    return Ok(RetryOutcome {
                        message,
                        usage,
                        attempts,
                    });
                }
                Err(ClientError::RateLimited { wait, message }) => {
                    let delay = match self.policy.wait_for(&wait) {
                        Some(delay) => delay,
                        None => {
                            let raw = match wait {
                                WaitHint::Unparseable(raw) => raw,
                                _ => String::new(),
                            };
                            log::warn!(
                                "RetryRunner::call_with_retry(...): {} throttled with unreadable wait '{}', not retrying",
                                model,
                                raw
                            );
                            notices.push(format!(
                                "Rate limit reached on {}: unknown wait time. Please try again later.",
                                model
                            ));
                            return Err(RetryError::RateLimitExceeded {
                                attempts,
                                unknown_wait: Some(raw),
                                message,
                            });
                        }
                    };

                    if !self.policy.allows_attempt_after(attempts) {
                        log::error!(
                            "RetryRunner::call_with_retry(...): {} still throttled after {} attempts",
                            model,
                            attempts
                        );
                        return Err(RetryError::RateLimitExceeded {
                            attempts,
                            unknown_wait: None,
                            message,
                        });
                    }

                    log::warn!(
                        "RetryRunner::call_with_retry(...): {} throttled on attempt {}, waiting {:?}",
                        model,
                        attempts,
                        delay
                    );
                    notices.push(format!(
                        "Rate limit reached on {}. Waiting {:.1} seconds before retrying...",
                        model,
                        delay.as_secs_f64()
                    ));
                    if let Some(events) = self.events {
                        events
                            .on_pipeline_event(&PipelineEvent::RateLimited {
                                model: model.clone(),
                                attempt: attempts,
                                wait: delay,
                            })
                            .await;
                    }
                    self.sleeper.sleep(delay).await;
                    if let Some(limiter) = self.limiter {
                        limiter.reset(&model).await;
                    }
                }
                Err(other) => {
                    log::error!(
                        "RetryRunner::call_with_retry(...): {} failed: {}",
                        model,
                        other
                    );
                    return Err(RetryError::Remote(other));
                }
            }
        }
    }

    async fn cool_down_if_exhausted(&self, model: &str, notices: &mut Vec<String>) {
        let Some(limiter) = self.limiter else {
            return;
        };
        if !limiter.is_exhausted(model).await {
            return;
        }
        let wait = self.policy.default_wait;
        log::warn!(
            "RetryRunner::call_with_retry(...): local budget for {} spent, cooling down {:?}",
            model,
            wait
        );
        notices.push(format!(
            "Token budget for {} exhausted. Waiting {:.1} seconds...",
            model,
            wait.as_secs_f64()
        ));
        if let Some(events) = self.events {
            events
                .on_pipeline_event(&PipelineEvent::BudgetExhausted {
                    model: model.to_string(),
                    wait,
                })
                .await;
        }
        self.sleeper.sleep(wait).await;
        limiter.reset(model).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_selection() {
        let policy = RetryPolicy::default().with_max_wait(Duration::from_secs(30));
        assert_eq!(
            policy.wait_for(&WaitHint::Suggested(Duration::from_secs(5))),
            Some(Duration::from_secs(5))
        );
        assert_eq!(
            policy.wait_for(&WaitHint::Suggested(Duration::from_secs(600))),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            policy.wait_for(&WaitHint::Absent),
            Some(Duration::from_secs(30))
        );
        assert_eq!(policy.wait_for(&WaitHint::Unparseable("x".into())), None);

        let lenient = RetryPolicy::default().with_retry_on_unparseable_wait(true);
        assert_eq!(
            lenient.wait_for(&WaitHint::Unparseable("x".into())),
            Some(DEFAULT_WAIT)
        );
    }

    #[test]
    fn attempt_bounds() {
        let policy = RetryPolicy::default().with_max_attempts(0);
        assert_eq!(policy.max_attempts, Some(1));
        assert!(!policy.allows_attempt_after(1));
        assert!(RetryPolicy::unbounded().allows_attempt_after(u32::MAX));
    }
}
