//! Retry policy with exponential backoff
//!
//! A batch is re-sent while the transport reports a retryable outcome (429,
//! 5xx, network failure) and the retry budget lasts. Client errors and
//! successes end the loop immediately.

use log::{info, warn};
use std::future::Future;
use std::time::Duration;

use crate::api::transport::{ResponseBody, TransportOutcome};

/// Retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
    /// Growth factor between consecutive delays
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(120),
            backoff_multiplier: 2.0,
        }
    }
}

/// Transport outcomes that warrant another attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RetryableOutcome {
    RateLimited,
    ServerError { status: u16 },
    NetworkFailure { cause: String },
}

impl std::fmt::Display for RetryableOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryableOutcome::RateLimited => write!(f, "429 Too Many Requests"),
            RetryableOutcome::ServerError { status } => write!(f, "server error {}", status),
            RetryableOutcome::NetworkFailure { cause } => write!(f, "network failure: {}", cause),
        }
    }
}

/// Transport outcomes that end the retry loop on the first attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SettledOutcome {
    Success { status: u16, body: ResponseBody },
    ClientError { status: u16, body: String },
}

impl TryFrom<TransportOutcome> for RetryableOutcome {
    type Error = SettledOutcome;

    fn try_from(outcome: TransportOutcome) -> Result<Self, Self::Error> {
        match outcome {
            TransportOutcome::Success { status, body } => Err(SettledOutcome::Success { status, body }),
            TransportOutcome::ClientError { status, body } => Err(SettledOutcome::ClientError { status, body }),
            TransportOutcome::RateLimited => Ok(RetryableOutcome::RateLimited),
            TransportOutcome::ServerError { status } => Ok(RetryableOutcome::ServerError { status }),
            TransportOutcome::NetworkFailure { cause } => Ok(RetryableOutcome::NetworkFailure { cause }),
        }
    }
}

/// Final result of delivering one batch
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The server accepted the batch
    Delivered {
        status: u16,
        body: ResponseBody,
        attempts: u32,
    },
    /// The server rejected the batch; retrying would not help
    Rejected {
        status: u16,
        body: String,
        attempts: u32,
    },
    /// Every attempt failed with a retryable outcome
    Exhausted {
        last: RetryableOutcome,
        attempts: u32,
    },
}

/// Exponential backoff retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Delay before the given retry (1-based): initial * multiplier^(retry-1)
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.config.initial_backoff.as_secs_f64()
            * self.config.backoff_multiplier.max(1.0).powi(exponent);
        let capped = secs.min(self.config.max_backoff.as_secs_f64());

        if capped.is_finite() && capped > 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            Duration::ZERO
        }
    }

    /// Run `send` until it delivers, is rejected, or the retry budget runs out
    pub async fn deliver<F, Fut>(&self, mut send: F) -> Delivery
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = TransportOutcome>,
    {
        let mut retries: u32 = 0;

        loop {
            let attempts = retries + 1;
            let retryable = match RetryableOutcome::try_from(send().await) {
                Ok(retryable) => retryable,
                Err(SettledOutcome::Success { status, body }) => {
                    return Delivery::Delivered {
                        status,
                        body,
                        attempts,
                    };
                }
                Err(SettledOutcome::ClientError { status, body }) => {
                    warn!("Client error {} from Vetro API, not retrying", status);
                    return Delivery::Rejected {
                        status,
                        body,
                        attempts,
                    };
                }
            };
            warn!("Vetro API request failed: {}", retryable);

            if retries >= self.config.max_retries {
                warn!(
                    "Giving up after {} attempts, last outcome: {}",
                    attempts, retryable
                );
                return Delivery::Exhausted {
                    last: retryable,
                    attempts,
                };
            }

            retries += 1;
            let delay = self.backoff_delay(retries);
            info!(
                "Backing off for {:.1}s (attempt {}/{})",
                delay.as_secs_f64(),
                retries,
                self.config.max_retries
            );
            tokio::time::sleep(delay).await;
        }
    }
}
