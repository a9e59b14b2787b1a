//! Resilience configuration with builder pattern
//!
//! Provides a unified configuration for retry backoff and inter-batch pacing
//! with sane defaults for the Vetro API rate budget.

use super::retry::RetryConfig;
use crate::config::SubmissionSettings;
use std::time::Duration;

/// Global resilience configuration for batch submission
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    pub pacing: PacingConfig,
}

/// Pause inserted after each successful batch except the last
#[derive(Debug, Clone, PartialEq)]
pub struct PacingConfig {
    /// Zero disables pacing
    pub delay_between_batches: Duration,
}

impl PacingConfig {
    /// Delay to apply after a successful batch, if any
    pub fn delay(&self) -> Option<Duration> {
        if !self.delay_between_batches.is_zero() {
            Some(self.delay_between_batches)
        } else {
            None
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            delay_between_batches: Duration::from_secs(1), // Let the server bucket refill
        }
    }
}

impl ResilienceConfig {
    /// Create a new builder for ResilienceConfig
    pub fn builder() -> ResilienceConfigBuilder {
        ResilienceConfigBuilder::new()
    }

    /// Build from persisted submission settings
    pub fn from_settings(settings: &SubmissionSettings) -> Self {
        Self::builder()
            .max_retries(settings.max_retries)
            .initial_backoff(secs_to_duration(settings.initial_backoff_secs))
            .delay_between_batches(secs_to_duration(settings.delay_between_batches_secs))
            .build()
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

/// Builder for ResilienceConfig
#[derive(Debug)]
pub struct ResilienceConfigBuilder {
    config: ResilienceConfig,
}

impl ResilienceConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ResilienceConfig::default(),
        }
    }

    /// Set max retries per batch (0 disables retrying)
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    /// Set the first backoff delay; later delays grow from it
    pub fn initial_backoff(mut self, delay: Duration) -> Self {
        self.config.retry.initial_backoff = delay;
        self
    }

    /// Set the pause between successful batches
    pub fn delay_between_batches(mut self, delay: Duration) -> Self {
        self.config.pacing.delay_between_batches = delay;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> ResilienceConfig {
        self.config
    }
}

impl Default for ResilienceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
