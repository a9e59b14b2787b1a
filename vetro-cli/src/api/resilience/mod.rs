//! Retry and pacing for Vetro API submissions
//!
//! Provides the exponential backoff retry policy and the inter-batch pacing
//! configuration that keep pushes inside the server's rate budget.

pub mod config;
pub mod retry;

pub use config::{PacingConfig, ResilienceConfig, ResilienceConfigBuilder};
pub use retry::{Delivery, RetryConfig, RetryPolicy, RetryableOutcome, SettledOutcome};
