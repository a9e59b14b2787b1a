//! Vetro REST API client
//!
//! Encodes table rows as feature payloads and pushes them to
//! `PATCH /features` in paced, retried batches.

pub mod batch;
pub mod encoder;
pub mod models;
pub mod resilience;
pub mod transport;

pub use batch::{BatchError, BatchFailure, BatchResult, BatchUpdateClient, SubmissionOutcome};
pub use encoder::FeatureEncoder;
pub use models::{FeatureCollection, FeaturePayload, VetroRef};
pub use resilience::{Delivery, PacingConfig, ResilienceConfig, RetryConfig, RetryPolicy, RetryableOutcome};
pub use transport::{HttpTransport, ResponseBody, Transport, TransportOutcome};
