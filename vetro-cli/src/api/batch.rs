//! Batched submission of feature updates
//!
//! Rows are split into consecutive batches and sent strictly one after
//! another. Each batch goes through the retry policy; successes are followed
//! by a pacing delay, and a batch that stays rate limited after every retry
//! stops the whole submission.

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use super::encoder::FeatureEncoder;
use super::models::FeatureCollection;
use super::resilience::{Delivery, ResilienceConfig, RetryPolicy, RetryableOutcome};
use super::transport::Transport;
use crate::table::Row;

/// Why rows could not be delivered
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchFailure {
    #[error("row {row} has no vetro_id, skipped")]
    IdentityMissing { row: usize },

    #[error("rate limit exceeded and retry limit reached after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("server error {status}, retry limit reached after {attempts} attempts")]
    ServerError { status: u16, attempts: u32 },

    #[error("network failure after {attempts} attempts: {cause}")]
    NetworkFailure { cause: String, attempts: u32 },

    #[error("HTTP {status}: {body}")]
    ClientError { status: u16, body: String },
}

impl BatchFailure {
    fn exhausted(last: RetryableOutcome, attempts: u32) -> Self {
        match last {
            RetryableOutcome::RateLimited => BatchFailure::RateLimited { attempts },
            RetryableOutcome::ServerError { status } => BatchFailure::ServerError { status, attempts },
            RetryableOutcome::NetworkFailure { cause } => BatchFailure::NetworkFailure { cause, attempts },
        }
    }
}

/// A failure entry in a [`BatchResult`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchError {
    /// 1-based batch number; `None` for rows rejected before batching
    pub batch_index: Option<usize>,
    pub message: String,
    pub failure: BatchFailure,
}

impl BatchError {
    fn new(batch_index: Option<usize>, failure: BatchFailure) -> Self {
        Self {
            batch_index,
            message: failure.to_string(),
            failure,
        }
    }
}

/// How a submission ended, from the operator's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// There were no rows to send
    Nothing,
    /// Every row was delivered
    Complete,
    /// Some rows failed but every batch was attempted
    Partial,
    /// Persistent rate limiting stopped the run; later batches were not sent
    RateLimitedStop,
}

/// Aggregate result of one `submit` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub total_rows: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub rate_limited: bool,
    pub errors: Vec<BatchError>,
}

impl BatchResult {
    fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            success_count: 0,
            failure_count: 0,
            rate_limited: false,
            errors: Vec::new(),
        }
    }

    fn record_success(&mut self, rows: usize) {
        self.success_count += rows;
        debug_assert!(self.success_count + self.failure_count <= self.total_rows);
    }

    fn record_failure(&mut self, rows: usize, error: BatchError) {
        self.failure_count += rows;
        self.errors.push(error);
        debug_assert!(self.success_count + self.failure_count <= self.total_rows);
    }

    /// Rows never attempted because the run stopped early
    pub fn unattempted(&self) -> usize {
        self.total_rows - self.success_count - self.failure_count
    }

    pub fn outcome(&self) -> SubmissionOutcome {
        if self.rate_limited {
            SubmissionOutcome::RateLimitedStop
        } else if self.total_rows == 0 {
            SubmissionOutcome::Nothing
        } else if self.failure_count == 0 {
            SubmissionOutcome::Complete
        } else {
            SubmissionOutcome::Partial
        }
    }
}

/// Sends rows to Vetro in paced, retried batches
pub struct BatchUpdateClient<T: Transport> {
    transport: T,
    encoder: FeatureEncoder,
    policy: RetryPolicy,
    resilience: ResilienceConfig,
}

impl<T: Transport> BatchUpdateClient<T> {
    pub fn new(transport: T, resilience: ResilienceConfig) -> Self {
        Self::with_encoder(transport, resilience, FeatureEncoder::default())
    }

    pub fn with_encoder(transport: T, resilience: ResilienceConfig, encoder: FeatureEncoder) -> Self {
        Self {
            transport,
            encoder,
            policy: RetryPolicy::new(resilience.retry.clone()),
            resilience,
        }
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit rows without progress reporting
    pub async fn submit(&self, rows: &[Row], batch_size: usize) -> BatchResult {
        self.submit_with_progress(rows, batch_size, |_| {}).await
    }

    /// Submit rows, calling `on_progress` with the processed fraction after
    /// each batch. Never fails; every outcome lands in the returned result.
    pub async fn submit_with_progress<P>(&self, rows: &[Row], batch_size: usize, mut on_progress: P) -> BatchResult
    where
        P: FnMut(f64),
    {
        let batch_size = batch_size.max(1);
        let mut result = BatchResult::new(rows.len());

        let mut eligible: Vec<&Row> = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            if row.identity(self.encoder.identity_column()).is_some() {
                eligible.push(row);
            } else {
                warn!("Skipping row {}: no {}", index, self.encoder.identity_column());
                result.record_failure(1, BatchError::new(None, BatchFailure::IdentityMissing { row: index }));
            }
        }

        if eligible.is_empty() {
            on_progress(1.0);
            return result;
        }

        let total = eligible.len();
        let batch_count = total.div_ceil(batch_size);
        let mut processed = 0usize;

        info!(
            "Submitting {} features in {} batches of up to {}",
            total, batch_count, batch_size
        );

        for (position, batch) in eligible.chunks(batch_size).enumerate() {
            let batch_index = position + 1;
            let is_last = batch_index == batch_count;

            let features: Vec<_> = batch.iter().map(|row| self.encoder.encode_row(row)).collect();
            let payload = FeatureCollection::new(features);

            let delivery = self
                .policy
                .deliver(|| self.transport.patch_features(&payload))
                .await;

            let mut delivered = false;
            let mut stop = false;
            match delivery {
                Delivery::Delivered { attempts, .. } => {
                    debug!("Batch {}/{} delivered after {} attempts", batch_index, batch_count, attempts);
                    result.record_success(batch.len());
                    delivered = true;
                }
                Delivery::Rejected { status, body, .. } => {
                    warn!("Batch {}/{} rejected with HTTP {}", batch_index, batch_count, status);
                    result.record_failure(
                        batch.len(),
                        BatchError::new(Some(batch_index), BatchFailure::ClientError { status, body }),
                    );
                }
                Delivery::Exhausted { last, attempts } => {
                    stop = matches!(last, RetryableOutcome::RateLimited);
                    warn!("Batch {}/{} failed: {}", batch_index, batch_count, last);
                    result.record_failure(
                        batch.len(),
                        BatchError::new(Some(batch_index), BatchFailure::exhausted(last, attempts)),
                    );
                }
            }

            processed += batch.len();
            on_progress((processed as f64 / total as f64).min(1.0));

            if stop {
                result.rate_limited = true;
                warn!(
                    "Rate limited on batch {}/{}, stopping with {} rows unsent",
                    batch_index,
                    batch_count,
                    total - processed
                );
                break;
            }

            if delivered && !is_last {
                if let Some(delay) = self.resilience.pacing.delay() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        info!(
            "Submission finished: {} ok, {} failed, rate_limited={}",
            result.success_count, result.failure_count, result.rate_limited
        );
        result
    }
}
