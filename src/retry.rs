//! # Retry Policy
//!
//! Bounded exponential backoff shared by namespace provisioning and every
//! other blob backend call. Only errors that report themselves retryable
//! are retried; everything else propagates on the first attempt.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event};

/// Errors that can tell whether another attempt may succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Retry settings for backend calls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay after the first failure in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    4
}
fn default_initial_backoff_ms() -> u64 {
    100
}
fn default_max_backoff_ms() -> u64 {
    2_000
}
fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryPolicy {
    /// Policy that retries without sleeping (tests, local backends)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
            multiplier: 1.0,
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(32) as i32;
        let delay = self.initial_backoff_ms as f64 * self.multiplier.powi(exponent);
        let capped = delay.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Run `op` until it succeeds, fails permanently or attempts run out
    pub fn run<T, E, F>(&self, operation: &str, op: F) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Result<T, E>,
    {
        self.run_with(operation, |_, _| {}, op)
    }

    /// Like `run`, calling `on_retry(retry_number, &error)` before each sleep
    pub fn run_with<T, E, F, R>(&self, operation: &str, mut on_retry: R, mut op: F) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Result<T, E>,
        R: FnMut(u32, &E),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.backoff_for(attempt);
                    log_event_with_fields(
                        Event::BackendRetry,
                        &[
                            ("operation", operation),
                            ("attempt", &attempt.to_string()),
                            ("delay_ms", &delay.as_millis().to_string()),
                            ("error", &err.to_string()),
                        ],
                    );
                    on_retry(attempt, &err);
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
