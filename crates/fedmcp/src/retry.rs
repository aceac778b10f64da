/*
 *  Copyright 2025-2026 FedMCP Contributors
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Bounded retry with backoff for network-facing calls.
//!
//! Only the KMS key provider and the server client retry. Cryptographic
//! outcomes are deterministic and never go through this module.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How the delay between attempts grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same delay every time.
    Fixed,
    /// `initial_delay * attempt * multiplier`.
    Linear { multiplier: f64 },
    /// `initial_delay * multiplier * base^(attempt - 1)`.
    Exponential { base: f64, multiplier: f64 },
}

/// Retry policy for transient failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_strategy: BackoffStrategy,
    /// Randomise each delay by up to +/-10%.
    pub with_jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            backoff_strategy: BackoffStrategy::Exponential {
                base: 2.0,
                multiplier: 1.0,
            },
            with_jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    ///
    /// Never exceeds `max_delay` before jitter, whatever the policy values.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let factor = match &self.backoff_strategy {
            BackoffStrategy::Fixed => 1.0,
            BackoffStrategy::Linear { multiplier } => f64::from(attempt) * multiplier.max(0.0),
            BackoffStrategy::Exponential { base, multiplier } => {
                multiplier.max(0.0) * base.max(1.0).powi(attempt.min(64) as i32 - 1)
            }
        };
        let delay = scale(self.initial_delay, factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay));

        if self.with_jitter {
            scale(delay, rand::thread_rng().gen_range(0.9..=1.1)).unwrap_or(delay)
        } else {
            delay
        }
    }

    /// Whether another attempt is allowed after `attempt` attempts.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// `duration * factor`, or `None` when the product is not representable.
fn scale(duration: Duration, factor: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(duration.as_secs_f64() * factor).ok()
}

/// Errors that know whether they are worth retrying.
pub trait RetryableError: Display {
    /// Network-level or 5xx-style failure that may succeed later.
    fn is_transient(&self) -> bool;

    /// The error to return when the caller cancels.
    fn canceled() -> Self;
}

/// Run `attempt_fn` until it succeeds, fails permanently, exhausts the
/// policy, or `cancel` fires.
pub async fn run_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    operation: &str,
    mut attempt_fn: F,
) -> Result<T, E>
where
    E: RetryableError,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(E::canceled()),
            result = attempt_fn(attempt) => result,
        };

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && policy.should_retry(attempt) => {
                let delay = policy.calculate_delay(attempt);
                crate::security::audit::log_retry_scheduled(operation, attempt, delay, &e.to_string());

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(E::canceled()),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
