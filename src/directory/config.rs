// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration types for the item directory.

use std::time::Duration;

use crate::event::DEFAULT_CHANNEL_CAPACITY;

/// Settings applied to every item a directory constructs.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use openhab_items::directory::{ItemDefaults, RetryPolicy};
///
/// let defaults = ItemDefaults::new()
///     .with_echo_window(Duration::from_millis(500))
///     .with_retry(RetryPolicy::new().with_max_attempts(3));
///
/// assert!(defaults.auto_update);
/// assert_eq!(defaults.echo_window, Duration::from_millis(500));
/// ```
#[derive(Debug, Clone)]
pub struct ItemDefaults {
    /// How long after a local command or update a matching server event is
    /// treated as its echo.
    pub echo_window: Duration,
    /// Whether items follow the event stream. When `false`, reading the
    /// state refetches it from the server and pushed events are ignored.
    pub auto_update: bool,
    /// Retry policy for item fetches.
    pub retry: RetryPolicy,
    /// Capacity of the directory-wide event bus; zero is treated as one.
    pub event_capacity: usize,
}

impl ItemDefaults {
    /// Default echo window.
    pub const DEFAULT_ECHO_WINDOW: Duration = Duration::from_millis(750);

    /// Creates the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the echo window.
    #[must_use]
    pub fn with_echo_window(mut self, window: Duration) -> Self {
        self.echo_window = window;
        self
    }

    /// Sets whether items follow the event stream.
    #[must_use]
    pub fn with_auto_update(mut self, auto_update: bool) -> Self {
        self.auto_update = auto_update;
        self
    }

    /// Sets the fetch retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the event bus capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

impl Default for ItemDefaults {
    fn default() -> Self {
        Self {
            echo_window: Self::DEFAULT_ECHO_WINDOW,
            auto_update: true,
            retry: RetryPolicy::default(),
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Bounded retry for fetching items.
///
/// The default is 10 attempts spaced 50 ms apart. A multiplier above 1
/// turns the fixed spacing into exponential backoff capped at `max_delay`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use openhab_items::directory::RetryPolicy;
///
/// let policy = RetryPolicy::new()
///     .with_max_attempts(4)
///     .with_delay(Duration::from_millis(100))
///     .with_backoff_multiplier(2.0);
///
/// assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
/// assert!(policy.should_retry(3));
/// assert!(!policy.should_retry(4));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub delay: Duration,
    /// Upper bound for the delay.
    pub max_delay: Duration,
    /// Growth factor of the delay per attempt.
    pub backoff_multiplier: f32,
}

impl RetryPolicy {
    /// Creates a policy with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy that never retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sets the total number of attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay between attempts.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay after the given failed attempt (0-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.delay.min(self.max_delay);
        }

        let multiplier = self
            .backoff_multiplier
            .powi(i32::try_from(attempt).unwrap_or(i32::MAX));

        #[allow(clippy::cast_precision_loss)]
        let delay_ms = self.delay.as_millis() as f32 * multiplier;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delay = Duration::from_millis(delay_ms as u64);

        delay.min(self.max_delay)
    }

    /// Returns `true` if another attempt may follow `attempts` failed ones.
    #[must_use]
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_defaults() {
        let defaults = ItemDefaults::default();
        assert_eq!(defaults.echo_window, Duration::from_millis(750));
        assert!(defaults.auto_update);
        assert_eq!(defaults.event_capacity, 256);
        assert_eq!(defaults.retry.max_attempts, 10);
    }

    #[test]
    fn item_defaults_builder() {
        let defaults = ItemDefaults::new()
            .with_auto_update(false)
            .with_event_capacity(32);
        assert!(!defaults.auto_update);
        assert_eq!(defaults.event_capacity, 32);
    }

    #[test]
    fn retry_default_is_fixed_spacing() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(50));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(50));
        assert_eq!(policy.delay_for_attempt(9), Duration::from_millis(50));
    }

    #[test]
    fn retry_backoff_is_capped() {
        let policy = RetryPolicy::new()
            .with_delay(Duration::from_secs(1))
            .with_backoff_multiplier(2.0)
            .with_max_delay(Duration::from_secs(5));

        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(5));
    }

    #[test]
    fn retry_attempt_bound() {
        let policy = RetryPolicy::new().with_max_attempts(3);
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));

        assert!(!RetryPolicy::disabled().should_retry(1));
    }
}
