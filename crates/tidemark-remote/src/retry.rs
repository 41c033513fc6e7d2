use std::thread;
use std::time::Duration;

use crate::{Error, Result};

/// Exponential backoff for transient remote failures. Non-transient
/// errors surface immediately.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 250,
            max_delay_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.base_delay_ms.saturating_mul(1u64 << attempt.min(16));
        Duration::from_millis(exp.min(self.max_delay_ms))
    }
}

pub fn with_retry<T, F>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt + 1 < policy.max_attempts => {
                thread::sleep(policy.delay_for(attempt));
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    #[test]
    fn test_transient_errors_are_retried() {
        let mut calls = 0;
        let result = with_retry(&instant_policy(4), || {
            calls += 1;
            if calls < 3 {
                Err(Error::Transient("flap".to_string()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_permanent_errors_fail_fast() {
        let mut calls = 0;
        let result: Result<()> = with_retry(&instant_policy(4), || {
            calls += 1;
            Err(Error::NotFound("/gone".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_attempts_are_bounded() {
        let mut calls = 0;
        let result: Result<()> = with_retry(&instant_policy(3), || {
            calls += 1;
            Err(Error::Transient("still down".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay_ms: 1_000,
            max_delay_ms: 4_000,
        };
        assert_eq!(policy.delay_for(0).as_millis(), 1_000);
        assert_eq!(policy.delay_for(1).as_millis(), 2_000);
        assert_eq!(policy.delay_for(5).as_millis(), 4_000);
    }
}
