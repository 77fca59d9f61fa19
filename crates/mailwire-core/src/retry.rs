//! Deadlines, backoff, and retry around suspending session operations.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::Error;

/// Default deadline for any suspending session operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// How an error should be handled by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Safe to retry on the same connection after a backoff.
    Transient,
    /// Retrying cannot help.
    Permanent,
    /// Retry requires the operation to acquire a fresh connection.
    RequiresReconnection,
}

/// Classification of errors into retry behavior.
pub trait Classify {
    /// Classifies the error.
    fn classify(&self) -> ErrorClass;
}

impl Classify for mailwire_imap::Error {
    fn classify(&self) -> ErrorClass {
        use mailwire_imap::Error as E;
        match self {
            E::Timeout(_) => ErrorClass::Transient,
            E::Io(_) | E::Transport(_) | E::ConnectionClosed | E::Bye(_) => {
                ErrorClass::RequiresReconnection
            }
            // NO/BAD leave the session usable but retrying the same
            // command yields the same answer.
            E::No(_)
            | E::Bad(_)
            | E::Sasl(_)
            | E::Parse { .. }
            | E::InvalidState(_)
            | E::MissingCapability(_)
            | E::Protocol(_) => ErrorClass::Permanent,
        }
    }
}

impl Classify for mailwire_smtp::Error {
    fn classify(&self) -> ErrorClass {
        use mailwire_smtp::Error as E;
        match self {
            E::Smtp { code, .. } if (400..500).contains(code) => ErrorClass::Transient,
            E::Io(_) | E::Transport(_) | E::ConnectionClosed => ErrorClass::RequiresReconnection,
            _ => ErrorClass::Permanent,
        }
    }
}

impl Classify for mailwire_pop3::Error {
    fn classify(&self) -> ErrorClass {
        use mailwire_pop3::Error as E;
        match self {
            E::Io(_) | E::Transport(_) | E::ConnectionClosed => ErrorClass::RequiresReconnection,
            _ => ErrorClass::Permanent,
        }
    }
}

impl Classify for Error {
    fn classify(&self) -> ErrorClass {
        match self {
            Self::Imap(e) => e.classify(),
            Self::Smtp(e) => e.classify(),
            Self::Pop3(e) => e.classify(),
            Self::Timeout(_) | Self::PoolExhausted => ErrorClass::Transient,
            Self::Transport(_) | Self::InvalidConnection => ErrorClass::RequiresReconnection,
            Self::Cancelled
            | Self::PoolClosed
            | Self::AuthenticationFailed(_)
            | Self::ConnectionFailed(_)
            | Self::MalformedReport(_)
            | Self::Mime(_) => ErrorClass::Permanent,
        }
    }
}

/// Exponential backoff policy with optional jitter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling for the computed delay.
    pub max_delay: Duration,
    /// Backoff multiplier, at least 1.0.
    pub multiplier: f64,
    /// Add 0–25% uniform jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Sets the retry count.
    #[must_use]
    pub const fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub const fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the delay ceiling.
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the multiplier (clamped to at least 1.0).
    #[must_use]
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier.max(1.0);
        self
    }

    /// Disables jitter.
    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Base delay before retry number `attempt` (0-based), without jitter:
    /// `min(max_delay, initial_delay * multiplier^attempt)`.
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(i32::try_from(attempt).unwrap_or(i32::MAX));
        let scaled = self.initial_delay.as_secs_f64() * factor;
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }

    /// Delay before retry number `attempt`, with jitter applied.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if !self.jitter {
            return base;
        }
        let factor = rand::thread_rng().gen_range(1.0..1.25);
        Duration::from_secs_f64(base.as_secs_f64() * factor)
    }
}

/// Terminal outcome of a retry loop.
#[derive(Debug)]
pub enum RetryError<E> {
    /// A permanent error stopped the loop.
    Permanent(E),
    /// All attempts were consumed.
    Exhausted {
        /// Attempts performed (`max_retries + 1`).
        attempts: u32,
        /// The final error.
        last: E,
    },
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permanent(e) => write!(f, "permanent failure: {e}"),
            Self::Exhausted { attempts, last } => {
                write!(f, "exhausted after {attempts} attempts: {last}")
            }
        }
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for RetryError<E> {}

/// Runs `op` under the retry policy.
///
/// The closure receives the 0-based attempt number and is expected to
/// acquire a fresh connection itself when the previous failure was
/// classified [`ErrorClass::RequiresReconnection`].
///
/// # Errors
///
/// Returns [`RetryError::Permanent`] on the first permanent error and
/// [`RetryError::Exhausted`] after `max_retries + 1` failed attempts.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> std::result::Result<T, RetryError<E>>
where
    E: Classify,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let attempts = policy.max_retries + 1;
    let mut attempt = 0;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => match error.classify() {
                ErrorClass::Permanent => return Err(RetryError::Permanent(error)),
                ErrorClass::Transient | ErrorClass::RequiresReconnection => {
                    attempt += 1;
                    if attempt >= attempts {
                        return Err(RetryError::Exhausted {
                            attempts,
                            last: error,
                        });
                    }
                    let delay = policy.delay(attempt - 1);
                    tracing::debug!(attempt, ?delay, "retrying after transient failure");
                    tokio::time::sleep(delay).await;
                }
            },
        }
    }
}

/// Bounds a suspending operation with a deadline.
///
/// # Errors
///
/// Returns [`Error::Timeout`] when the deadline expires first.
pub async fn with_deadline<T, Fut>(deadline: Duration, fut: Fut) -> crate::Result<T>
where
    Fut: Future<Output = crate::Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(deadline)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_formula() {
        let policy = RetryPolicy::default()
            .initial_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(450))
            .multiplier(2.0)
            .without_jitter();

        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        // Capped by max_delay.
        assert_eq!(policy.delay(3), Duration::from_millis(450));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy::default()
            .initial_delay(Duration::from_millis(100))
            .multiplier(1.0);
        for _ in 0..50 {
            let d = policy.delay(0);
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(125));
        }
    }

    #[test]
    fn multiplier_clamped_to_one() {
        let policy = RetryPolicy::default().multiplier(0.5).without_jitter();
        assert_eq!(policy.base_delay(4), policy.initial_delay);
    }

    #[test]
    fn classification_table() {
        use mailwire_imap::Error as Imap;
        use mailwire_smtp::Error as Smtp;

        assert_eq!(
            Imap::Timeout(Duration::from_secs(1)).classify(),
            ErrorClass::Transient
        );
        assert_eq!(
            Imap::ConnectionClosed.classify(),
            ErrorClass::RequiresReconnection
        );
        assert_eq!(Imap::No("denied".into()).classify(), ErrorClass::Permanent);

        assert_eq!(
            Smtp::Smtp {
                code: 451,
                enhanced: None,
                message: "busy".into()
            }
            .classify(),
            ErrorClass::Transient
        );
        assert_eq!(
            Smtp::Smtp {
                code: 550,
                enhanced: None,
                message: "no".into()
            }
            .classify(),
            ErrorClass::Permanent
        );
        assert_eq!(
            Smtp::ConnectionClosed.classify(),
            ErrorClass::RequiresReconnection
        );

        assert_eq!(Error::PoolExhausted.classify(), ErrorClass::Transient);
        assert_eq!(Error::PoolClosed.classify(), ErrorClass::Permanent);
        assert_eq!(
            Error::AuthenticationFailed("bad".into()).classify(),
            ErrorClass::Permanent
        );
        assert_eq!(
            Error::InvalidConnection.classify(),
            ErrorClass::RequiresReconnection
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default()
            .max_retries(5)
            .initial_delay(Duration::from_millis(10))
            .without_jitter();

        let result = retry(&policy, |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::PoolExhausted)
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default().max_retries(5);

        let result: std::result::Result<(), _> = retry(&policy, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::PoolClosed) }
        })
        .await;

        assert!(matches!(result, Err(RetryError::Permanent(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_counts_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default()
            .max_retries(2)
            .initial_delay(Duration::from_millis(1))
            .without_jitter();

        let result: std::result::Result<(), _> = retry(&policy, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::PoolExhausted) }
        })
        .await;

        let Err(RetryError::Exhausted { attempts, .. }) = result else {
            panic!("expected exhaustion");
        };
        assert_eq!(attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_is_timeout() {
        let result: crate::Result<()> = with_deadline(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn deadline_passes_through_success() {
        let result = with_deadline(Duration::from_secs(1), async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
