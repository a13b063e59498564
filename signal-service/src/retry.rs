use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Bounded retry with exponentially growing delays and optional additive jitter.
/// `tries` counts every attempt, including the first one.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub tries: u32,
    pub delay: Duration,
    pub multiplier: f64,
    pub jitter: Option<(Duration, Duration)>,
}

impl RetryPolicy {
    pub fn new(tries: u32, delay: Duration, multiplier: f64) -> Self {
        Self {
            tries,
            delay,
            multiplier,
            jitter: None,
        }
    }

    pub fn with_jitter(mut self, min: Duration, max: Duration) -> Self {
        self.jitter = Some((min, max));
        self
    }

    /// Policy used around language-model calls: 3 tries, 2s doubling, 1-3s jitter
    pub fn model_default() -> Self {
        Self::new(3, Duration::from_secs(2), 2.0)
            .with_jitter(Duration::from_secs(1), Duration::from_secs(3))
    }

    /// Retries without waiting. Mostly useful in tests.
    pub fn immediate(tries: u32) -> Self {
        Self::new(tries, Duration::ZERO, 1.0)
    }

    fn schedule(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.delay,
            initial_interval: self.delay,
            randomization_factor: 0.0,
            multiplier: self.multiplier,
            max_interval: Duration::from_secs(3600),
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Waits between consecutive attempts, before jitter.
    pub fn delays(&self) -> Vec<Duration> {
        let mut schedule = self.schedule();
        (1..self.tries.max(1))
            .filter_map(|_| schedule.next_backoff())
            .collect()
    }

    fn jitter(&self) -> Duration {
        match self.jitter {
            Some((min, max)) if max > min => {
                let seconds = rand::thread_rng().gen_range(min.as_secs_f64()..=max.as_secs_f64());
                Duration::from_secs_f64(seconds)
            }
            Some((min, _)) => min,
            None => Duration::ZERO,
        }
    }

    /// Runs `attempt` until it succeeds or the tries are used up, returning the
    /// last error in the latter case.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let tries = self.tries.max(1);
        let mut schedule = self.schedule();
        let mut tried = 1;

        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if tried < tries => {
                    let delay = schedule.next_backoff().unwrap_or(self.delay) + self.jitter();
                    warn!(
                        "{} failed on attempt {}/{}: {}, retrying in {:?}",
                        operation, tried, tries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    tried += 1;
                }
                Err(e) => {
                    error!("{} failed after {} attempts: {}", operation, tries, e);
                    return Err(e);
                }
            }
        }
    }
}
