//! Fixed-delay request pacing for per-symbol sources.
//!
//! A [`Pacer`] enforces a minimum interval between consecutive requests to
//! one provider. Callers queue on an async mutex, so concurrent callers are
//! released one at a time, each at least `min_delay` after the previous one.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Minimum-interval gate for one provider.
#[derive(Debug)]
pub struct Pacer {
    /// Provider label used in logs.
    label: &'static str,
    min_delay: Duration,
    /// Instant the previous request was released, if any.
    last_release: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(label: &'static str, min_delay: Duration) -> Self {
        Self {
            label,
            min_delay,
            last_release: Mutex::new(None),
        }
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Wait until a request may be sent.
    ///
    /// The first call returns immediately.
    pub async fn wait(&self) {
        let mut last = self.last_release.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_delay;
            if Instant::now() < ready_at {
                debug!(
                    "Pacer: waiting {:?} before next '{}' request",
                    ready_at - Instant::now(),
                    self.label
                );
                sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}
