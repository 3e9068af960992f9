use std::time::Duration;

use async_trait::async_trait;
use backoff::backoff::Backoff as _;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use crate::context::{Context, Middleware, Next};
use crate::dialect::Dialect;
use crate::types::{Fault, Response};

const INITIAL_INTERVAL: Duration = Duration::from_millis(200);
const MAX_INTERVAL: Duration = Duration::from_secs(5);

/// Re-runs the rest of the chain after local transport or envelope failures.
///
/// Remote application errors and configuration errors are returned as they are: the
/// same signed request would fail the same way again. Each attempt is signed afresh.
#[derive(Clone, Debug)]
pub struct Retry {
    max_attempts: u32,
    backoff: ExponentialBackoff,
}

impl Retry {
    /// `max_attempts` counts the first try; values below 1 are treated as 1.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: ExponentialBackoffBuilder::new()
                .with_initial_interval(INITIAL_INTERVAL)
                .with_max_interval(MAX_INTERVAL)
                .with_max_elapsed_time(None)
                .build(),
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

fn is_retryable(response: Option<&Response>) -> bool {
    response
        .and_then(|response| response.error.as_ref())
        .and_then(Fault::as_local)
        .is_some_and(crate::error::Error::is_transient)
}

#[async_trait]
impl<D: Dialect> Middleware<D> for Retry {
    async fn handle(&self, ctx: &mut Context<'_, D>, next: Next<'_, D>) {
        let mut backoff = self.backoff.clone();
        backoff.reset();

        let mut attempt = 1;
        loop {
            next.run(ctx).await;

            if attempt >= self.max_attempts || !is_retryable(ctx.response.as_ref()) {
                return;
            }
            let Some(delay) = backoff.next_backoff() else {
                return;
            };

            #[cfg(feature = "tracing")]
            tracing::debug!(
                dialect = D::NAME,
                method = %ctx.request.method,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "retrying after local failure"
            );

            tokio::time::sleep(delay).await;
            ctx.response = None;
            attempt += 1;
        }
    }
}
