use std::time::Instant;

use async_trait::async_trait;

use crate::context::{Context, Middleware, Next};
use crate::dialect::Dialect;

/// Emits one `tracing` event per call with method, elapsed time and outcome.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default)]
pub struct Logging;

#[async_trait]
impl<D: Dialect> Middleware<D> for Logging {
    async fn handle(&self, ctx: &mut Context<'_, D>, next: Next<'_, D>) {
        let method = ctx.request.method.clone();
        let started = Instant::now();

        next.run(ctx).await;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &ctx.response {
            None => tracing::warn!(
                dialect = D::NAME,
                method = %method,
                elapsed_ms,
                "call stopped by middleware without a response"
            ),
            Some(response) => match &response.error {
                None => tracing::info!(
                    dialect = D::NAME,
                    method = %method,
                    elapsed_ms,
                    status = response.status,
                    has_more = response.has_more(),
                    "call finished"
                ),
                Some(fault) => tracing::warn!(
                    dialect = D::NAME,
                    method = %method,
                    elapsed_ms,
                    status = response.status,
                    error = %fault,
                    "call failed"
                ),
            },
        }
    }
}
