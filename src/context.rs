//! Per-call context and the interceptor chain.
//!
//! Interceptors run in registration order on the way in and unwind in reverse order on
//! the way out, like nested function calls. The client's terminal invoker always sits at
//! the end of the chain and is the only step that touches the network.
//!
//! ```ignore
//! struct Audit;
//!
//! #[async_trait]
//! impl<D: Dialect> Middleware<D> for Audit {
//!     async fn handle(&self, ctx: &mut Context<'_, D>, next: Next<'_, D>) {
//!         let method = ctx.request.method.clone();
//!         next.run(ctx).await;
//!         if let Some(response) = &ctx.response {
//!             audit_log(&method, response.status);
//!         }
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::client::Client;
use crate::dialect::Dialect;
use crate::types::{Request, Response};

/// An interceptor around the terminal network call.
///
/// Not calling [`Next::run`] short-circuits the chain: later interceptors and the network
/// call are skipped, and unless the interceptor fills `ctx.response` itself the caller
/// receives `None`.
#[async_trait]
pub trait Middleware<D: Dialect>: Send + Sync {
    async fn handle(&self, ctx: &mut Context<'_, D>, next: Next<'_, D>);
}

/// Transient state of one call.
pub struct Context<'client, D: Dialect> {
    /// Request as it will be sent. Interceptors may rewrite it before continuing.
    pub request: Request,
    /// Populated by the terminal invoker; `None` while the chain has not reached it.
    pub response: Option<Response>,
    client: &'client Client<D>,
}

impl<'client, D: Dialect> Context<'client, D> {
    pub(crate) fn new(request: Request, client: &'client Client<D>) -> Self {
        Self {
            request,
            response: None,
            client,
        }
    }

    #[must_use]
    pub fn client(&self) -> &'client Client<D> {
        self.client
    }

    #[must_use]
    pub fn dialect(&self) -> &'client D {
        self.client.dialect()
    }
}

impl<D: Dialect> fmt::Debug for Context<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("dialect", &D::NAME)
            .field("request", &self.request)
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

/// Continuation: the part of the chain after the current interceptor.
///
/// `Next` is `Copy`, so an interceptor can run the remainder more than once (retries).
pub struct Next<'chain, D: Dialect> {
    chain: &'chain [Arc<dyn Middleware<D>>],
}

impl<D: Dialect> Clone for Next<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D: Dialect> Copy for Next<'_, D> {}

impl<'chain, D: Dialect> Next<'chain, D> {
    pub(crate) fn new(chain: &'chain [Arc<dyn Middleware<D>>]) -> Self {
        Self { chain }
    }

    /// Interceptors still ahead, the terminal invoker included.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }

    /// Hands `ctx` to the following interceptor. A no-op past the end of the chain.
    pub async fn run(self, ctx: &mut Context<'_, D>) {
        if let Some((head, rest)) = self.chain.split_first() {
            head.handle(ctx, Next { chain: rest }).await;
        }
    }
}
