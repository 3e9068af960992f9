use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde_json::Value;

use crate::Result;
use crate::context::{Context, Middleware, Next};
use crate::dialect::{Dialect, Envelope, Gateway, Native};
use crate::error::Error;
use crate::pager::Pager;
use crate::policy::TimePolicy;
use crate::types::{Request, Response, STATUS_SUCCESS};

/// Deadline applied to the single HTTP exchange of a call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Signed-envelope client, generic over the wire [`Dialect`].
///
/// Register interceptors with [`Client::use_middleware`] before sharing the client; calls
/// only need `&self`, so a configured client can serve concurrent callers.
pub struct Client<D: Dialect> {
    dialect: D,
    http: ReqwestClient,
    timeout: Duration,
    time_policy: TimePolicy,
    /// User interceptors in registration order, then the terminal [`Invoker`].
    chain: Vec<Arc<dyn Middleware<D>>>,
}

pub type NativeClient = Client<Native>;
pub type GatewayClient = Client<Gateway>;

impl<D: Dialect> Client<D> {
    #[must_use]
    pub fn new(dialect: D) -> Self {
        Self::with_http_client(dialect, ReqwestClient::new())
    }

    /// Creates a client on top of a caller-supplied HTTP client (proxies, TLS roots...).
    #[must_use]
    pub fn with_http_client(dialect: D, http: ReqwestClient) -> Self {
        Self {
            dialect,
            http,
            timeout: DEFAULT_TIMEOUT,
            time_policy: TimePolicy::default(),
            chain: vec![Arc::new(Invoker)],
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_time_policy(mut self, time_policy: TimePolicy) -> Self {
        self.time_policy = time_policy;
        self
    }

    /// Appends an interceptor; it runs after every previously registered one.
    pub fn use_middleware<M: Middleware<D> + 'static>(&mut self, middleware: M) -> &mut Self {
        let terminal = self.chain.len() - 1;
        self.chain.insert(terminal, Arc::new(middleware));
        self
    }

    #[must_use]
    pub fn with_middleware<M: Middleware<D> + 'static>(mut self, middleware: M) -> Self {
        self.use_middleware(middleware);
        self
    }

    #[must_use]
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of registered interceptors, the terminal invoker excluded.
    #[must_use]
    pub fn middleware_count(&self) -> usize {
        self.chain.len() - 1
    }

    /// Runs `request` through the interceptor chain.
    ///
    /// `None` means an interceptor stopped the chain without producing a response. Any
    /// failure past that point is reported inside the returned [`Response`].
    pub async fn call(&self, request: Request) -> Option<Response> {
        let mut ctx = Context::new(request, self);
        Next::new(&self.chain).run(&mut ctx).await;
        ctx.response
    }

    /// Signs and sends `request` directly, skipping every interceptor.
    pub async fn call_without_middleware(&self, request: Request) -> Response {
        self.invoke(request).await
    }

    async fn invoke(&self, request: Request) -> Response {
        let stamp = self.dialect.stamp(self.time_policy.now());
        let mut response = Response::new(request, stamp, D::PAGE_ORIGIN);

        if let Err(err) = self.exchange(&mut response).await {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                dialect = D::NAME,
                method = %response.request.method,
                kind = %err.kind(),
                error = %err,
                "call failed before a remote status was obtained"
            );
            response.fail(err);
        }

        response
    }

    async fn exchange(&self, response: &mut Response) -> Result<()> {
        let pager = response.request.pager;
        if let Some(pager) = pager {
            pager.validate(D::PAGE_ORIGIN)?;
        }

        let body = self
            .dialect
            .serialize_body(response.request.params.as_ref())?;
        let signed = self
            .dialect
            .sign(&response.request, &response.stamp, &body)?;
        response.signature = signed.signature.clone();

        let http_request = self
            .dialect
            .build_request(&self.http, &signed, body)
            .timeout(self.timeout)
            .build()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            dialect = D::NAME,
            method = %response.request.method,
            http_method = %http_request.method(),
            endpoint = %self.dialect.endpoint(),
            stamp = %response.stamp,
            "sending signed request"
        );

        let http_response = self.http.execute(http_request).await?;
        let http_status = http_response.status();
        let raw = http_response.bytes().await?;

        let envelope = self.dialect.parse_envelope(&raw).map_err(|err| {
            if http_status.is_success() {
                err
            } else {
                Error::envelope(format!("HTTP {http_status}: {err}"))
            }
        })?;

        match envelope {
            Envelope::Failure { status, fault } => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    dialect = D::NAME,
                    method = %response.request.method,
                    status,
                    error = %fault,
                    "remote reported failure"
                );
                response.status = status;
                response.error = Some(fault);
            }
            Envelope::Success { data } => {
                let data = data.filter(|value| !value.is_null());
                response.total_count = match pager {
                    Some(Pager {
                        calc_total: true, ..
                    }) => total_count(data.as_ref())?,
                    _ => 0,
                };
                response.data = data.map(|value| value.to_string()).unwrap_or_default();
                response.status = STATUS_SUCCESS;

                #[cfg(feature = "tracing")]
                tracing::debug!(
                    dialect = D::NAME,
                    method = %response.request.method,
                    total_count = response.total_count,
                    bytes = response.data.len(),
                    "call succeeded"
                );
            }
        }

        Ok(())
    }
}

/// Reads `total_count` out of a successful payload; absent counts as zero.
fn total_count(data: Option<&Value>) -> Result<i64> {
    let Some(Value::Object(map)) = data else {
        return Err(Error::envelope(
            "`calc_total` was requested but `data` is not an object",
        ));
    };
    Ok(map
        .get("total_count")
        .and_then(|value| {
            value
                .as_i64()
                .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        })
        .unwrap_or(0))
}

impl<D: Dialect + Clone> Clone for Client<D> {
    fn clone(&self) -> Self {
        Self {
            dialect: self.dialect.clone(),
            http: self.http.clone(),
            timeout: self.timeout,
            time_policy: self.time_policy,
            chain: self.chain.clone(),
        }
    }
}

impl<D: Dialect + fmt::Debug> fmt::Debug for Client<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("dialect", &self.dialect)
            .field("timeout", &self.timeout)
            .field("time_policy", &self.time_policy)
            .field("middleware", &self.middleware_count())
            .finish_non_exhaustive()
    }
}

/// Terminal step of every chain: sign, send, classify.
struct Invoker;

#[async_trait]
impl<D: Dialect> Middleware<D> for Invoker {
    async fn handle(&self, ctx: &mut Context<'_, D>, _next: Next<'_, D>) {
        let response = ctx.client().invoke(ctx.request.clone()).await;
        ctx.response = Some(response);
    }
}
