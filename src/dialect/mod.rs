//! Wire dialects spoken by [`Client`](crate::Client).
//!
//! A dialect owns everything that differs between the direct endpoint and the Qimen
//! gateway: the signing clock format, body serialization, signature layout, how the
//! HTTP request is shaped and how the response envelope is classified. The client drives
//! those steps in the same order for both.

mod gateway;
mod native;

use chrono::{DateTime, FixedOffset};
use reqwest::{Client as ReqwestClient, RequestBuilder};
use serde_json::Value;
use url::Url;

use crate::Result;
use crate::canonical::CanonicalParams;
use crate::pager::PageOrigin;
use crate::types::{Fault, Request, Signature, Stamp};

pub use gateway::Gateway;
pub use native::{NATIVE_EPOCH_OFFSET, Native};

/// Output of [`Dialect::sign`].
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signed {
    pub signature: Signature,
    /// Query parameters to send, signatures included.
    pub query: CanonicalParams,
}

impl Signed {
    #[must_use]
    pub fn new(signature: Signature, query: CanonicalParams) -> Self {
        Self { signature, query }
    }
}

/// A parsed response envelope.
#[non_exhaustive]
#[derive(Debug)]
pub enum Envelope {
    Success { data: Option<Value> },
    Failure { status: i64, fault: Fault },
}

pub trait Dialect: Send + Sync + 'static {
    /// Short name used in log events.
    const NAME: &'static str;
    const PAGE_ORIGIN: PageOrigin;

    fn endpoint(&self) -> &Url;

    fn stamp(&self, now: DateTime<FixedOffset>) -> Stamp;

    fn serialize_body(&self, params: Option<&Value>) -> Result<String>;

    fn sign(&self, request: &Request, stamp: &Stamp, body: &str) -> Result<Signed>;

    fn build_request(
        &self,
        http: &ReqwestClient,
        signed: &Signed,
        body: String,
    ) -> RequestBuilder;

    fn parse_envelope(&self, raw: &[u8]) -> Result<Envelope>;
}
