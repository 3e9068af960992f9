use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::Result;
use crate::error::Error;
use crate::pager::{PageOrigin, Pager};

/// The remote accepted the call.
pub const STATUS_SUCCESS: i64 = 0;
/// No remote status was obtained: local validation, serialization or transport failed.
pub const STATUS_LOCAL_FAILURE: i64 = -1;
/// Status assigned to every gateway `flag == "failure"` answer.
pub const STATUS_GATEWAY_FAILURE: i64 = 1;

/// A remote method invocation.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub method: String,
    pub params: Option<Value>,
    pub pager: Option<Pager>,
}

impl Request {
    #[must_use]
    pub fn new<S: Into<String>>(method: S) -> Self {
        Self {
            method: method.into(),
            params: None,
            pager: None,
        }
    }

    /// Attaches parameters serialized from any `Serialize` value.
    pub fn with_params<P: Serialize>(mut self, params: &P) -> Result<Self> {
        self.params = Some(serde_json::to_value(params)?);
        Ok(self)
    }

    #[must_use]
    pub fn with_value(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    #[must_use]
    pub const fn with_pager(mut self, pager: Pager) -> Self {
        self.pager = Some(pager);
        self
    }
}

/// The clock reading a call was signed with.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stamp {
    /// Native dialect: seconds since the vendor epoch (2012-01-01T00:00:00+08:00).
    Timestamp(i64),
    /// Gateway dialect: `YYYY-MM-DD HH:MM:SS`.
    DateTime(String),
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stamp::Timestamp(ts) => write!(f, "{ts}"),
            Stamp::DateTime(dt) => f.write_str(dt),
        }
    }
}

/// Signature(s) computed for a call.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Signature {
    /// The signature the endpoint checks first (native `sign`, gateway `sign`).
    pub sign: String,
    /// Gateway only: the nested native signature (`wdt_sign`).
    pub nested: Option<String>,
}

impl Signature {
    #[must_use]
    pub fn new(sign: String, nested: Option<String>) -> Self {
        Self { sign, nested }
    }
}

/// Failure reported by the native endpoint (`status != 0`).
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeFault {
    pub message: String,
}

/// Failure reported by the gateway (`flag == "failure"`), fields copied verbatim.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GatewayFault {
    pub flag: String,
    pub request_id: String,
    pub code: String,
    pub message: String,
    pub sub_code: String,
    pub sub_message: String,
}

/// Why a call did not yield data.
#[non_exhaustive]
#[derive(Debug)]
pub enum Fault {
    /// Nothing trustworthy came back from the remote.
    Local(Error),
    Native(NativeFault),
    Gateway(GatewayFault),
}

impl Fault {
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Fault::Local(err) => err.to_string(),
            Fault::Native(fault) => fault.message.clone(),
            Fault::Gateway(fault) => fault.message.clone(),
        }
    }

    #[must_use]
    pub fn as_local(&self) -> Option<&Error> {
        match self {
            Fault::Local(err) => Some(err),
            Fault::Native(_) | Fault::Gateway(_) => None,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Local(err) => write!(f, "request failed: {err}"),
            Fault::Native(fault) => write!(f, "remote error: {}", fault.message),
            Fault::Gateway(fault) => write!(
                f,
                "gateway error: flag={}, request_id={}, code={}, message={}, sub_code={}, sub_message={}",
                fault.flag,
                fault.request_id,
                fault.code,
                fault.message,
                fault.sub_code,
                fault.sub_message
            ),
        }
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Fault::Local(err) => Some(err),
            Fault::Native(_) | Fault::Gateway(_) => None,
        }
    }
}

impl From<Error> for Fault {
    fn from(err: Error) -> Self {
        Fault::Local(err)
    }
}

/// Outcome of one call. Check [`Response::error`] before trusting [`Response::data`].
#[derive(Debug)]
pub struct Response {
    /// The request as it reached the transport, after any middleware rewrites.
    pub request: Request,
    pub status: i64,
    pub error: Option<Fault>,
    pub stamp: Stamp,
    pub signature: Signature,
    /// Raw `data` payload as JSON text, empty when absent.
    pub data: String,
    /// Only populated when the request asked for `calc_total`.
    pub total_count: i64,
    origin: PageOrigin,
}

impl Response {
    pub(crate) fn new(request: Request, stamp: Stamp, origin: PageOrigin) -> Self {
        Self {
            request,
            status: STATUS_LOCAL_FAILURE,
            error: None,
            stamp,
            signature: Signature::default(),
            data: String::new(),
            total_count: 0,
            origin,
        }
    }

    pub(crate) fn fail(&mut self, err: Error) {
        self.status = STATUS_LOCAL_FAILURE;
        self.error = Some(Fault::Local(err));
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS && self.error.is_none()
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Typed value at a dotted path such as `order.items.0.goods_no`.
    ///
    /// Numeric segments index into arrays. Returns `None` when the payload is not JSON or
    /// the path does not resolve.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<Value> {
        let root: Value = serde_json::from_str(&self.data).ok()?;
        let mut current = &root;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current.clone())
    }

    /// String form of the value at a dotted path; empty when missing.
    ///
    /// Strings come back unquoted, anything else as compact JSON.
    #[must_use]
    pub fn get(&self, path: &str) -> String {
        self.lookup(path).map(|v| value_text(&v)).unwrap_or_default()
    }

    /// Whether rows remain past the requested page. See [`Pager::has_more`].
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.request
            .pager
            .is_some_and(|pager| pager.has_more(self.total_count, self.origin))
    }

    /// The page convention this response was produced under.
    #[must_use]
    pub fn page_origin(&self) -> PageOrigin {
        self.origin
    }
}

/// Text form of a JSON value the way remote diagnostic fields are reported.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
