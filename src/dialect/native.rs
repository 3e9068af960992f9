use chrono::{DateTime, FixedOffset};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as ReqwestClient, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::Result;
use crate::config::NativeConfig;
use crate::dialect::{Dialect, Envelope, Signed};
use crate::error::{Error, Kind};
use crate::pager::PageOrigin;
use crate::signer::{NativeInput, sign_native};
use crate::types::{Fault, NativeFault, Request, STATUS_SUCCESS, Signature, Stamp, value_text};

/// Unix seconds of 2012-01-01T00:00:00+08:00; native timestamps count from here.
pub const NATIVE_EPOCH_OFFSET: i64 = 1_325_347_200;

const EMPTY_BODY: &str = "[{}]";

/// Direct signed-HTTP dialect.
#[derive(Clone, Debug)]
pub struct Native {
    config: NativeConfig,
}

impl Native {
    #[must_use]
    pub fn new(config: NativeConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &NativeConfig {
        &self.config
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    status: Option<Value>,
    message: Option<Value>,
    data: Option<Value>,
}

/// Integer status, also accepting whole-number floats such as `1.0`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "only whole numbers below 2^53 reach the cast"
)]
fn status_code(value: &Value) -> Option<i64> {
    if let Some(code) = value.as_i64() {
        return Some(code);
    }
    let float = value.as_f64()?;
    if float.fract() != 0.0 || float.abs() > 9_007_199_254_740_992.0 {
        return None;
    }
    Some(float as i64)
}

impl Dialect for Native {
    const NAME: &'static str = "native";
    const PAGE_ORIGIN: PageOrigin = PageOrigin::Zero;

    fn endpoint(&self) -> &Url {
        &self.config.url
    }

    fn stamp(&self, now: DateTime<FixedOffset>) -> Stamp {
        Stamp::Timestamp(now.timestamp() - NATIVE_EPOCH_OFFSET)
    }

    /// Objects travel as a one-element array, arrays as they are.
    fn serialize_body(&self, params: Option<&Value>) -> Result<String> {
        match params {
            None | Some(Value::Null) => Ok(EMPTY_BODY.to_owned()),
            Some(array @ Value::Array(_)) => Ok(serde_json::to_string(array)?),
            Some(other) => Ok(serde_json::to_string(&[other])?),
        }
    }

    fn sign(&self, request: &Request, stamp: &Stamp, body: &str) -> Result<Signed> {
        let &Stamp::Timestamp(timestamp) = stamp else {
            return Err(Error::validation(format!(
                "native dialect signs with a unix timestamp, got `{stamp}`"
            )));
        };
        let parts = self.config.secret_parts()?;

        let signed = sign_native(&NativeInput {
            secret: parts.secret,
            salt: parts.salt,
            sid: &self.config.sid,
            app_key: &self.config.app_key,
            version: &self.config.version,
            method: &request.method,
            timestamp,
            body,
            pager: request.pager,
        });

        Ok(Signed::new(Signature::new(signed.sign, None), signed.query))
    }

    fn build_request(
        &self,
        http: &ReqwestClient,
        signed: &Signed,
        body: String,
    ) -> RequestBuilder {
        http.post(self.config.url.clone())
            .query(&signed.query.to_query())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
    }

    fn parse_envelope(&self, raw: &[u8]) -> Result<Envelope> {
        let envelope: RawEnvelope =
            serde_json::from_slice(raw).map_err(|e| Error::with_source(Kind::Envelope, e))?;

        let status = envelope
            .status
            .as_ref()
            .and_then(status_code)
            .ok_or_else(|| Error::envelope("response has no integer `status`"))?;

        if status != STATUS_SUCCESS {
            let message = envelope
                .message
                .as_ref()
                .map(value_text)
                .unwrap_or_default();
            return Ok(Envelope::Failure {
                status,
                fault: Fault::Native(NativeFault { message }),
            });
        }

        Ok(Envelope::Success {
            data: envelope.data,
        })
    }
}
