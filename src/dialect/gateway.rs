use chrono::{DateTime, FixedOffset};
use reqwest::{Client as ReqwestClient, RequestBuilder};
use secrecy::ExposeSecret as _;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::Result;
use crate::canonical::canonical_json;
use crate::config::GatewayConfig;
use crate::dialect::{Dialect, Envelope, Signed};
use crate::error::{Error, Kind};
use crate::pager::PageOrigin;
use crate::signer::{GatewayInput, sign_gateway};
use crate::types::{
    Fault, GatewayFault, Request, STATUS_GATEWAY_FAILURE, Signature, Stamp, value_text,
};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const EMPTY_BODY: &str = "{}";
const FAILURE_FLAG: &str = "failure";

/// Qimen gateway dialect: a gateway-signed `GET` carrying a native-signed payload.
#[derive(Clone, Debug)]
pub struct Gateway {
    config: GatewayConfig,
}

impl Gateway {
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    response: Option<RawBody>,
}

#[derive(Deserialize)]
struct RawBody {
    flag: Option<Value>,
    request_id: Option<Value>,
    code: Option<Value>,
    message: Option<Value>,
    sub_code: Option<Value>,
    sub_message: Option<Value>,
    data: Option<Value>,
}

fn text(value: Option<&Value>) -> String {
    value.map(value_text).unwrap_or_default()
}

impl Dialect for Gateway {
    const NAME: &'static str = "gateway";
    const PAGE_ORIGIN: PageOrigin = PageOrigin::One;

    fn endpoint(&self) -> &Url {
        &self.config.url
    }

    fn stamp(&self, now: DateTime<FixedOffset>) -> Stamp {
        Stamp::DateTime(now.format(DATETIME_FORMAT).to_string())
    }

    /// Parameters travel as canonical JSON so the signed and the sent bytes agree.
    fn serialize_body(&self, params: Option<&Value>) -> Result<String> {
        Ok(match params {
            None | Some(Value::Null) => EMPTY_BODY.to_owned(),
            Some(value) => canonical_json(value),
        })
    }

    fn sign(&self, request: &Request, stamp: &Stamp, body: &str) -> Result<Signed> {
        let Stamp::DateTime(datetime) = stamp else {
            return Err(Error::validation(format!(
                "gateway dialect signs with a datetime, got `{stamp}`"
            )));
        };
        let parts = self.config.secret_parts()?;

        let signed = sign_gateway(&GatewayInput {
            gateway_secret: self.config.app_secret.expose_secret(),
            gateway_app_key: &self.config.app_key,
            target_app_key: &self.config.target_app_key,
            customer_id: &self.config.sid,
            native_secret: parts.secret,
            native_salt: parts.salt,
            native_app_key: &self.config.wdt_app_key,
            method: &request.method,
            datetime,
            body,
            pager: request.pager,
        });

        Ok(Signed::new(
            Signature::new(signed.sign, Some(signed.wdt_sign)),
            signed.query,
        ))
    }

    /// The body is already part of the query as `params`.
    fn build_request(
        &self,
        http: &ReqwestClient,
        signed: &Signed,
        _body: String,
    ) -> RequestBuilder {
        http.get(self.config.url.clone())
            .query(&signed.query.to_query())
    }

    fn parse_envelope(&self, raw: &[u8]) -> Result<Envelope> {
        let envelope: RawEnvelope =
            serde_json::from_slice(raw).map_err(|e| Error::with_source(Kind::Envelope, e))?;
        let body = envelope
            .response
            .ok_or_else(|| Error::envelope("missing `response` object"))?;

        if text(body.flag.as_ref()) == FAILURE_FLAG {
            return Ok(Envelope::Failure {
                status: STATUS_GATEWAY_FAILURE,
                fault: Fault::Gateway(GatewayFault {
                    flag: FAILURE_FLAG.to_owned(),
                    request_id: text(body.request_id.as_ref()),
                    code: text(body.code.as_ref()),
                    message: text(body.message.as_ref()),
                    sub_code: text(body.sub_code.as_ref()),
                    sub_message: text(body.sub_message.as_ref()),
                }),
            });
        }

        Ok(Envelope::Success { data: body.data })
    }
}
