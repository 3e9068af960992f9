use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use url::Url;

use crate::Result;
use crate::error::Error;

/// Separates the signing secret from the salt in a composite app secret.
pub const SECRET_SEPARATOR: char = ':';

/// The two halves of a composite `secret:salt` app secret.
#[derive(Clone, Copy)]
pub(crate) struct SecretParts<'secret> {
    pub secret: &'secret str,
    pub salt: &'secret str,
}

pub(crate) fn split_secret(composite: &SecretString) -> Result<SecretParts<'_>> {
    let mut parts = composite.expose_secret().split(SECRET_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(secret), Some(salt), None) if !secret.is_empty() && !salt.is_empty() => {
            Ok(SecretParts { secret, salt })
        }
        _ => Err(Error::configuration(format!(
            "app secret must have the form `secret{SECRET_SEPARATOR}salt` with both parts non-empty"
        ))),
    }
}

/// Native dialect configuration.
///
/// Field names on the wire follow the vendor console: `url`, `v`, `sid`, `appkey`,
/// `appsecret`.
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, bon::Builder)]
pub struct NativeConfig {
    pub url: Url,
    #[serde(rename = "v")]
    #[builder(into)]
    pub version: String,
    #[builder(into)]
    pub sid: String,
    #[serde(rename = "appkey")]
    #[builder(into)]
    pub app_key: String,
    /// Composite `secret:salt`.
    #[serde(rename = "appsecret")]
    #[builder(into)]
    pub app_secret: SecretString,
}

impl NativeConfig {
    pub fn from_raw(
        url: &str,
        version: &str,
        sid: &str,
        app_key: &str,
        app_secret: SecretString,
    ) -> Result<Self> {
        let url = Url::parse(url)?;
        Ok(Self::new(
            url,
            version.to_owned(),
            sid.to_owned(),
            app_key.to_owned(),
            app_secret,
        ))
    }

    #[must_use]
    pub fn new(
        url: Url,
        version: String,
        sid: String,
        app_key: String,
        app_secret: SecretString,
    ) -> Self {
        Self {
            url,
            version,
            sid,
            app_key,
            app_secret,
        }
    }

    /// Checks the composite secret eagerly.
    ///
    /// Calls made with an invalid secret fail locally anyway; this only surfaces the
    /// problem at startup.
    pub fn validate(&self) -> Result<()> {
        split_secret(&self.app_secret).map(|_| ())
    }

    pub(crate) fn secret_parts(&self) -> Result<SecretParts<'_>> {
        split_secret(&self.app_secret)
    }
}

/// Gateway (Qimen) dialect configuration.
#[non_exhaustive]
#[derive(Clone, Debug, Deserialize, bon::Builder)]
pub struct GatewayConfig {
    #[serde(rename = "qimen_url")]
    pub url: Url,
    #[serde(rename = "qimen_appkey")]
    #[builder(into)]
    pub app_key: String,
    #[serde(rename = "qimen_appsecret")]
    #[builder(into)]
    pub app_secret: SecretString,
    /// Seller account, sent as `wdt3_customer_id`.
    #[builder(into)]
    pub sid: String,
    #[serde(rename = "wdt_appkey")]
    #[builder(into)]
    pub wdt_app_key: String,
    /// Composite native `secret:salt`.
    #[serde(rename = "wdt_appsecret")]
    #[builder(into)]
    pub wdt_app_secret: SecretString,
    #[serde(rename = "target_appkey")]
    #[builder(into)]
    pub target_app_key: String,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        split_secret(&self.wdt_app_secret).map(|_| ())
    }

    pub(crate) fn secret_parts(&self) -> Result<SecretParts<'_>> {
        split_secret(&self.wdt_app_secret)
    }
}
