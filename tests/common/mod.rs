#![allow(dead_code, reason = "each test binary uses a subset of the helpers")]

use std::net::TcpListener;

use chrono::{DateTime, FixedOffset};
use secrecy::SecretString;
use url::Url;
use wdt_client::{
    Gateway, GatewayClient, GatewayConfig, Native, NativeClient, NativeConfig, TimePolicy,
};

pub const NATIVE_PATH: &str = "/openapi";
pub const GATEWAY_PATH: &str = "/router/qm";

/// Native timestamp 100_000_000, i.e. 2015-03-03T01:46:40Z.
pub fn native_fixed_time() -> TimePolicy {
    let at = DateTime::from_timestamp(1_425_347_200, 0)
        .expect("in range")
        .fixed_offset();
    TimePolicy::Fixed(at)
}

pub fn gateway_fixed_time() -> TimePolicy {
    let at: DateTime<FixedOffset> =
        DateTime::parse_from_rfc3339("2024-01-01T12:00:00+08:00").expect("valid");
    TimePolicy::Fixed(at)
}

pub fn native_config(url: &str, secret: &str) -> NativeConfig {
    NativeConfig::from_raw(url, "1.0", "sid001", "key001", SecretString::from(secret))
        .expect("valid url")
}

pub fn native_client(url: &str, secret: &str) -> NativeClient {
    NativeClient::new(Native::new(native_config(url, secret))).with_time_policy(native_fixed_time())
}

pub fn gateway_client(url: &str, wdt_secret: &str) -> GatewayClient {
    let config = GatewayConfig::builder()
        .url(Url::parse(url).expect("valid url"))
        .app_key("qm001")
        .app_secret("qmsecret")
        .sid("sid001")
        .wdt_app_key("key001")
        .wdt_app_secret(wdt_secret)
        .target_app_key("target001")
        .build();
    GatewayClient::new(Gateway::new(config)).with_time_policy(gateway_fixed_time())
}

/// URL of a local port nothing listens on.
pub fn unreachable_url(path: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}{path}")
}
