#![cfg_attr(docsrs, feature(doc_cfg))]

//! Signed-request client for the WDT order-management API.
//!
//! Two dialects share one pipeline:
//! - [`Native`]: `POST` to the direct endpoint, MD5 signature over the sorted parameters
//! - [`Gateway`]: `GET` through the Qimen gateway, an upper-case outer signature wrapping
//!   a native one
//!
//! Each call runs through an ordered chain of [`Middleware`] ending in the client's
//! terminal invoker, which signs, sends and classifies the result into a [`Response`].
//! Every failure, local or remote, is reported inside that response.
//!
//! ```ignore
//! use wdt_client::{NativeClient, Native, NativeConfig, Pager, Request};
//!
//! let config = NativeConfig::from_raw(url, "1.0", "mysid", "myappkey", secret)?;
//! let client = NativeClient::new(Native::new(config));
//!
//! let request = Request::new("sales.TradeQuery.queryWithDetail")
//!     .with_params(&query)?
//!     .with_pager(Pager::new(100, 0).with_calc_total(true));
//! let response = client.call(request).await.expect("no middleware short-circuits");
//! if let Some(fault) = &response.error {
//!     return Err(fault.message().into());
//! }
//! let first_trade = response.get("order.0.trade_no");
//! ```

pub mod canonical;
pub mod client;
pub mod config;
pub mod context;
pub mod dialect;
pub mod error;
pub mod middleware;
pub mod pager;
pub mod policy;
pub mod signer;
pub mod types;

pub use async_trait::async_trait;
pub use client::{Client, DEFAULT_TIMEOUT, GatewayClient, NativeClient};
pub use config::{GatewayConfig, NativeConfig};
pub use context::{Context, Middleware, Next};
pub use dialect::{Dialect, Gateway, Native};
pub use error::{Error, Kind};
pub use pager::{PageOrigin, Pager};
pub use policy::TimePolicy;
pub use types::{
    Fault, GatewayFault, NativeFault, Request, Response, STATUS_GATEWAY_FAILURE,
    STATUS_LOCAL_FAILURE, STATUS_SUCCESS, Signature, Stamp,
};

pub type Result<T> = std::result::Result<T, error::Error>;
