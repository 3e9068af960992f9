//! MD5 request signatures for both dialects.
//!
//! Every function here is pure: identical inputs always produce identical signatures and
//! outbound parameter sets. Clocks, secrets parsing and HTTP live elsewhere.

use md5::{Digest as _, Md5};

use crate::canonical::{CanonicalParams, ParamValue};
use crate::pager::Pager;

pub const GATEWAY_FORMAT: &str = "json";
pub const GATEWAY_VERSION: &str = "2.0";
pub const GATEWAY_SIGN_METHOD: &str = "md5";

/// Lowercase hex MD5 of `s`.
#[must_use]
pub fn md5_hex(s: &str) -> String {
    hex::encode(Md5::digest(s.as_bytes()))
}

/// `md5_hex(secret ‖ canonical(params) ‖ secret)`.
#[must_use]
pub fn digest(secret: &str, params: &CanonicalParams) -> String {
    let encoded = params.encode();
    let mut input = String::with_capacity(secret.len() * 2 + encoded.len());
    input.push_str(secret);
    input.push_str(&encoded);
    input.push_str(secret);
    md5_hex(&input)
}

fn calc_total_flag(pager: &Pager) -> ParamValue {
    ParamValue::Int(i64::from(pager.calc_total))
}

/// Pager fragment embedded by the gateway dialect, e.g. `{"page_no":1,"page_size":50}`.
#[must_use]
pub fn pager_fragment(pager: &Pager) -> String {
    format!(
        r#"{{"page_no":{},"page_size":{}}}"#,
        pager.page_no, pager.page_size
    )
}

/// Everything the native signature covers.
#[expect(
    clippy::exhaustive_structs,
    reason = "callers assemble signing inputs field by field"
)]
#[derive(Clone, Copy, Debug)]
pub struct NativeInput<'input> {
    pub secret: &'input str,
    pub salt: &'input str,
    pub sid: &'input str,
    pub app_key: &'input str,
    pub version: &'input str,
    pub method: &'input str,
    pub timestamp: i64,
    /// Serialized request body. Signed, but not sent as a query parameter.
    pub body: &'input str,
    pub pager: Option<Pager>,
}

#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeSignature {
    pub sign: String,
    /// Query parameters to transmit, `sign` included and `body` excluded.
    pub query: CanonicalParams,
}

#[must_use]
pub fn sign_native(input: &NativeInput<'_>) -> NativeSignature {
    let mut params = CanonicalParams::new();
    params.insert("sid", input.sid);
    params.insert("key", input.app_key);
    params.insert("v", input.version);
    params.insert("method", input.method);
    params.insert("salt", input.salt);
    params.insert("timestamp", input.timestamp);
    params.insert("body", ParamValue::Json(input.body.to_owned()));
    if let Some(pager) = &input.pager {
        params.insert("page_size", pager.page_size);
        params.insert("page_no", pager.page_no);
        params.insert("calc_total", calc_total_flag(pager));
    }

    let sign = digest(input.secret, &params);
    params.remove("body");
    params.insert("sign", sign.clone());

    NativeSignature {
        sign,
        query: params,
    }
}

/// Everything the nested gateway signatures cover.
#[expect(
    clippy::exhaustive_structs,
    reason = "callers assemble signing inputs field by field"
)]
#[derive(Clone, Copy, Debug)]
pub struct GatewayInput<'input> {
    pub gateway_secret: &'input str,
    pub gateway_app_key: &'input str,
    pub target_app_key: &'input str,
    pub customer_id: &'input str,
    pub native_secret: &'input str,
    pub native_salt: &'input str,
    pub native_app_key: &'input str,
    pub method: &'input str,
    /// `YYYY-MM-DD HH:MM:SS`, sent as both `timestamp` and `datetime`.
    pub datetime: &'input str,
    /// Canonical JSON body, sent as the `params` query parameter.
    pub body: &'input str,
    pub pager: Option<Pager>,
}

#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewaySignature {
    /// Outer gateway signature, upper-case hex.
    pub sign: String,
    /// Inner native signature, lower-case hex.
    pub wdt_sign: String,
    /// All query parameters to transmit, both signatures included.
    pub query: CanonicalParams,
}

fn insert_gateway_pager(params: &mut CanonicalParams, pager: Option<&Pager>) {
    if let Some(pager) = pager {
        params.insert("calc_total", calc_total_flag(pager));
        params.insert("pager", ParamValue::Json(pager_fragment(pager)));
    }
}

/// Parameters covered by the inner (native secret) gateway signature.
#[must_use]
pub fn gateway_inner_params(input: &GatewayInput<'_>) -> CanonicalParams {
    let mut params = CanonicalParams::new();
    params.insert("method", input.method);
    params.insert("datetime", input.datetime);
    params.insert("wdt3_customer_id", input.customer_id);
    params.insert("wdt_salt", input.native_salt);
    params.insert("wdt_appkey", input.native_app_key);
    params.insert("params", ParamValue::Json(input.body.to_owned()));
    insert_gateway_pager(&mut params, input.pager.as_ref());
    params
}

#[must_use]
pub fn sign_gateway(input: &GatewayInput<'_>) -> GatewaySignature {
    let wdt_sign = digest(input.native_secret, &gateway_inner_params(input));

    let mut params = CanonicalParams::new();
    params.insert("app_key", input.gateway_app_key);
    params.insert("method", input.method);
    params.insert("format", GATEWAY_FORMAT);
    params.insert("v", GATEWAY_VERSION);
    params.insert("sign_method", GATEWAY_SIGN_METHOD);
    params.insert("target_app_key", input.target_app_key);
    params.insert("wdt3_customer_id", input.customer_id);
    params.insert("timestamp", input.datetime);
    params.insert("datetime", input.datetime);
    params.insert("wdt_salt", input.native_salt);
    params.insert("wdt_appkey", input.native_app_key);
    params.insert("params", ParamValue::Json(input.body.to_owned()));
    params.insert("wdt_sign", wdt_sign.clone());
    insert_gateway_pager(&mut params, input.pager.as_ref());

    let sign = digest(input.gateway_secret, &params).to_ascii_uppercase();
    params.insert("sign", sign.clone());

    GatewaySignature {
        sign,
        wdt_sign,
        query: params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"end_time":"2024-01-02 00:00:00","start_time":"2024-01-01 00:00:00"}"#;

    fn native() -> NativeInput<'static> {
        NativeInput {
            secret: "abc",
            salt: "xyz",
            sid: "sid001",
            app_key: "key001",
            version: "1.0",
            method: "order.query",
            timestamp: 100_000_000,
            body: "[{}]",
            pager: None,
        }
    }

    fn gateway() -> GatewayInput<'static> {
        GatewayInput {
            gateway_secret: "qmsecret",
            gateway_app_key: "qm001",
            target_app_key: "target001",
            customer_id: "sid001",
            native_secret: "abc",
            native_salt: "xyz",
            native_app_key: "key001",
            method: "wdt.order.query",
            datetime: "2024-01-01 12:00:00",
            body: BODY,
            pager: None,
        }
    }

    #[test]
    fn md5_hex_known_value() {
        assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn native_golden_vector() {
        let signed = sign_native(&native());
        assert_eq!(signed.sign, "e03105e8770edd4a382ddb559e225a90");
    }

    #[test]
    fn native_golden_vector_with_pager() {
        let input = NativeInput {
            pager: Some(Pager::new(20, 1).with_calc_total(true)),
            ..native()
        };
        let signed = sign_native(&input);
        assert_eq!(signed.sign, "0d2dd633acd310ead2f4ffe67147c945");
        assert_eq!(
            signed.query.get("calc_total"),
            Some(&ParamValue::Int(1)),
            "calc_total travels as 0/1"
        );
    }

    #[test]
    fn native_query_excludes_body_and_carries_sign() {
        let signed = sign_native(&native());
        let keys: Vec<_> = signed.query.to_query().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["key", "method", "salt", "sid", "sign", "timestamp", "v"]);
        assert_eq!(
            signed.query.get("sign"),
            Some(&ParamValue::Str(signed.sign.clone()))
        );
    }

    #[test]
    fn native_is_deterministic() {
        assert_eq!(sign_native(&native()), sign_native(&native()));
    }

    #[test]
    fn native_single_field_changes_alter_signature() {
        let base = sign_native(&native()).sign;
        let variants = [
            NativeInput {
                secret: "abd",
                ..native()
            },
            NativeInput {
                salt: "xyw",
                ..native()
            },
            NativeInput {
                sid: "sid002",
                ..native()
            },
            NativeInput {
                app_key: "key002",
                ..native()
            },
            NativeInput {
                version: "1.1",
                ..native()
            },
            NativeInput {
                method: "order.querz",
                ..native()
            },
            NativeInput {
                timestamp: 100_000_001,
                ..native()
            },
            NativeInput {
                body: r#"[{"a":1}]"#,
                ..native()
            },
            NativeInput {
                pager: Some(Pager::new(20, 0)),
                ..native()
            },
        ];
        for variant in variants {
            assert_ne!(sign_native(&variant).sign, base, "{variant:?}");
        }

        let sid002 = NativeInput {
            sid: "sid002",
            ..native()
        };
        assert_eq!(
            sign_native(&sid002).sign,
            "b9aefc5ee3cc664af626b9443a5b4bf5"
        );
    }

    #[test]
    fn native_pager_field_changes_alter_signature() {
        let pager = Pager::new(20, 1).with_calc_total(true);
        let paged = |pager| NativeInput {
            pager: Some(pager),
            ..native()
        };
        let base = sign_native(&paged(pager)).sign;
        let variants = [
            Pager::new(21, 1).with_calc_total(true),
            Pager::new(20, 2).with_calc_total(true),
            Pager::new(20, 1),
        ];
        for variant in variants {
            assert_ne!(sign_native(&paged(variant)).sign, base, "{variant:?}");
        }
    }

    #[test]
    fn adjacent_fields_do_not_collide() {
        // same bytes, moved from one field into another
        let a = NativeInput {
            sid: "ab",
            app_key: "c",
            ..native()
        };
        let b = NativeInput {
            sid: "a",
            app_key: "bc",
            ..native()
        };
        assert_ne!(sign_native(&a).sign, sign_native(&b).sign);
    }

    #[test]
    fn gateway_golden_vector() {
        let signed = sign_gateway(&gateway());
        assert_eq!(signed.wdt_sign, "d47f16abb74b06c95266bf7b1fb82250");
        assert_eq!(signed.sign, "70F8A8A4F9CA29F74CB0F78B96DCF31D");
    }

    #[test]
    fn gateway_golden_vector_with_pager() {
        let input = GatewayInput {
            pager: Some(Pager::new(50, 1).with_calc_total(true)),
            ..gateway()
        };
        let signed = sign_gateway(&input);
        assert_eq!(signed.wdt_sign, "e3fa7dc6684de5436a428c22a13bf434");
        assert_eq!(signed.sign, "95800BF653161D82C79481CCE4B45E6A");
        assert_eq!(
            signed.query.get("pager"),
            Some(&ParamValue::Json(r#"{"page_no":1,"page_size":50}"#.to_owned()))
        );
    }

    #[test]
    fn gateway_inner_matches_native_digest() {
        let input = gateway();
        let params = gateway_inner_params(&input);
        assert_eq!(
            sign_gateway(&input).wdt_sign,
            digest(input.native_secret, &params)
        );
    }

    #[test]
    fn gateway_outer_is_upper_hex() {
        let signed = sign_gateway(&gateway());
        assert_eq!(signed.sign.len(), 32);
        assert!(
            signed
                .sign
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
    }

    #[test]
    fn gateway_query_carries_everything() {
        let signed = sign_gateway(&gateway());
        let keys: Vec<_> = signed.query.to_query().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            [
                "app_key",
                "datetime",
                "format",
                "method",
                "params",
                "sign",
                "sign_method",
                "target_app_key",
                "timestamp",
                "v",
                "wdt3_customer_id",
                "wdt_appkey",
                "wdt_salt",
                "wdt_sign",
            ]
        );
    }

    #[test]
    fn gateway_secret_only_affects_outer() {
        let other = GatewayInput {
            gateway_secret: "other",
            ..gateway()
        };
        let (a, b) = (sign_gateway(&gateway()), sign_gateway(&other));
        assert_eq!(a.wdt_sign, b.wdt_sign);
        assert_ne!(a.sign, b.sign);
    }

    #[test]
    fn gateway_single_field_changes_alter_signatures() {
        let base = sign_gateway(&gateway());
        // fields under both signatures
        let nested = [
            GatewayInput {
                customer_id: "sid002",
                ..gateway()
            },
            GatewayInput {
                native_secret: "abd",
                ..gateway()
            },
            GatewayInput {
                native_salt: "xyw",
                ..gateway()
            },
            GatewayInput {
                native_app_key: "key002",
                ..gateway()
            },
            GatewayInput {
                method: "wdt.order.querz",
                ..gateway()
            },
            GatewayInput {
                datetime: "2024-01-01 12:00:01",
                ..gateway()
            },
            GatewayInput {
                body: r#"{"end_time":"2024-01-02 00:00:00"}"#,
                ..gateway()
            },
            GatewayInput {
                pager: Some(Pager::new(50, 1)),
                ..gateway()
            },
        ];
        for variant in nested {
            let signed = sign_gateway(&variant);
            assert_ne!(signed.wdt_sign, base.wdt_sign, "{variant:?}");
            assert_ne!(signed.sign, base.sign, "{variant:?}");
        }

        // gateway-only fields; the native secret is not covered by the outer digest
        let outer = [
            GatewayInput {
                gateway_app_key: "qm002",
                ..gateway()
            },
            GatewayInput {
                target_app_key: "target002",
                ..gateway()
            },
        ];
        for variant in outer {
            let signed = sign_gateway(&variant);
            assert_eq!(signed.wdt_sign, base.wdt_sign, "{variant:?}");
            assert_ne!(signed.sign, base.sign, "{variant:?}");
        }
    }

    #[test]
    fn gateway_pager_field_changes_alter_signatures() {
        let paged = |pager| GatewayInput {
            pager: Some(pager),
            ..gateway()
        };
        let base = sign_gateway(&paged(Pager::new(50, 1).with_calc_total(true)));
        let variants = [
            Pager::new(51, 1).with_calc_total(true),
            Pager::new(50, 2).with_calc_total(true),
            Pager::new(50, 1),
        ];
        for variant in variants {
            let signed = sign_gateway(&paged(variant));
            assert_ne!(signed.wdt_sign, base.wdt_sign, "{variant:?}");
            assert_ne!(signed.sign, base.sign, "{variant:?}");
        }
    }
}
