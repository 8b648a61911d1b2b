//! HAR 1.2 record types, as declarative field tables.
//!
//! Field names and nesting follow the HAR 1.2 document layout exactly.
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::decode::{self, Decoded, DecodeFailure};
use crate::schema::{Schema, SchemaBuilder};
use crate::ty::{IpFamily, Ty};

/// Milliseconds: producers emit both integers and fractions.
fn number() -> Ty {
    Ty::union([Ty::integer(), Ty::float()])
}

fn table(builder: SchemaBuilder) -> Arc<Schema> {
    builder.build().expect("HAR schema tables are well-formed")
}

pub static CREATOR: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Creator")
        .required("name", Ty::string())
        .required("version", Ty::string())
        .optional("comment", Ty::string()),
));

pub static BROWSER: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Browser")
        .required("name", Ty::string())
        .required("version", Ty::string())
        .optional("comment", Ty::string()),
));

pub static PAGE_TIMINGS: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("PageTimings")
        .required("onContentLoad", number())
        .required("onLoad", number())
        .optional("comment", Ty::string()),
));

pub static PAGE: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Page")
        .required("startedDateTime", Ty::timestamp())
        .required("id", Ty::string())
        .required("title", Ty::string())
        .required("pageTimings", Ty::nested(&PAGE_TIMINGS))
        .optional("comment", Ty::string()),
));

pub static COOKIE: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Cookie")
        .required("name", Ty::string())
        .required("value", Ty::string())
        .optional("domain", Ty::string())
        .optional("expires", Ty::timestamp())
        .optional("httpOnly", Ty::boolean())
        .optional("secure", Ty::boolean())
        .optional("path", Ty::string())
        .optional("comment", Ty::string()),
));

pub static HEADER: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Header")
        .required("name", Ty::string())
        .required("value", Ty::string())
        .optional("comment", Ty::string()),
));

pub static QUERY_PARAM: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("QueryParam")
        .required("name", Ty::string())
        .optional("value", Ty::string())
        .optional("fileName", Ty::string())
        .optional("contentType", Ty::string())
        .optional("comment", Ty::string()),
));

pub static POST_DATA: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("PostData")
        .required("mimeType", Ty::string())
        .required("params", Ty::list(Ty::nested(&QUERY_PARAM)))
        .required("text", Ty::string())
        .optional("comment", Ty::string()),
));

pub static REQUEST: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Request")
        .required("method", Ty::string())
        .required("url", Ty::string())
        .required("httpVersion", Ty::string())
        .required("cookies", Ty::list(Ty::nested(&COOKIE)))
        .required("headers", Ty::list(Ty::nested(&HEADER)))
        .required("queryString", Ty::list(Ty::nested(&QUERY_PARAM)))
        .required("headersSize", Ty::integer())
        .required("bodySize", Ty::integer())
        .optional("postData", Ty::nested(&POST_DATA))
        .optional("comment", Ty::string()),
));

pub static CONTENT: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Content")
        .defaulted("size", Ty::integer(), json!(0))
        .defaulted("mimeType", Ty::string(), json!(""))
        .optional("compression", Ty::integer())
        .optional("text", Ty::string())
        .optional("encoding", Ty::string())
        .optional("comment", Ty::string()),
));

pub static RESPONSE: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Response")
        .required("status", Ty::integer())
        .required("statusText", Ty::string())
        .required("httpVersion", Ty::string())
        .required("cookies", Ty::list(Ty::nested(&COOKIE)))
        .required("headers", Ty::list(Ty::nested(&HEADER)))
        .required("content", Ty::nested(&CONTENT))
        .required("redirectURL", Ty::string())
        .required("bodySize", Ty::integer())
        .defaulted("headersSize", Ty::integer(), json!(-1))
        .optional("comment", Ty::string()),
));

pub static CACHE: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Cache")
        .optional("beforeRequest", Ty::opaque())
        .optional("afterRequest", Ty::opaque()),
));

pub static TIMINGS: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Timings")
        .optional("blocked", number())
        .optional("dns", number())
        .optional("connect", number())
        .optional("send", number())
        .optional("wait", number())
        .optional("receive", number())
        .optional("ssl", number())
        .optional("comment", Ty::string()),
));

pub static ENTRY: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Entry")
        .required("pageref", Ty::string())
        .required("startedDateTime", Ty::timestamp())
        .required("time", number())
        .required("request", Ty::nested(&REQUEST))
        .required("response", Ty::nested(&RESPONSE))
        .required("cache", Ty::nested(&CACHE))
        .required("timings", Ty::nested(&TIMINGS))
        .optional("connection", Ty::string())
        .optional("serverIPAddress", Ty::union([Ty::ip(IpFamily::V4), Ty::ip(IpFamily::V6)]))
        .optional("_securityState", Ty::string())
        .optional("comment", Ty::string()),
));

pub static LOG: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Log")
        .required("version", Ty::string())
        .required("creator", Ty::nested(&CREATOR))
        .optional("browser", Ty::nested(&BROWSER))
        .required("pages", Ty::list(Ty::nested(&PAGE)))
        .required("entries", Ty::list(Ty::nested(&ENTRY)))
        .optional("comment", Ty::string()),
));

/// The archive root: `{"log": {...}}`.
pub static HAR: Lazy<Arc<Schema>> = Lazy::new(|| table(
    Schema::builder("Har")
        .required("log", Ty::nested(&LOG)),
));

/// Every HAR record type, leaves first.
pub fn registry() -> [&'static Arc<Schema>; 16] {
    [
        &CREATOR, &BROWSER, &PAGE_TIMINGS, &PAGE, &COOKIE, &HEADER, &QUERY_PARAM, &POST_DATA,
        &REQUEST, &CONTENT, &RESPONSE, &CACHE, &TIMINGS, &ENTRY, &LOG, &HAR,
    ]
    .map(|schema| &**schema)
}

pub fn schema_named(name: &str) -> Option<&'static Arc<Schema>> {
    registry().into_iter().find(|schema| schema.name() == name)
}

/// Decode a whole archive (`{"log": ...}`).
pub fn decode_archive(raw: &Value) -> Result<Decoded, DecodeFailure> {
    decode::decode(&HAR, raw)
}

/// Registry as one JSON document, for inspection.
pub fn describe_registry() -> Value {
    Value::Array(registry().iter().map(|schema| schema.describe()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DiagnosticKind;
    use crate::encode::encode;
    use crate::error::DecodeError;
    use crate::value::FieldValue;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn every_table_builds() {
        let names: Vec<_> = registry().iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names.len(), 16);
        assert_eq!(names.last().map(String::as_str), Some("Har"));
        assert!(schema_named("Entry").is_some());
        assert!(schema_named("Nope").is_none());
    }

    #[test]
    fn creator_requires_version() {
        let failure = decode::decode(&CREATOR, &json!({"name": "Chrome"})).unwrap_err();
        assert!(matches!(failure.error, DecodeError::MissingRequiredField { .. }));

        let decoded = decode::decode(&CREATOR, &json!({"name": "Chrome", "version": "100"})).unwrap();
        assert_eq!(Value::Object(encode(&decoded.record)), json!({"name": "Chrome", "version": "100"}));
    }

    #[test]
    fn server_ip_prefers_v4() {
        let ty = ENTRY.descriptor_for("serverIPAddress").unwrap();
        let mut diags = decode::Diagnostics::new();
        let value = decode::coerce_value(ty, "serverIPAddress", &json!("192.168.1.1"), &mut diags).unwrap();
        assert_eq!(value, Some(FieldValue::Ip(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)))));
        assert!(diags.is_empty());
    }

    #[test]
    fn fractional_timings_are_accepted() {
        let decoded = decode::decode(&TIMINGS, &json!({"wait": 12.5, "send": 0})).unwrap();
        assert_eq!(decoded.record.get("wait").and_then(FieldValue::as_f64), Some(12.5));
        assert_eq!(decoded.record.get("send"), Some(&FieldValue::Integer(0)));
        // integer tried first for `wait`
        assert_eq!(decoded.diagnostics.of_kind(DiagnosticKind::UnionAlternative).count(), 1);
    }

    #[test]
    fn content_defaults_satisfy_completeness() {
        let decoded = decode::decode(&CONTENT, &json!({})).unwrap();
        assert!(decoded.record.is_empty());
        assert_eq!(
            decoded.record.get_or_default("mimeType").as_deref(),
            Some(&FieldValue::String(String::new()))
        );
    }

    #[test]
    fn describe_registry_lists_all_types() {
        let doc = describe_registry();
        assert_eq!(doc.as_array().map(Vec::len), Some(16));
        assert_eq!(doc[15]["fields"][0]["type"], "Log");
    }
}
