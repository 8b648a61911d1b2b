use har_schema::codec::timestamp;
use har_schema::{encode, har, DecodeError, DiagnosticKind, FieldValue, Record};
use serde_json::{json, Value};

fn entry(pageref: &str, url: &str) -> Value {
    json!({
        "pageref": pageref,
        "startedDateTime": "2023-01-01T00:00:01.250+00:00",
        "time": 120,
        "request": {
            "method": "GET",
            "url": url,
            "httpVersion": "HTTP/1.1",
            "cookies": [{"name": "sid", "value": "abc", "httpOnly": true}],
            "headers": [{"name": "Accept", "value": "*/*"}],
            "queryString": [{"name": "q", "value": "rust"}],
            "headersSize": 150,
            "bodySize": 0
        },
        "response": {
            "status": 200,
            "statusText": "OK",
            "httpVersion": "HTTP/1.1",
            "cookies": [],
            "headers": [{"name": "Content-Type", "value": "text/html"}],
            "content": {"size": 1024, "mimeType": "text/html", "text": "<html></html>"},
            "redirectURL": "",
            "bodySize": 1024,
            "headersSize": 200
        },
        "cache": {},
        "timings": {"blocked": 0, "dns": -1, "connect": 15, "send": 1, "wait": 80, "receive": 24},
        "serverIPAddress": "192.168.1.1",
        "connection": "443"
    })
}

fn archive() -> Value {
    json!({
        "log": {
            "version": "1.2",
            "creator": {"name": "Firefox", "version": "120.0"},
            "browser": {"name": "Firefox", "version": "120.0"},
            "pages": [{
                "startedDateTime": "2023-01-01T00:00:00+00:00",
                "id": "page_1",
                "title": "Example",
                "pageTimings": {"onContentLoad": 300, "onLoad": 500}
            }],
            "entries": [
                entry("page_1", "https://example.com/a"),
                entry("page_1", "https://example.com/b"),
                entry("page_1", "https://example.com/c")
            ]
        }
    })
}

fn log_of(record: &Record) -> &Record {
    record.get("log").and_then(FieldValue::as_record).unwrap()
}

#[test]
fn archive_round_trips_exactly() {
    let input = archive();
    let decoded = har::decode_archive(&input).unwrap();
    assert!(decoded.diagnostics.is_empty(), "{:?}", decoded.diagnostics);
    assert_eq!(Value::Object(encode(&decoded.record)), input);
}

#[test]
fn unknown_fields_and_nulls_are_dropped_on_round_trip() {
    let mut input = archive();
    input["log"]["_exporter"] = json!("devtools");
    input["log"]["comment"] = Value::Null;
    input["log"]["entries"][1]["serverIPAddress"] = Value::Null;

    let decoded = har::decode_archive(&input).unwrap();
    let unknown: Vec<_> = decoded.diagnostics.of_kind(DiagnosticKind::UnknownField).collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].path, "log._exporter");

    let mut expected = archive();
    expected["log"]["entries"][1].as_object_mut().unwrap().remove("serverIPAddress");
    assert_eq!(Value::Object(encode(&decoded.record)), expected);
}

#[test]
fn entries_keep_order_and_count() {
    let decoded = har::decode_archive(&archive()).unwrap();
    let entries = log_of(&decoded.record).get("entries").and_then(FieldValue::as_list).unwrap();
    assert_eq!(entries.len(), 3);
    let urls: Vec<_> = entries
        .iter()
        .map(|e| {
            let request = e.as_record().unwrap().get("request").and_then(FieldValue::as_record).unwrap();
            request.get("url").and_then(FieldValue::as_str).unwrap().to_string()
        })
        .collect();
    assert_eq!(urls, ["https://example.com/a", "https://example.com/b", "https://example.com/c"]);

    let encoded = encode(&decoded.record);
    assert_eq!(encoded["log"]["entries"].as_array().map(Vec::len), Some(3));
    assert_eq!(encoded["log"]["entries"][2]["request"]["url"], "https://example.com/c");
}

#[test]
fn server_ip_decodes_as_v4() {
    let decoded = har::decode_archive(&archive()).unwrap();
    let first = log_of(&decoded.record).get("entries").and_then(FieldValue::as_list).unwrap()[0]
        .as_record()
        .unwrap()
        .get("serverIPAddress")
        .and_then(FieldValue::as_ip)
        .copied()
        .unwrap();
    assert!(first.is_ipv4());
}

#[test]
fn utc_designator_is_accepted_and_rewritten() {
    let mut input = archive();
    input["log"]["entries"][0]["startedDateTime"] = json!("2023-01-01T00:00:00Z");
    let decoded = har::decode_archive(&input).unwrap();
    let encoded = encode(&decoded.record);
    assert_eq!(encoded["log"]["entries"][0]["startedDateTime"], "2023-01-01T00:00:00+00:00");

    let first = log_of(&decoded.record).get("entries").and_then(FieldValue::as_list).unwrap()[0]
        .as_record()
        .unwrap()
        .get("startedDateTime")
        .and_then(FieldValue::as_timestamp)
        .copied()
        .unwrap();
    assert_eq!(first, timestamp::decode("2023-01-01T00:00:00+00:00").unwrap());
}

#[test]
fn decoding_is_idempotent() {
    let input = archive();
    let a = har::decode_archive(&input).unwrap();
    let b = har::decode_archive(&input).unwrap();
    assert_eq!(encode(&a.record), encode(&b.record));
    assert_eq!(a.record, b.record);
}

#[test]
fn missing_nested_field_fails_the_whole_archive() {
    let mut input = archive();
    input["log"]["entries"][2]["request"].as_object_mut().unwrap().remove("method");
    input["log"]["bogus"] = json!(1);

    let failure = har::decode_archive(&input).unwrap_err();
    match &failure.error {
        DecodeError::TypeMismatch { path, expected, .. } => {
            assert_eq!(path, "log.entries[2].request");
            assert_eq!(expected, "Request");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(failure.error.to_string().contains("log.entries[2].request.method"));
    // "bogus" sits after "entries" in the input, so decoding stopped before it
    assert!(failure.diagnostics.is_empty());
}

#[test]
fn unparseable_server_ip_is_dropped_not_fatal() {
    let mut input = archive();
    input["log"]["entries"][0]["serverIPAddress"] = json!("not-an-ip");
    let decoded = har::decode_archive(&input).unwrap();
    assert_eq!(decoded.diagnostics.of_kind(DiagnosticKind::UnionExhausted).count(), 1);
    assert_eq!(decoded.diagnostics.of_kind(DiagnosticKind::UnionAlternative).count(), 2);
    let encoded = encode(&decoded.record);
    assert!(encoded["log"]["entries"][0].get("serverIPAddress").is_none());
}

#[test]
fn patched_records_encode_the_new_value() {
    let decoded = har::decode_archive(&archive()).unwrap();
    let mut creator = log_of(&decoded.record).get("creator").and_then(FieldValue::as_record).cloned().unwrap();
    creator.set("comment", &json!("re-exported")).unwrap();
    assert!(creator.set("version", &json!(121)).is_err());
    assert_eq!(
        Value::Object(encode(&creator)),
        json!({"name": "Firefox", "version": "120.0", "comment": "re-exported"})
    );
}
