//! Raw JSON → `Record` trees.
//!
//! Recursive descent over the schema's `Ty`s. Fatal problems are returned as
//! `DecodeError`; everything that is dropped or swallowed on the way is
//! collected as a `Diagnostic` and handed back with the result.
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::codec;
use crate::error::DecodeError;
use crate::record::Record;
use crate::schema::Schema;
use crate::ty::{ScalarKind, Ty};
use crate::value::FieldValue;

// ————————————————————————————————————————————————————————————————————————————
// DIAGNOSTICS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Present in the input, not declared by the schema.
    UnknownField,
    /// One union alternative failed; a later one may still have matched.
    UnionAlternative,
    /// No union alternative matched; the field was left without a value.
    UnionExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub path: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self { Self::default() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> { self.0.iter() }
    pub fn into_vec(self) -> Vec<Diagnostic> { self.0 }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(move |d| d.kind == kind)
    }

    pub(crate) fn push(&mut self, kind: DiagnosticKind, path: &str, message: String) {
        self.0.push(Diagnostic { kind, path: path.to_string(), message });
    }

    pub(crate) fn append(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;
    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;
    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

// ————————————————————————————————————————————————————————————————————————————
// RESULTS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub record: Record,
    pub diagnostics: Diagnostics,
}

/// No record, the first fatal cause, and whatever was diagnosed before it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct DecodeFailure {
    pub error: DecodeError,
    pub diagnostics: Diagnostics,
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

/// Decode one raw mapping against `schema`.
pub fn decode(schema: &Arc<Schema>, raw: &Value) -> Result<Decoded, DecodeFailure> {
    let mut diagnostics = Diagnostics::new();
    let result = match raw {
        Value::Object(map) => decode_map(schema, "", map, &mut diagnostics),
        other => Err(DecodeError::mismatch(
            "$",
            schema.name(),
            format!("found {}", json_kind(other)),
        )),
    };
    match result {
        Ok(record) => Ok(Decoded { record, diagnostics }),
        Err(error) => Err(DecodeFailure { error, diagnostics }),
    }
}

pub(crate) fn decode_map(
    schema: &Arc<Schema>,
    prefix: &str,
    map: &Map<String, Value>,
    diags: &mut Diagnostics,
) -> Result<Record, DecodeError> {
    let mut values = IndexMap::with_capacity(map.len());
    for (name, raw) in map {
        let path = join_path(prefix, name);
        let Some(def) = schema.field(name) else {
            tracing::debug!(%path, record = schema.name(), "dropping unknown field");
            diags.push(
                DiagnosticKind::UnknownField,
                &path,
                format!("unknown field `{name}` dropped ({} declares no such field)", schema.name()),
            );
            continue;
        };
        if let Some(value) = coerce_value(def.ty(), &path, raw, diags)? {
            values.insert(name.clone(), value);
        }
    }
    Record::assemble(schema, values, prefix)
}

/// Coerce one raw value against `ty`. `Ok(None)` means the field ends up
/// without a value (null under `Optional`, or an exhausted `Union`).
pub fn coerce_value(
    ty: &Ty,
    path: &str,
    raw: &Value,
    diags: &mut Diagnostics,
) -> Result<Option<FieldValue>, DecodeError> {
    match ty {
        Ty::Scalar(kind) => coerce_scalar(*kind, path, raw).map(Some),
        Ty::Optional(inner) => {
            if raw.is_null() {
                Ok(None)
            } else {
                coerce_value(inner, path, raw, diags)
            }
        }
        Ty::Union(alternatives) => coerce_union(ty, alternatives, path, raw, diags),
        Ty::List(item) => {
            let Value::Array(elements) = raw else {
                return Err(DecodeError::mismatch(path, ty, format!("found {}", json_kind(raw))));
            };
            let mut out = Vec::with_capacity(elements.len());
            for (i, element) in elements.iter().enumerate() {
                let element_path = format!("{path}[{i}]");
                let value = coerce_value(item, &element_path, element, diags)?;
                out.push(value.unwrap_or(FieldValue::Null));
            }
            Ok(Some(FieldValue::List(out)))
        }
        Ty::Nested(schema) => {
            let Value::Object(map) = raw else {
                return Err(DecodeError::mismatch(path, ty, format!("found {}", json_kind(raw))));
            };
            tracing::trace!(%path, record = schema.name(), "decoding nested record");
            match decode_map(schema, path, map, diags) {
                Ok(record) => Ok(Some(FieldValue::Record(record))),
                // already a mismatch, with a more precise path
                Err(err @ DecodeError::TypeMismatch { .. }) => Err(err),
                Err(err) => Err(DecodeError::TypeMismatch {
                    path: path.to_string(),
                    expected: schema.name().to_string(),
                    detail: format!("invalid nested record: {err}"),
                    cause: Some(Box::new(err)),
                }),
            }
        }
    }
}

fn coerce_union(
    ty: &Ty,
    alternatives: &[Ty],
    path: &str,
    raw: &Value,
    diags: &mut Diagnostics,
) -> Result<Option<FieldValue>, DecodeError> {
    for (i, alternative) in alternatives.iter().enumerate() {
        // diagnostics of a rejected alternative are discarded with it
        let mut scratch = Diagnostics::new();
        match coerce_value(alternative, path, raw, &mut scratch) {
            Ok(value) => {
                diags.append(scratch);
                return Ok(value);
            }
            Err(err) => {
                tracing::trace!(%path, alternative = %alternative, "union alternative rejected");
                diags.push(
                    DiagnosticKind::UnionAlternative,
                    path,
                    format!("alternative #{} ({alternative}) rejected: {err}", i + 1),
                );
            }
        }
    }
    tracing::debug!(%path, %ty, "no union alternative matched, dropping value");
    diags.push(
        DiagnosticKind::UnionExhausted,
        path,
        format!("no alternative of {ty} matched; value dropped"),
    );
    Ok(None)
}

fn coerce_scalar(kind: ScalarKind, path: &str, raw: &Value) -> Result<FieldValue, DecodeError> {
    let found = || format!("found {}", json_kind(raw));
    let value = match (kind, raw) {
        (ScalarKind::Opaque, v) => FieldValue::Opaque(v.clone()),
        (ScalarKind::String, Value::String(s)) => FieldValue::String(s.clone()),
        (ScalarKind::Boolean, Value::Bool(b)) => FieldValue::Boolean(*b),
        (ScalarKind::Integer, Value::Number(n)) if !n.is_f64() => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => return Err(DecodeError::mismatch(path, kind, format!("{n} is out of range"))),
        },
        (ScalarKind::Float, Value::Number(n)) if n.is_f64() => match n.as_f64() {
            Some(f) => FieldValue::Float(f.into()),
            None => return Err(DecodeError::mismatch(path, kind, found())),
        },
        (ScalarKind::Timestamp, Value::String(s)) => match codec::timestamp::decode(s) {
            Ok(ts) => FieldValue::Timestamp(ts),
            Err(err) => {
                return Err(DecodeError::mismatch(path, kind, format!("cannot parse {s:?}: {err}")));
            }
        },
        (ScalarKind::IpAddress(family), Value::String(s)) => match codec::ip::decode(s, family) {
            Ok(ip) => FieldValue::Ip(ip),
            Err(err) => {
                return Err(DecodeError::mismatch(path, kind, format!("cannot parse {s:?}: {err}")));
            }
        },
        _ => return Err(DecodeError::mismatch(path, kind, found())),
    };
    Ok(value)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::IpFamily;
    use serde_json::json;
    use std::net::{IpAddr, Ipv4Addr};

    fn creator() -> Arc<Schema> {
        Schema::builder("Creator")
            .required("name", Ty::string())
            .required("version", Ty::string())
            .optional("comment", Ty::string())
            .build()
            .unwrap()
    }

    fn coerce(ty: &Ty, raw: Value) -> (Result<Option<FieldValue>, DecodeError>, Diagnostics) {
        let mut diags = Diagnostics::new();
        let out = coerce_value(ty, "f", &raw, &mut diags);
        (out, diags)
    }

    #[test]
    fn scalar_kinds_must_match_exactly() {
        assert_eq!(coerce(&Ty::integer(), json!(3)).0, Ok(Some(FieldValue::Integer(3))));
        assert!(coerce(&Ty::integer(), json!(3.5)).0.is_err());
        assert!(coerce(&Ty::integer(), json!(true)).0.is_err());
        assert!(coerce(&Ty::float(), json!(3)).0.is_err());
        assert_eq!(coerce(&Ty::float(), json!(3.5)).0, Ok(Some(FieldValue::Float(3.5.into()))));
        assert!(coerce(&Ty::string(), json!(1)).0.is_err());
        assert!(coerce(&Ty::boolean(), json!("true")).0.is_err());
    }

    #[test]
    fn mismatch_names_path_and_kinds() {
        let err = coerce(&Ty::integer(), json!("12")).0.unwrap_err();
        assert_eq!(err.path(), "f");
        assert_eq!(err.to_string(), "type mismatch at `f`: expected integer, found string");
    }

    #[test]
    fn opaque_passes_anything_through() {
        let raw = json!({"nested": [1, "two", null]});
        assert_eq!(coerce(&Ty::opaque(), raw.clone()).0, Ok(Some(FieldValue::Opaque(raw))));
    }

    #[test]
    fn optional_null_is_absent() {
        let ty = Ty::optional(Ty::string());
        assert_eq!(coerce(&ty, Value::Null).0, Ok(None));
        assert!(coerce(&ty, json!(5)).0.is_err());
    }

    #[test]
    fn union_first_success_wins_in_declared_order() {
        let ty = Ty::optional(Ty::union([Ty::ip(IpFamily::V4), Ty::ip(IpFamily::V6)]));
        let (out, diags) = coerce(&ty, json!("192.168.1.1"));
        assert_eq!(out, Ok(Some(FieldValue::Ip(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))))));
        assert!(diags.is_empty());

        let (out, diags) = coerce(&ty, json!("::1"));
        assert!(out.unwrap().unwrap().as_ip().unwrap().is_ipv6());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().kind, DiagnosticKind::UnionAlternative);
    }

    #[test]
    fn exhausted_union_drops_the_value_with_diagnostics() {
        let ty = Ty::union([Ty::integer(), Ty::float()]);
        let (out, diags) = coerce(&ty, json!("soon"));
        assert_eq!(out, Ok(None));
        assert_eq!(diags.of_kind(DiagnosticKind::UnionAlternative).count(), 2);
        assert_eq!(diags.of_kind(DiagnosticKind::UnionExhausted).count(), 1);
    }

    #[test]
    fn list_elements_carry_their_index() {
        let ty = Ty::list(Ty::integer());
        let (out, _) = coerce(&ty, json!([1, 2, 3]));
        assert_eq!(out.unwrap().unwrap().as_list().map(<[_]>::len), Some(3));

        let err = coerce(&ty, json!([1, "x", 3])).0.unwrap_err();
        assert_eq!(err.path(), "f[1]");
        assert!(coerce(&ty, json!({"0": 1})).0.is_err());
    }

    #[test]
    fn list_keeps_count_with_absent_elements() {
        let ty = Ty::list(Ty::optional(Ty::integer()));
        let out = coerce(&ty, json!([1, null])).0.unwrap().unwrap();
        assert_eq!(out, FieldValue::List(vec![FieldValue::Integer(1), FieldValue::Null]));
    }

    #[test]
    fn decode_requires_all_required_fields() {
        let failure = decode(&creator(), &json!({"name": "Chrome"})).unwrap_err();
        assert!(matches!(
            failure.error,
            DecodeError::MissingRequiredField { ref path, .. } if path == "version"
        ));
    }

    #[test]
    fn unknown_fields_become_diagnostics() {
        let decoded = decode(&creator(), &json!({"name": "Chrome", "version": "100", "bogus": 1})).unwrap();
        assert_eq!(decoded.diagnostics.len(), 1);
        let diag = decoded.diagnostics.iter().next().unwrap();
        assert_eq!(diag.kind, DiagnosticKind::UnknownField);
        assert!(diag.message.contains("bogus"));
        assert!(decoded.record.get("bogus").is_none());
    }

    #[test]
    fn nested_failures_surface_as_mismatch_on_the_outer_field() {
        let creator = creator();
        let log = Schema::builder("Log")
            .required("creator", Ty::nested(&creator))
            .build()
            .unwrap();
        let failure = decode(&log, &json!({"creator": {"name": "x"}})).unwrap_err();
        match failure.error {
            DecodeError::TypeMismatch { path, expected, cause, .. } => {
                assert_eq!(path, "creator");
                assert_eq!(expected, "Creator");
                assert_eq!(cause.unwrap().path(), "creator.version");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failure_keeps_diagnostics_collected_so_far() {
        let failure = decode(&creator(), &json!({"bogus": true, "name": 1})).unwrap_err();
        assert!(matches!(failure.error, DecodeError::TypeMismatch { .. }));
        assert_eq!(failure.diagnostics.len(), 1);
    }

    #[test]
    fn root_must_be_an_object() {
        let failure = decode(&creator(), &json!(["Chrome", "100"])).unwrap_err();
        assert_eq!(failure.error.path(), "$");
    }
}
