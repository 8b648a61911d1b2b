//! Decoded field values.
use std::net::IpAddr;

use ordered_float::OrderedFloat;
use serde_json::Value;

use crate::codec::Timestamp;
use crate::record::Record;

/// A value that passed coercion against its field's `Ty`.
/// Absence is represented by the field not being stored at all.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(OrderedFloat<f64>),
    Boolean(bool),
    Timestamp(Timestamp),
    Ip(IpAddr),
    Opaque(Value),
    List(Vec<FieldValue>),
    Record(Record),
    /// An absent element inside a list; fields never hold it.
    Null,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self { FieldValue::String(s) => Some(s), _ => None }
    }
    pub fn as_i64(&self) -> Option<i64> {
        match self { FieldValue::Integer(i) => Some(*i), _ => None }
    }
    /// Integers widen to `f64` here.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(f.0),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self { FieldValue::Boolean(b) => Some(*b), _ => None }
    }
    pub fn as_timestamp(&self) -> Option<&Timestamp> {
        match self { FieldValue::Timestamp(t) => Some(t), _ => None }
    }
    pub fn as_ip(&self) -> Option<&IpAddr> {
        match self { FieldValue::Ip(ip) => Some(ip), _ => None }
    }
    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self { FieldValue::List(xs) => Some(xs), _ => None }
    }
    pub fn as_record(&self) -> Option<&Record> {
        match self { FieldValue::Record(r) => Some(r), _ => None }
    }

    /// True for anything that is neither a list nor a nested record.
    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldValue::List(_) | FieldValue::Record(_))
    }
}
