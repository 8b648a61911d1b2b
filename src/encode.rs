//! `Record` trees → raw JSON, in schema declaration order.
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::codec;
use crate::record::Record;
use crate::value::FieldValue;

/// Absent fields are omitted entirely.
pub fn encode(record: &Record) -> Map<String, Value> {
    record
        .iter()
        .map(|(def, value)| (def.name().to_string(), encode_value(value)))
        .collect()
}

pub fn encode_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::String(s) => Value::String(s.clone()),
        FieldValue::Integer(i) => Value::from(*i),
        // decoded floats came from JSON and are finite
        FieldValue::Float(f) => Number::from_f64(f.0).map(Value::Number).unwrap_or(Value::Null),
        FieldValue::Boolean(b) => Value::Bool(*b),
        FieldValue::Timestamp(ts) => Value::String(codec::timestamp::encode(ts)),
        FieldValue::Ip(ip) => Value::String(codec::ip::encode(ip)),
        FieldValue::Opaque(raw) => raw.clone(),
        FieldValue::List(xs) => Value::Array(xs.iter().map(encode_value).collect()),
        FieldValue::Record(record) => Value::Object(encode(record)),
        FieldValue::Null => Value::Null,
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode(self).serialize(serializer)
    }
}
