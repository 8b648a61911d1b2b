//! Schema-driven coercion between raw JSON and validated HTTP Archive (HAR)
//! records.
//!
//! `decode` turns a JSON mapping into a `Record` tree against a `Schema`,
//! collecting non-fatal `Diagnostic`s on the way; `encode` turns it back.
//! The HAR 1.2 tables live in [`har`].
pub mod codec;
pub mod decode;
pub mod encode;
pub mod error;
pub mod har;
pub mod record;
pub mod schema;
pub mod ty;
pub mod value;

pub use decode::{coerce_value, decode, Decoded, DecodeFailure, Diagnostic, DiagnosticKind, Diagnostics};
pub use encode::{encode, encode_value};
pub use error::{DecodeError, SchemaError};
pub use record::{Flatten, Record, RecordBuilder};
pub use schema::{FieldDef, Schema, SchemaBuilder};
pub use ty::{IpFamily, ScalarKind, Ty};
pub use value::FieldValue;
