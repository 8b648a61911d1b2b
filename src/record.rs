//! Schema-bound containers of decoded values.
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::decode::{self, Decoded, DecodeFailure, Diagnostics};
use crate::encode;
use crate::error::DecodeError;
use crate::schema::{FieldDef, Schema};
use crate::value::FieldValue;

/// A fully validated record. Every required field holds a value; optional
/// fields that were null or never given are simply not stored.
#[derive(Clone, PartialEq)]
pub struct Record {
    schema: Arc<Schema>,
    values: IndexMap<String, FieldValue>,
}

/// What `Record::flatten` includes besides scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flatten {
    #[default]
    ScalarsOnly,
    /// Also include nested records and lists in raw form.
    WithNested,
}

impl Record {
    pub fn builder(schema: &Arc<Schema>) -> RecordBuilder {
        RecordBuilder {
            schema: Arc::clone(schema),
            values: IndexMap::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Completeness check shared by decode and the builder.
    pub(crate) fn assemble(
        schema: &Arc<Schema>,
        values: IndexMap<String, FieldValue>,
        prefix: &str,
    ) -> Result<Self, DecodeError> {
        if let Some(missing) = schema.required_fields().find(|f| !values.contains_key(f.name())) {
            return Err(DecodeError::MissingRequiredField {
                record: schema.name().to_string(),
                path: decode::join_path(prefix, missing.name()),
            });
        }
        Ok(Self { schema: Arc::clone(schema), values })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn record_type(&self) -> &str {
        self.schema.name()
    }

    /// Stored value, no coercion. `None` for absent optional fields and for
    /// names the schema does not declare.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Stored value, else the field's declared default coerced through its type.
    pub fn get_or_default(&self, name: &str) -> Option<Cow<'_, FieldValue>> {
        if let Some(value) = self.values.get(name) {
            return Some(Cow::Borrowed(value));
        }
        let def = self.schema.field(name)?;
        let default = def.default()?;
        let mut scratch = Diagnostics::new();
        decode::coerce_value(def.ty(), name, default, &mut scratch)
            .ok()
            .flatten()
            .map(Cow::Owned)
    }

    /// Coerce `raw` exactly as decode would and store it. Null on an optional
    /// field clears it. On error the record is left untouched.
    pub fn set(&mut self, name: &str, raw: &Value) -> Result<Diagnostics, DecodeError> {
        let def = self.schema.field(name).ok_or_else(|| DecodeError::UnknownField {
            record: self.schema.name().to_string(),
            field: name.to_string(),
        })?;
        let mut diagnostics = Diagnostics::new();
        match decode::coerce_value(def.ty(), name, raw, &mut diagnostics)? {
            Some(value) => {
                self.values.insert(name.to_string(), value);
            }
            None if def.is_required() => {
                return Err(DecodeError::MissingRequiredField {
                    record: self.schema.name().to_string(),
                    path: name.to_string(),
                });
            }
            None => {
                self.values.shift_remove(name);
            }
        }
        Ok(diagnostics)
    }

    /// Present fields in schema declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldDef, &FieldValue)> {
        self.schema
            .fields()
            .filter_map(|def| self.values.get(def.name()).map(|v| (def, v)))
    }

    /// Number of fields holding a value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Shallow raw view: scalars converted to JSON, nested records and lists
    /// only with `Flatten::WithNested`.
    pub fn flatten(&self, mode: Flatten) -> Map<String, Value> {
        self.iter()
            .filter(|(_, value)| mode == Flatten::WithNested || value.is_scalar())
            .map(|(def, value)| (def.name().to_string(), encode::encode_value(value)))
            .collect()
    }
}

// the schema is shared and large; show the type name only
impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.schema.name());
        for (def, value) in self.iter() {
            out.field(def.name(), value);
        }
        out.finish()
    }
}

/// Field-by-field construction; `build` applies the same completeness check
/// as decode, so a half-built record never escapes.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    schema: Arc<Schema>,
    values: IndexMap<String, FieldValue>,
    diagnostics: Diagnostics,
}

impl RecordBuilder {
    pub fn set(mut self, name: &str, raw: &Value) -> Result<Self, DecodeError> {
        let def = self.schema.field(name).ok_or_else(|| DecodeError::UnknownField {
            record: self.schema.name().to_string(),
            field: name.to_string(),
        })?;
        match decode::coerce_value(def.ty(), name, raw, &mut self.diagnostics)? {
            Some(value) => {
                self.values.insert(name.to_string(), value);
            }
            None => {
                self.values.shift_remove(name);
            }
        }
        Ok(self)
    }

    pub fn build(self) -> Result<Decoded, DecodeFailure> {
        match Record::assemble(&self.schema, self.values, "") {
            Ok(record) => Ok(Decoded { record, diagnostics: self.diagnostics }),
            Err(error) => Err(DecodeFailure { error, diagnostics: self.diagnostics }),
        }
    }
}
