//! Per-record-type field tables.
//!
//! A `Schema` is built once, from an ordered list of field declarations, and
//! never changes afterwards. Declaration order drives encoding order and the
//! order in which missing required fields are reported.
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::SchemaError;
use crate::ty::Ty;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    name: String,
    ty: Ty,
    /// `Some(Value::Null)` for optional fields, `Some(x)` for declared
    /// defaults, `None` when the field is required.
    default: Option<Value>,
}

impl FieldDef {
    pub fn name(&self) -> &str { &self.name }
    pub fn ty(&self) -> &Ty { &self.ty }
    pub fn default(&self) -> Option<&Value> { self.default.as_ref() }
    pub fn has_default(&self) -> bool { self.default.is_some() }
    pub fn is_required(&self) -> bool { self.default.is_none() }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: IndexMap<String, FieldDef>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder { name: name.into(), fields: Vec::new() }
    }

    /// Record type name, used in error messages and `Ty` display.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = &FieldDef> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn descriptor_for(&self, name: &str) -> Option<&Ty> {
        self.fields.get(name).map(FieldDef::ty)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Required fields in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields().filter(|f| f.is_required())
    }

    /// JSON description of the table (name → ordered field list).
    pub fn describe(&self) -> Value {
        let fields = self
            .fields()
            .map(|f| {
                let mut o = serde_json::json!({
                    "name": f.name,
                    "type": f.ty.to_string(),
                    "required": f.is_required(),
                });
                if let Some(default) = f.default.as_ref().filter(|d| !d.is_null()) {
                    o["default"] = default.clone();
                }
                o
            })
            .collect::<Vec<_>>();
        serde_json::json!({ "name": self.name, "fields": fields })
    }
}

pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    /// A field with no default: decoding fails if it ends up without a value.
    pub fn required(self, name: &str, ty: Ty) -> Self {
        self.field(name, ty, None)
    }

    /// Wraps `ty` in `Optional` and defaults it to null.
    pub fn optional(self, name: &str, ty: Ty) -> Self {
        self.field(name, Ty::optional(ty), Some(Value::Null))
    }

    /// A field that may be omitted; `default` stands in for it.
    pub fn defaulted(self, name: &str, ty: Ty, default: Value) -> Self {
        self.field(name, ty, Some(default))
    }

    pub fn field(mut self, name: &str, ty: Ty, default: Option<Value>) -> Self {
        self.fields.push(FieldDef { name: name.to_string(), ty, default });
        self
    }

    pub fn build(self) -> Result<Arc<Schema>, SchemaError> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for def in self.fields {
            if let Err(reason) = def.ty.check() {
                return Err(SchemaError::MalformedType {
                    record: self.name,
                    field: def.name,
                    reason,
                });
            }
            if fields.contains_key(&def.name) {
                return Err(SchemaError::DuplicateField { record: self.name, field: def.name });
            }
            fields.insert(def.name.clone(), def);
        }
        Ok(Arc::new(Schema { name: self.name, fields }))
    }
}
