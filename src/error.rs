use thiserror::Error;

/// Fatal decode errors. Non-fatal findings are `Diagnostic`s instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("{record}: missing required field `{path}`")]
    MissingRequiredField { record: String, path: String },

    #[error("type mismatch at `{path}`: expected {expected}, {detail}")]
    TypeMismatch {
        path: String,
        expected: String,
        detail: String,
        #[source]
        cause: Option<Box<DecodeError>>,
    },

    /// Only raised by `Record::set`; decode turns unknown fields into diagnostics.
    #[error("{record}: unknown field `{field}`")]
    UnknownField { record: String, field: String },
}

impl DecodeError {
    pub fn path(&self) -> &str {
        match self {
            DecodeError::MissingRequiredField { path, .. } => path,
            DecodeError::TypeMismatch { path, .. } => path,
            DecodeError::UnknownField { field, .. } => field,
        }
    }

    pub(crate) fn mismatch(path: &str, expected: impl ToString, detail: impl Into<String>) -> Self {
        DecodeError::TypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            detail: detail.into(),
            cause: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{record}: field `{field}` declared twice")]
    DuplicateField { record: String, field: String },

    #[error("{record}: field `{field}` has a malformed type ({reason})")]
    MalformedType { record: String, field: String, reason: &'static str },
}
