//! Type descriptors: the expected shape of one schema field.
use std::fmt;
use std::sync::Arc;

use crate::schema::Schema;

/// Which address family an ip-address scalar accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpFamily {
    Any,
    V4,
    V6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
    IpAddress(IpFamily),
    /// Passed through untouched.
    Opaque,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Scalar(ScalarKind),
    Optional(Box<Ty>),
    /// Alternatives are tried in order; the first that coerces wins.
    Union(Vec<Ty>),
    List(Box<Ty>),
    Nested(Arc<Schema>),
}

impl Ty {
    pub fn string() -> Self { Ty::Scalar(ScalarKind::String) }
    pub fn integer() -> Self { Ty::Scalar(ScalarKind::Integer) }
    pub fn float() -> Self { Ty::Scalar(ScalarKind::Float) }
    pub fn boolean() -> Self { Ty::Scalar(ScalarKind::Boolean) }
    pub fn timestamp() -> Self { Ty::Scalar(ScalarKind::Timestamp) }
    pub fn opaque() -> Self { Ty::Scalar(ScalarKind::Opaque) }
    pub fn ip(family: IpFamily) -> Self { Ty::Scalar(ScalarKind::IpAddress(family)) }

    /// `Optional(Optional(x))` collapses to `Optional(x)`.
    pub fn optional(inner: Ty) -> Self {
        match inner {
            Ty::Optional(_) => inner,
            other => Ty::Optional(Box::new(other)),
        }
    }

    pub fn union<I: IntoIterator<Item = Ty>>(alternatives: I) -> Self {
        Ty::Union(alternatives.into_iter().collect())
    }

    pub fn list(item: Ty) -> Self {
        Ty::List(Box::new(item))
    }

    pub fn nested(schema: &Arc<Schema>) -> Self {
        Ty::Nested(Arc::clone(schema))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Ty::Optional(_))
    }

    /// Structural well-formedness: no `Optional` directly inside `Optional`,
    /// no empty `Union`. Nested schemas were checked when they were built.
    pub(crate) fn check(&self) -> Result<(), &'static str> {
        match self {
            Ty::Scalar(_) | Ty::Nested(_) => Ok(()),
            Ty::Optional(inner) => {
                if inner.is_optional() {
                    return Err("Optional directly inside Optional");
                }
                inner.check()
            }
            Ty::Union(alts) => {
                if alts.is_empty() {
                    return Err("Union without alternatives");
                }
                alts.iter().try_for_each(Ty::check)
            }
            Ty::List(item) => item.check(),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Timestamp => "timestamp",
            ScalarKind::IpAddress(IpFamily::Any) => "ip-address",
            ScalarKind::IpAddress(IpFamily::V4) => "ipv4-address",
            ScalarKind::IpAddress(IpFamily::V6) => "ipv6-address",
            ScalarKind::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Scalar(kind) => write!(f, "{kind}"),
            Ty::Optional(inner) => write!(f, "Optional[{inner}]"),
            Ty::Union(alts) => {
                f.write_str("Union[")?;
                for (i, alt) in alts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{alt}")?;
                }
                f.write_str("]")
            }
            Ty::List(item) => write!(f, "List[{item}]"),
            Ty::Nested(schema) => f.write_str(schema.name()),
        }
    }
}
