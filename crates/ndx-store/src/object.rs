use serde::{Deserialize, Serialize};

/// A scalar or vector attribute value attached to a group.
///
/// The closed set of shapes the store knows how to persist. Typed accessors
/// return `None` on a shape mismatch; callers that require a shape decide
/// how to report that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// A UTF-8 string.
    Str(String),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit IEEE 754 floating-point number.
    Float(f64),
    /// A boolean.
    Bool(bool),
    /// An ordered sequence of strings.
    StrVec(Vec<String>),
    /// An ordered sequence of integers.
    IntVec(Vec<i64>),
    /// An ordered sequence of floats.
    FloatVec(Vec<f64>),
    /// An ordered sequence of booleans.
    BoolVec(Vec<bool>),
}

impl AttrValue {
    /// The string payload, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Int`.
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The float payload, if this is a `Float`.
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The boolean payload, if this is a `Bool`.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The string-vector payload, if this is a `StrVec`.
    pub fn as_str_vec(&self) -> Option<&[String]> {
        match self {
            Self::StrVec(v) => Some(v),
            _ => None,
        }
    }

    /// The int-vector payload, if this is an `IntVec`.
    pub fn as_int_vec(&self) -> Option<&[i64]> {
        match self {
            Self::IntVec(v) => Some(v),
            _ => None,
        }
    }

    /// The float-vector payload, if this is a `FloatVec`.
    pub fn as_float_vec(&self) -> Option<&[f64]> {
        match self {
            Self::FloatVec(v) => Some(v),
            _ => None,
        }
    }

    /// The bool-vector payload, if this is a `BoolVec`.
    pub fn as_bool_vec(&self) -> Option<&[bool]> {
        match self {
            Self::BoolVec(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// A raw N-dimensional payload stored under a group, keyed by name.
///
/// The store does not interpret `dtype` or `bytes`; it round-trips them.
/// The `ndx` crate owns the element encoding and the stride math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    /// Element type name as declared by the writer.
    pub dtype: String,
    /// Per-axis extents, outermost first.
    pub extents: Vec<u64>,
    /// Flat row-major element bytes.
    pub bytes: Vec<u8>,
}
