//! Element types and scalar values carried by array payloads and properties.

use ndx_error::{NdxError, Result};

/// Element type of an array payload or a property value sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
}

impl DataType {
    /// Size of one element in bytes. `None` for `String`, which has no
    /// fixed element size and cannot back a strided payload.
    pub const fn size_in_bytes(self) -> Option<usize> {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => Some(1),
            Self::Int16 | Self::UInt16 => Some(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => Some(4),
            Self::Int64 | Self::UInt64 | Self::Float64 => Some(8),
            Self::String => None,
        }
    }

    /// Stable name used when persisting the type.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "i8",
            Self::Int16 => "i16",
            Self::Int32 => "i32",
            Self::Int64 => "i64",
            Self::UInt8 => "u8",
            Self::UInt16 => "u16",
            Self::UInt32 => "u32",
            Self::UInt64 => "u64",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
            Self::String => "string",
        }
    }

    /// Parse a persisted type name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "bool" => Ok(Self::Bool),
            "i8" => Ok(Self::Int8),
            "i16" => Ok(Self::Int16),
            "i32" => Ok(Self::Int32),
            "i64" => Ok(Self::Int64),
            "u8" => Ok(Self::UInt8),
            "u16" => Ok(Self::UInt16),
            "u32" => Ok(Self::UInt32),
            "u64" => Ok(Self::UInt64),
            "f32" => Ok(Self::Float32),
            "f64" => Ok(Self::Float64),
            "string" => Ok(Self::String),
            other => Err(NdxError::corrupt(format!("unknown data type: {other}"))),
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One scalar value of a property or array element.
///
/// Narrow integer and float element types widen to `Int64`/`Float64` when
/// read back through this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Str(String),
}

impl Value {
    /// The declared type this value carries.
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Bool,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::Str(_) => DataType::String,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_sizes() {
        assert_eq!(DataType::Bool.size_in_bytes(), Some(1));
        assert_eq!(DataType::Int16.size_in_bytes(), Some(2));
        assert_eq!(DataType::Float32.size_in_bytes(), Some(4));
        assert_eq!(DataType::Int64.size_in_bytes(), Some(8));
        assert_eq!(DataType::String.size_in_bytes(), None);
    }

    #[test]
    fn name_roundtrip() {
        for dtype in [
            DataType::Bool,
            DataType::Int8,
            DataType::Int16,
            DataType::Int32,
            DataType::Int64,
            DataType::UInt8,
            DataType::UInt16,
            DataType::UInt32,
            DataType::UInt64,
            DataType::Float32,
            DataType::Float64,
            DataType::String,
        ] {
            assert_eq!(DataType::from_name(dtype.name()).unwrap(), dtype);
        }
    }

    #[test]
    fn unknown_name_is_corrupt() {
        let err = DataType::from_name("complex128").unwrap_err();
        assert!(matches!(err, NdxError::Corrupt { .. }));
    }

    #[test]
    fn value_data_type() {
        assert_eq!(Value::Bool(true).data_type(), DataType::Bool);
        assert_eq!(Value::Int64(1).data_type(), DataType::Int64);
        assert_eq!(Value::Float64(1.5).data_type(), DataType::Float64);
        assert_eq!(Value::Str("mV".to_owned()).data_type(), DataType::String);
    }
}
