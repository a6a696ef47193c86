//! Row-major strided view over a flat byte buffer.
//!
//! `NdArray` is a pure value type: it owns its bytes and never touches the
//! store. Persistence wraps it into a [`ndx_store::DataSet`] and back.
//!
//! Offset arithmetic guards against integer overflow only. Per-axis bounds
//! are the caller's responsibility; a coordinate inside the allocation but
//! past an axis extent addresses another row rather than failing.

use ndx_error::{NdxError, Result};
use ndx_store::DataSet;

use crate::value::{DataType, Value};

/// An N-dimensional array of fixed-size elements.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    dtype: DataType,
    extents: Vec<u64>,
    strides: Vec<u64>,
    data: Vec<u8>,
}

/// Row-major strides for the given extents. Last axis varies fastest.
fn compute_strides(extents: &[u64]) -> Result<Vec<u64>> {
    let mut strides = vec![1_u64; extents.len()];
    for i in (0..extents.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1]
            .checked_mul(extents[i + 1])
            .ok_or(NdxError::AllocationOverflow)?;
    }
    Ok(strides)
}

fn element_count(extents: &[u64]) -> Result<u64> {
    extents
        .iter()
        .try_fold(1_u64, |acc, &e| acc.checked_mul(e))
        .ok_or(NdxError::AllocationOverflow)
}

impl NdArray {
    /// Allocate a zero-filled array.
    ///
    /// Fails with `AllocationOverflow` when the byte size does not fit the
    /// addressable domain, and with `TypeMismatch` for element types
    /// without a fixed size.
    pub fn allocate(dtype: DataType, extents: Vec<u64>) -> Result<Self> {
        let elem_size = dtype
            .size_in_bytes()
            .ok_or_else(|| NdxError::type_mismatch("fixed-size data type", dtype.name()))?;
        let count = element_count(&extents)?;
        let byte_len = count
            .checked_mul(elem_size as u64)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(NdxError::AllocationOverflow)?;
        let strides = compute_strides(&extents)?;
        Ok(Self {
            dtype,
            extents,
            strides,
            data: vec![0; byte_len],
        })
    }

    /// Rebuild from a persisted payload.
    pub fn from_parts(dtype: DataType, extents: Vec<u64>, data: Vec<u8>) -> Result<Self> {
        let elem_size = dtype
            .size_in_bytes()
            .ok_or_else(|| NdxError::type_mismatch("fixed-size data type", dtype.name()))?;
        let count = element_count(&extents)?;
        let expected = count
            .checked_mul(elem_size as u64)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(NdxError::AllocationOverflow)?;
        if data.len() != expected {
            return Err(NdxError::corrupt(format!(
                "payload is {} bytes, extents require {expected}",
                data.len()
            )));
        }
        let strides = compute_strides(&extents)?;
        Ok(Self {
            dtype,
            extents,
            strides,
            data,
        })
    }

    /// Rebuild from a stored dataset.
    pub fn from_dataset(ds: DataSet) -> Result<Self> {
        Self::from_parts(DataType::from_name(&ds.dtype)?, ds.extents, ds.bytes)
    }

    /// Convert into a storable dataset.
    pub fn into_dataset(self) -> DataSet {
        DataSet {
            dtype: self.dtype.name().to_owned(),
            extents: self.extents,
            bytes: self.data,
        }
    }

    pub const fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn extents(&self) -> &[u64] {
        &self.extents
    }

    pub fn strides(&self) -> &[u64] {
        &self.strides
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> u64 {
        // Extents were overflow-checked at allocation.
        self.extents.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The raw element bytes, row-major, little-endian.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Flat element offset for a logical coordinate.
    ///
    /// Fails with `RankMismatch` on a wrong-length coordinate and with
    /// `OffsetOverflow` when the dot product leaves the addressable domain.
    /// Per-axis range is deliberately not checked.
    pub fn offset(&self, coord: &[u64]) -> Result<u64> {
        if coord.len() != self.strides.len() {
            return Err(NdxError::RankMismatch {
                expected: self.strides.len(),
                actual: coord.len(),
            });
        }
        coord
            .iter()
            .zip(&self.strides)
            .try_fold(0_u64, |acc, (&c, &s)| {
                c.checked_mul(s).and_then(|term| acc.checked_add(term))
            })
            .ok_or(NdxError::OffsetOverflow)
    }

    /// Replace extents and reallocate. Old contents are discarded.
    pub fn resize(&mut self, new_extents: Vec<u64>) -> Result<()> {
        *self = Self::allocate(self.dtype, new_extents)?;
        Ok(())
    }

    fn byte_range(&self, coord: &[u64]) -> Result<std::ops::Range<usize>> {
        // Construction rejects variable-size dtypes, so the size is always
        // present.
        let elem_size = self.dtype.size_in_bytes().unwrap_or(0);
        let start = self
            .offset(coord)?
            .checked_mul(elem_size as u64)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(NdxError::OffsetOverflow)?;
        let end = start
            .checked_add(elem_size)
            .ok_or(NdxError::OffsetOverflow)?;
        if end > self.data.len() {
            return Err(NdxError::OffsetOverflow);
        }
        Ok(start..end)
    }

    /// Read the element at `coord`, widening to 64-bit.
    ///
    /// Unsigned 64-bit elements are returned through `Value::Int64`;
    /// values above `i64::MAX` wrap. The stored bytes stay exact, only
    /// this widened view is lossy.
    pub fn get(&self, coord: &[u64]) -> Result<Value> {
        let range = self.byte_range(coord)?;
        let bytes = &self.data[range];
        let value = match self.dtype {
            DataType::Bool => Value::Bool(bytes[0] != 0),
            DataType::Int8 => Value::Int64(i64::from(bytes[0] as i8)),
            DataType::UInt8 => Value::Int64(i64::from(bytes[0])),
            DataType::Int16 => Value::Int64(i64::from(i16::from_le_bytes([bytes[0], bytes[1]]))),
            DataType::UInt16 => Value::Int64(i64::from(u16::from_le_bytes([bytes[0], bytes[1]]))),
            DataType::Int32 => Value::Int64(i64::from(i32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]))),
            DataType::UInt32 => Value::Int64(i64::from(u32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]))),
            DataType::Int64 => Value::Int64(i64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ])),
            DataType::UInt64 => Value::Int64(u64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]) as i64),
            DataType::Float32 => Value::Float64(f64::from(f32::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ]))),
            DataType::Float64 => Value::Float64(f64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ])),
            DataType::String => {
                return Err(NdxError::type_mismatch("fixed-size data type", "string"))
            }
        };
        Ok(value)
    }

    /// Write the element at `coord`, narrowing from the 64-bit value.
    ///
    /// The value must belong to the element type's family (integer, float
    /// or bool); narrowing to a smaller element truncates.
    pub fn set(&mut self, coord: &[u64], value: &Value) -> Result<()> {
        let range = self.byte_range(coord)?;
        let encoded: Vec<u8> = match (self.dtype, value) {
            (DataType::Bool, Value::Bool(b)) => vec![u8::from(*b)],
            (DataType::Int8 | DataType::UInt8, Value::Int64(v)) => vec![*v as u8],
            (DataType::Int16 | DataType::UInt16, Value::Int64(v)) => {
                (*v as u16).to_le_bytes().to_vec()
            }
            (DataType::Int32 | DataType::UInt32, Value::Int64(v)) => {
                (*v as u32).to_le_bytes().to_vec()
            }
            (DataType::Int64 | DataType::UInt64, Value::Int64(v)) => v.to_le_bytes().to_vec(),
            (DataType::Float32, Value::Float64(v)) => (*v as f32).to_le_bytes().to_vec(),
            (DataType::Float64, Value::Float64(v)) => v.to_le_bytes().to_vec(),
            (dtype, value) => {
                return Err(NdxError::type_mismatch(
                    dtype.name(),
                    value.data_type().name(),
                ))
            }
        };
        self.data[range].copy_from_slice(&encoded);
        Ok(())
    }
}
