//! A single named metadatum attached to a section.

use ndx_error::{NdxError, Result};
use ndx_store::{AttrValue, Group};

use crate::entity::{self, Entity};
use crate::file::NdxFile;
use crate::value::{DataType, Value};

const ATTR_VALUES: &str = "values";
const ATTR_DATA_TYPE: &str = "data_type";
const ATTR_UNIT: &str = "unit";
const ATTR_UNCERTAINTY: &str = "uncertainty";

/// A named, typed value sequence with optional unit and uncertainty.
///
/// Created under exactly one section, removed only through it, never
/// reparented. The name is unique within the owning section and immutable.
#[derive(Debug, Clone)]
pub struct Property {
    file: NdxFile,
    group: Group,
}

impl Entity for Property {
    fn group(&self) -> &Group {
        &self.group
    }

    fn file(&self) -> &NdxFile {
        &self.file
    }
}

impl Property {
    pub(crate) fn new(file: NdxFile, group: Group) -> Self {
        Self { file, group }
    }

    /// The name given at creation.
    pub fn name(&self) -> Result<String> {
        self.group
            .attr_str(entity::attrs::NAME)?
            .ok_or_else(|| NdxError::corrupt("property has no name"))
    }

    /// The declared type of the value sequence, `None` while empty.
    pub fn data_type(&self) -> Result<Option<DataType>> {
        match self.group.attr_str(ATTR_DATA_TYPE)? {
            Some(name) => Ok(Some(DataType::from_name(&name)?)),
            None => Ok(None),
        }
    }

    /// Replace the value sequence.
    ///
    /// All values must carry the same type; a mixed sequence fails with
    /// `TypeMismatch`. An empty slice clears the sequence and the declared
    /// type.
    pub fn set_values(&self, values: &[Value]) -> Result<()> {
        let Some(first) = values.first() else {
            self.group.remove_attr(ATTR_VALUES)?;
            self.group.remove_attr(ATTR_DATA_TYPE)?;
            return self.touch();
        };
        let dtype = first.data_type();
        for value in values {
            if value.data_type() != dtype {
                return Err(NdxError::type_mismatch(
                    dtype.name(),
                    value.data_type().name(),
                ));
            }
        }
        let encoded = match dtype {
            DataType::Bool => AttrValue::BoolVec(
                values
                    .iter()
                    .map(|v| matches!(v, Value::Bool(true)))
                    .collect(),
            ),
            DataType::Int64 => AttrValue::IntVec(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Int64(i) => *i,
                        _ => 0,
                    })
                    .collect(),
            ),
            DataType::Float64 => AttrValue::FloatVec(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Float64(f) => *f,
                        _ => 0.0,
                    })
                    .collect(),
            ),
            DataType::String => AttrValue::StrVec(
                values
                    .iter()
                    .map(|v| match v {
                        Value::Str(s) => s.clone(),
                        _ => String::new(),
                    })
                    .collect(),
            ),
            other => {
                return Err(NdxError::type_mismatch(
                    "bool, i64, f64 or string",
                    other.name(),
                ))
            }
        };
        self.group.set_attr(ATTR_VALUES, encoded)?;
        self.group.set_attr(ATTR_DATA_TYPE, dtype.name())?;
        self.touch()
    }

    /// The value sequence, empty when never set.
    pub fn values(&self) -> Result<Vec<Value>> {
        let Some(stored) = self.group.get_attr(ATTR_VALUES)? else {
            return Ok(Vec::new());
        };
        let values = match stored {
            AttrValue::BoolVec(items) => items.into_iter().map(Value::Bool).collect(),
            AttrValue::IntVec(items) => items.into_iter().map(Value::Int64).collect(),
            AttrValue::FloatVec(items) => items.into_iter().map(Value::Float64).collect(),
            AttrValue::StrVec(items) => items.into_iter().map(Value::Str).collect(),
            other => {
                return Err(NdxError::corrupt(format!(
                    "property values stored with unexpected shape: {other:?}"
                )))
            }
        };
        Ok(values)
    }

    /// Number of values in the sequence.
    pub fn value_count(&self) -> Result<usize> {
        Ok(self.values()?.len())
    }

    /// The optional unit string.
    pub fn unit(&self) -> Result<Option<String>> {
        self.group.attr_str(ATTR_UNIT)
    }

    pub fn set_unit(&self, unit: &str) -> Result<()> {
        self.group.set_attr(ATTR_UNIT, unit)?;
        self.touch()
    }

    /// Clear the unit. Returns `false` when none was set.
    pub fn unset_unit(&self) -> Result<bool> {
        let removed = self.group.remove_attr(ATTR_UNIT)?;
        if removed {
            self.touch()?;
        }
        Ok(removed)
    }

    /// The optional uncertainty.
    pub fn uncertainty(&self) -> Result<Option<f64>> {
        self.group.attr_float(ATTR_UNCERTAINTY)
    }

    pub fn set_uncertainty(&self, uncertainty: f64) -> Result<()> {
        self.group.set_attr(ATTR_UNCERTAINTY, uncertainty)?;
        self.touch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Context, Section};

    fn section() -> (NdxFile, Section) {
        let file =
            NdxFile::in_memory_with_context(Context::deterministic(13, 1_700_000_000)).unwrap();
        let section = file.create_section("session", "recording").unwrap();
        (file, section)
    }

    #[test]
    fn fresh_property_is_empty() {
        let (_file, section) = section();
        let prop = section.add_property("gain").unwrap();
        assert_eq!(prop.name().unwrap(), "gain");
        assert_eq!(prop.data_type().unwrap(), None);
        assert!(prop.values().unwrap().is_empty());
        assert_eq!(prop.unit().unwrap(), None);
        assert_eq!(prop.uncertainty().unwrap(), None);
    }

    #[test]
    fn value_roundtrip_float() {
        let (_file, section) = section();
        let prop = section.add_property("gain").unwrap();
        prop.set_values(&[Value::Float64(2.5), Value::Float64(-1.0)])
            .unwrap();
        assert_eq!(prop.data_type().unwrap(), Some(DataType::Float64));
        assert_eq!(
            prop.values().unwrap(),
            vec![Value::Float64(2.5), Value::Float64(-1.0)]
        );
        assert_eq!(prop.value_count().unwrap(), 2);
    }

    #[test]
    fn value_roundtrip_strings() {
        let (_file, section) = section();
        let prop = section.add_property("channels").unwrap();
        let values = vec![Value::Str("V1".to_owned()), Value::Str("V2".to_owned())];
        prop.set_values(&values).unwrap();
        assert_eq!(prop.values().unwrap(), values);
        assert_eq!(prop.data_type().unwrap(), Some(DataType::String));
    }

    #[test]
    fn mixed_value_types_rejected() {
        let (_file, section) = section();
        let prop = section.add_property("mixed").unwrap();
        let err = prop
            .set_values(&[Value::Int64(1), Value::Float64(2.0)])
            .unwrap_err();
        assert!(matches!(err, NdxError::TypeMismatch { .. }));
        // A failed set leaves the sequence untouched.
        assert!(prop.values().unwrap().is_empty());
    }

    #[test]
    fn empty_slice_clears_values_and_type() {
        let (_file, section) = section();
        let prop = section.add_property("gain").unwrap();
        prop.set_values(&[Value::Int64(7)]).unwrap();
        prop.set_values(&[]).unwrap();
        assert!(prop.values().unwrap().is_empty());
        assert_eq!(prop.data_type().unwrap(), None);
    }

    #[test]
    fn unit_and_uncertainty() {
        let (file, section) = section();
        let prop = section.add_property("gain").unwrap();
        prop.set_unit("mV").unwrap();
        prop.set_uncertainty(0.25).unwrap();
        assert_eq!(prop.unit().unwrap().as_deref(), Some("mV"));
        assert_eq!(prop.uncertainty().unwrap(), Some(0.25));

        file.context().set_time_for_testing(1_700_000_099);
        assert!(prop.unset_unit().unwrap());
        assert!(!prop.unset_unit().unwrap());
        assert_eq!(prop.updated_at().unwrap(), 1_700_000_099);
    }
}
