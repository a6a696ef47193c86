//! Per-axis coordinate semantics of a data array.

use ndx_error::{NdxError, Result};
use ndx_store::{AttrValue, Group};

const ATTR_KIND: &str = "dimension_type";
const ATTR_LABELS: &str = "labels";
const ATTR_OFFSET: &str = "offset";
const ATTR_INTERVAL: &str = "sampling_interval";
const ATTR_UNIT: &str = "unit";
const ATTR_TICKS: &str = "ticks";

/// A closed set of axis descriptors.
///
/// Exactly one variant describes each array axis. Variant-specific
/// accessors fail with `TypeMismatch` on the wrong variant rather than
/// returning a default.
#[derive(Debug, Clone, PartialEq)]
pub enum Dimension {
    /// An ordered set of labels, one per index along the axis.
    Set { labels: Vec<String> },
    /// Regular sampling: `coordinate = offset + index * interval`.
    Sampled {
        offset: f64,
        interval: f64,
        unit: Option<String>,
    },
    /// Explicit ordered tick values, one per index along the axis.
    Range { ticks: Vec<f64> },
}

impl Dimension {
    /// The discriminant name used in storage and error messages.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Set { .. } => "set",
            Self::Sampled { .. } => "sampled",
            Self::Range { .. } => "range",
        }
    }

    /// Labels of a `Set` dimension.
    pub fn labels(&self) -> Result<&[String]> {
        match self {
            Self::Set { labels } => Ok(labels),
            other => Err(NdxError::type_mismatch("set", other.type_name())),
        }
    }

    /// Offset of a `Sampled` dimension.
    pub fn offset(&self) -> Result<f64> {
        match self {
            Self::Sampled { offset, .. } => Ok(*offset),
            other => Err(NdxError::type_mismatch("sampled", other.type_name())),
        }
    }

    /// Sampling interval of a `Sampled` dimension.
    pub fn sampling_interval(&self) -> Result<f64> {
        match self {
            Self::Sampled { interval, .. } => Ok(*interval),
            other => Err(NdxError::type_mismatch("sampled", other.type_name())),
        }
    }

    /// Unit of a `Sampled` dimension.
    pub fn unit(&self) -> Result<Option<&str>> {
        match self {
            Self::Sampled { unit, .. } => Ok(unit.as_deref()),
            other => Err(NdxError::type_mismatch("sampled", other.type_name())),
        }
    }

    /// Ticks of a `Range` dimension.
    pub fn ticks(&self) -> Result<&[f64]> {
        match self {
            Self::Range { ticks } => Ok(ticks),
            other => Err(NdxError::type_mismatch("range", other.type_name())),
        }
    }

    pub(crate) fn write_to(&self, group: &Group) -> Result<()> {
        group.set_attr(ATTR_KIND, self.type_name())?;
        match self {
            Self::Set { labels } => {
                group.set_attr(ATTR_LABELS, AttrValue::StrVec(labels.clone()))?;
            }
            Self::Sampled {
                offset,
                interval,
                unit,
            } => {
                group.set_attr(ATTR_OFFSET, *offset)?;
                group.set_attr(ATTR_INTERVAL, *interval)?;
                if let Some(unit) = unit {
                    group.set_attr(ATTR_UNIT, unit.as_str())?;
                }
            }
            Self::Range { ticks } => {
                group.set_attr(ATTR_TICKS, AttrValue::FloatVec(ticks.clone()))?;
            }
        }
        Ok(())
    }

    pub(crate) fn read_from(group: &Group) -> Result<Self> {
        let kind = group
            .attr_str(ATTR_KIND)?
            .ok_or_else(|| NdxError::corrupt("dimension has no type"))?;
        match kind.as_str() {
            "set" => Ok(Self::Set {
                labels: group.attr_str_vec(ATTR_LABELS)?.unwrap_or_default(),
            }),
            "sampled" => Ok(Self::Sampled {
                offset: group.attr_float(ATTR_OFFSET)?.unwrap_or(0.0),
                interval: group
                    .attr_float(ATTR_INTERVAL)?
                    .ok_or_else(|| NdxError::corrupt("sampled dimension has no interval"))?,
                unit: group.attr_str(ATTR_UNIT)?,
            }),
            "range" => Ok(Self::Range {
                ticks: group.attr_float_vec(ATTR_TICKS)?.unwrap_or_default(),
            }),
            other => Err(NdxError::corrupt(format!(
                "unknown dimension type: {other}"
            ))),
        }
    }
}
