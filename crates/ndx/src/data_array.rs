//! A named, typed, strided N-dimensional payload with one dimension
//! descriptor per axis.

use ndx_error::{NdxError, Result};
use ndx_store::Group;

use crate::dimension::Dimension;
use crate::entity::{Entity, Named, WithMetadata};
use crate::file::NdxFile;
use crate::ndarray::NdArray;

const DIMENSIONS: &str = "dimensions";
const PAYLOAD: &str = "data";

/// A data array inside a block.
#[derive(Debug, Clone)]
pub struct DataArray {
    file: NdxFile,
    group: Group,
}

impl Entity for DataArray {
    fn group(&self) -> &Group {
        &self.group
    }

    fn file(&self) -> &NdxFile {
        &self.file
    }
}

impl Named for DataArray {}
impl WithMetadata for DataArray {}

impl DataArray {
    pub(crate) fn new(file: NdxFile, group: Group) -> Self {
        Self { file, group }
    }

    // --- Payload ---

    /// Replace the payload.
    ///
    /// When dimension descriptors are already attached, their count must
    /// equal the new payload's rank; otherwise `RankMismatch`.
    pub fn set_payload(&self, array: NdArray) -> Result<()> {
        let dims = self.dimension_count()?;
        if dims > 0 && dims != array.rank() {
            return Err(NdxError::RankMismatch {
                expected: dims,
                actual: array.rank(),
            });
        }
        self.group.set_data(PAYLOAD, array.into_dataset())?;
        self.touch()
    }

    /// The payload, `None` while never set.
    pub fn payload(&self) -> Result<Option<NdArray>> {
        if !self.group.has_data(PAYLOAD) {
            return Ok(None);
        }
        Ok(Some(NdArray::from_dataset(self.group.get_data(PAYLOAD)?)?))
    }

    /// Number of axes: the payload's rank when one is set, else the
    /// dimension-descriptor count when any are attached, else `None`.
    pub fn axis_count(&self) -> Result<Option<usize>> {
        if let Some(payload) = self.payload()? {
            return Ok(Some(payload.rank()));
        }
        let dims = self.dimension_count()?;
        Ok(if dims > 0 { Some(dims) } else { None })
    }

    // --- Dimensions ---

    /// Number of attached dimension descriptors.
    pub fn dimension_count(&self) -> Result<usize> {
        if !self.group.has_group(DIMENSIONS) {
            return Ok(0);
        }
        self.group.open_group(DIMENSIONS, false)?.object_count()
    }

    /// The descriptor for axis `index` (1-based, matching axis order).
    pub fn dimension(&self, index: usize) -> Result<Dimension> {
        if index == 0 || index > self.dimension_count()? {
            return Err(NdxError::NoSuchEntity {
                id: format!("dimension {index}"),
            });
        }
        let dims = self.group.open_group(DIMENSIONS, false)?;
        Dimension::read_from(&dims.open_group(&index.to_string(), false)?)
    }

    /// All descriptors in axis order.
    pub fn dimensions(&self) -> Result<Vec<Dimension>> {
        let count = self.dimension_count()?;
        let mut out = Vec::with_capacity(count);
        for index in 1..=count {
            out.push(self.dimension(index)?);
        }
        Ok(out)
    }

    fn append_dimension(&self, dim: Dimension) -> Result<Dimension> {
        let count = self.dimension_count()?;
        if let Some(payload) = self.payload()? {
            if count + 1 > payload.rank() {
                return Err(NdxError::RankMismatch {
                    expected: payload.rank(),
                    actual: count + 1,
                });
            }
        }
        let dims = self.group.open_group(DIMENSIONS, true)?;
        let group = dims.create_group(&(count + 1).to_string())?;
        dim.write_to(&group)?;
        self.touch()?;
        Ok(dim)
    }

    /// Append a `Set` descriptor for the next axis.
    pub fn append_set_dimension(&self, labels: Vec<String>) -> Result<Dimension> {
        self.append_dimension(Dimension::Set { labels })
    }

    /// Append a `Sampled` descriptor for the next axis.
    pub fn append_sampled_dimension(
        &self,
        offset: f64,
        interval: f64,
        unit: Option<String>,
    ) -> Result<Dimension> {
        self.append_dimension(Dimension::Sampled {
            offset,
            interval,
            unit,
        })
    }

    /// Append a `Range` descriptor for the next axis.
    pub fn append_range_dimension(&self, ticks: Vec<f64>) -> Result<Dimension> {
        self.append_dimension(Dimension::Range { ticks })
    }

    /// Replace all descriptors at once.
    ///
    /// When a payload is set, the descriptor count must equal its rank.
    pub fn set_dimensions(&self, dims: &[Dimension]) -> Result<()> {
        if let Some(payload) = self.payload()? {
            if dims.len() != payload.rank() {
                return Err(NdxError::RankMismatch {
                    expected: payload.rank(),
                    actual: dims.len(),
                });
            }
        }
        self.group.remove_group(DIMENSIONS)?;
        let target = self.group.open_group(DIMENSIONS, true)?;
        for (axis, dim) in dims.iter().enumerate() {
            let group = target.create_group(&(axis + 1).to_string())?;
            dim.write_to(&group)?;
        }
        self.touch()
    }
}
