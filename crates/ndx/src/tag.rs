//! Tags: points or extents in the coordinate space of referenced arrays.

use ndx_error::{NdxError, Result};
use ndx_store::{AttrValue, Group};

use crate::data_array::DataArray;
use crate::entity::{Entity, Named, WithMetadata};
use crate::file::NdxFile;

const ATTR_KIND: &str = "tag_kind";
const ATTR_POSITION: &str = "position";
const ATTR_EXTENT: &str = "extent";
const ATTR_REFERENCES: &str = "references";

const DATA_ARRAYS: &str = "data_arrays";

/// Whether a tag marks a point or an extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// A point in coordinate space.
    Simple,
    /// A segment: position plus per-axis extent.
    Data,
}

impl TagKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Data => "data",
        }
    }
}

/// A reference into one or more data arrays' coordinate space.
///
/// Rank compatibility between the tag's position/extent and a referenced
/// array is validated when the reference is attached, not lazily at read
/// time.
#[derive(Debug, Clone)]
pub struct Tag {
    file: NdxFile,
    group: Group,
    block: Group,
}

impl Entity for Tag {
    fn group(&self) -> &Group {
        &self.group
    }

    fn file(&self) -> &NdxFile {
        &self.file
    }
}

impl Named for Tag {}
impl WithMetadata for Tag {}

impl Tag {
    pub(crate) fn new(file: NdxFile, group: Group, block: Group) -> Self {
        Self { file, group, block }
    }

    pub(crate) fn init(
        file: NdxFile,
        group: Group,
        block: Group,
        kind: TagKind,
        position: Vec<f64>,
        extent: Option<Vec<f64>>,
    ) -> Result<Self> {
        group.set_attr(ATTR_KIND, kind.name())?;
        group.set_attr(ATTR_POSITION, AttrValue::FloatVec(position))?;
        if let Some(extent) = extent {
            group.set_attr(ATTR_EXTENT, AttrValue::FloatVec(extent))?;
        }
        Ok(Self { file, group, block })
    }

    /// The block's array collection, absent until the first array is
    /// created. Never created from here; tag paths only read it.
    fn arrays(&self) -> Result<Option<Group>> {
        if !self.block.has_group(DATA_ARRAYS) {
            return Ok(None);
        }
        Ok(Some(self.block.open_group(DATA_ARRAYS, false)?))
    }

    fn resolve_array(&self, array_id: &str) -> Result<DataArray> {
        let Some(arrays) = self.arrays()? else {
            return Err(NdxError::NoSuchEntity {
                id: array_id.to_owned(),
            });
        };
        if !arrays.has_group(array_id) {
            return Err(NdxError::NoSuchEntity {
                id: array_id.to_owned(),
            });
        }
        Ok(DataArray::new(
            self.file.clone(),
            arrays.open_group(array_id, false)?,
        ))
    }

    /// Whether this tag is point-like or extent-like.
    pub fn kind(&self) -> Result<TagKind> {
        match self.group.attr_str(ATTR_KIND)?.as_deref() {
            Some("simple") => Ok(TagKind::Simple),
            Some("data") => Ok(TagKind::Data),
            Some(other) => Err(NdxError::corrupt(format!("unknown tag kind: {other}"))),
            None => Err(NdxError::corrupt("tag has no kind")),
        }
    }

    /// The position, one coordinate per axis of the referenced arrays.
    pub fn position(&self) -> Result<Vec<f64>> {
        Ok(self.group.attr_float_vec(ATTR_POSITION)?.unwrap_or_default())
    }

    /// Replace the position.
    ///
    /// The new length must stay rank-compatible with every already
    /// referenced array and with the extent, if one is set.
    pub fn set_position(&self, position: Vec<f64>) -> Result<()> {
        for array in self.referenced_arrays()? {
            check_rank(&array, position.len())?;
        }
        if self.kind()? == TagKind::Data {
            let extent = self.extent()?;
            if !extent.is_empty() && extent.len() != position.len() {
                return Err(NdxError::RankMismatch {
                    expected: extent.len(),
                    actual: position.len(),
                });
            }
        }
        self.group
            .set_attr(ATTR_POSITION, AttrValue::FloatVec(position))?;
        self.touch()
    }

    /// The per-axis extent. Only extent-like tags carry one; asking a
    /// point-like tag fails with `TypeMismatch`.
    pub fn extent(&self) -> Result<Vec<f64>> {
        if self.kind()? == TagKind::Simple {
            return Err(NdxError::type_mismatch("data", "simple"));
        }
        Ok(self.group.attr_float_vec(ATTR_EXTENT)?.unwrap_or_default())
    }

    /// Replace the extent. Its length must equal the position's.
    pub fn set_extent(&self, extent: Vec<f64>) -> Result<()> {
        if self.kind()? == TagKind::Simple {
            return Err(NdxError::type_mismatch("data", "simple"));
        }
        let position = self.position()?;
        if extent.len() != position.len() {
            return Err(NdxError::RankMismatch {
                expected: position.len(),
                actual: extent.len(),
            });
        }
        self.group
            .set_attr(ATTR_EXTENT, AttrValue::FloatVec(extent))?;
        self.touch()
    }

    // --- References ---

    /// Ids of the referenced arrays, in attach order.
    pub fn references(&self) -> Result<Vec<String>> {
        Ok(self
            .group
            .attr_str_vec(ATTR_REFERENCES)?
            .unwrap_or_default())
    }

    /// Whether the array id is referenced.
    pub fn has_reference(&self, array_id: &str) -> Result<bool> {
        Ok(self.references()?.iter().any(|id| id == array_id))
    }

    /// Attach a reference to a data array of the same block.
    ///
    /// The array must exist and its axis count must equal the position
    /// length; the check happens here, not at read time.
    pub fn add_reference(&self, array_id: &str) -> Result<()> {
        let array = self.resolve_array(array_id)?;
        check_rank(&array, self.position()?.len())?;
        let mut references = self.references()?;
        if !references.iter().any(|id| id == array_id) {
            references.push(array_id.to_owned());
            self.group
                .set_attr(ATTR_REFERENCES, AttrValue::StrVec(references))?;
            self.touch()?;
        }
        Ok(())
    }

    /// Detach a reference. Returns `false` when the id was not referenced.
    pub fn remove_reference(&self, array_id: &str) -> Result<bool> {
        let mut references = self.references()?;
        let before = references.len();
        references.retain(|id| id != array_id);
        if references.len() == before {
            return Ok(false);
        }
        self.group
            .set_attr(ATTR_REFERENCES, AttrValue::StrVec(references))?;
        self.touch()?;
        Ok(true)
    }

    /// The referenced arrays, resolved through the owning block.
    pub fn referenced_arrays(&self) -> Result<Vec<DataArray>> {
        let mut arrays = Vec::new();
        for id in self.references()? {
            arrays.push(self.resolve_array(&id)?);
        }
        Ok(arrays)
    }
}

fn check_rank(array: &DataArray, position_len: usize) -> Result<()> {
    match array.axis_count()? {
        Some(rank) if rank == position_len => Ok(()),
        Some(rank) => Err(NdxError::RankMismatch {
            expected: rank,
            actual: position_len,
        }),
        None => Err(NdxError::invalid_reference(
            "referenced array has neither payload nor dimensions",
        )),
    }
}
