//! Top-level grouping of data arrays and tags.

use ndx_error::{NdxError, Result};
use ndx_store::Group;

use crate::data_array::DataArray;
use crate::entity::{self, Entity, Named, WithMetadata};
use crate::file::NdxFile;
use crate::tag::{Tag, TagKind};

const DATA_ARRAYS: &str = "data_arrays";
const TAGS: &str = "tags";

/// A block of the primary-data side.
#[derive(Debug, Clone)]
pub struct Block {
    file: NdxFile,
    group: Group,
}

impl Entity for Block {
    fn group(&self) -> &Group {
        &self.group
    }

    fn file(&self) -> &NdxFile {
        &self.file
    }
}

impl Named for Block {}
impl WithMetadata for Block {}

impl Block {
    pub(crate) fn new(file: NdxFile, group: Group) -> Self {
        Self { file, group }
    }

    fn create_child(&self, collection: &str, kind: &str, name: &str, type_name: &str) -> Result<Group> {
        let children = self.group.open_group(collection, true)?;
        let ctx = self.file.context();
        let mut id = ctx.new_id(kind);
        while children.has_group(&id) {
            id = ctx.new_id(kind);
        }
        let child = children.create_group(&id)?;
        entity::init_named(&child, &id, name, type_name, ctx.now())?;
        self.touch()?;
        Ok(child)
    }

    fn children(&self, collection: &str) -> Result<Vec<Group>> {
        if !self.group.has_group(collection) {
            return Ok(Vec::new());
        }
        let children = self.group.open_group(collection, false)?;
        let mut out = Vec::with_capacity(children.object_count()?);
        for index in 0..children.object_count()? {
            if let Some(id) = children.object_name(index)? {
                out.push(children.open_group(&id, false)?);
            }
        }
        Ok(out)
    }

    fn child(&self, collection: &str, id: &str) -> Result<Group> {
        if self.group.has_group(collection) {
            let children = self.group.open_group(collection, false)?;
            if children.has_group(id) {
                return children.open_group(id, false);
            }
        }
        Err(NdxError::NoSuchEntity { id: id.to_owned() })
    }

    fn remove_child(&self, collection: &str, id: &str) -> Result<bool> {
        if !self.group.has_group(collection) {
            return Ok(false);
        }
        let removed = self.group.open_group(collection, false)?.remove_group(id)?;
        if removed {
            self.touch()?;
        }
        Ok(removed)
    }

    // --- Data arrays ---

    /// Create a data array in this block.
    pub fn create_data_array(&self, name: &str, type_name: &str) -> Result<DataArray> {
        let group = self.create_child(DATA_ARRAYS, "data_array", name, type_name)?;
        Ok(DataArray::new(self.file.clone(), group))
    }

    /// All data arrays, in creation order.
    pub fn data_arrays(&self) -> Result<Vec<DataArray>> {
        Ok(self
            .children(DATA_ARRAYS)?
            .into_iter()
            .map(|group| DataArray::new(self.file.clone(), group))
            .collect())
    }

    /// Look up a data array by id.
    pub fn data_array(&self, id: &str) -> Result<DataArray> {
        Ok(DataArray::new(self.file.clone(), self.child(DATA_ARRAYS, id)?))
    }

    pub fn data_array_count(&self) -> Result<usize> {
        Ok(self.children(DATA_ARRAYS)?.len())
    }

    /// Remove a data array. Returns `false` when no such array exists.
    pub fn remove_data_array(&self, id: &str) -> Result<bool> {
        self.remove_child(DATA_ARRAYS, id)
    }

    // --- Tags ---

    /// Create a point-like tag at `position`.
    pub fn create_simple_tag(
        &self,
        name: &str,
        type_name: &str,
        position: Vec<f64>,
    ) -> Result<Tag> {
        let group = self.create_child(TAGS, "tag", name, type_name)?;
        Tag::init(
            self.file.clone(),
            group,
            self.group.clone(),
            TagKind::Simple,
            position,
            None,
        )
    }

    /// Create an extent-like tag covering `position .. position + extent`.
    ///
    /// The extent must have the same length as the position; otherwise
    /// `RankMismatch`.
    pub fn create_data_tag(
        &self,
        name: &str,
        type_name: &str,
        position: Vec<f64>,
        extent: Vec<f64>,
    ) -> Result<Tag> {
        if extent.len() != position.len() {
            return Err(NdxError::RankMismatch {
                expected: position.len(),
                actual: extent.len(),
            });
        }
        let group = self.create_child(TAGS, "tag", name, type_name)?;
        Tag::init(
            self.file.clone(),
            group,
            self.group.clone(),
            TagKind::Data,
            position,
            Some(extent),
        )
    }

    /// All tags, in creation order.
    pub fn tags(&self) -> Result<Vec<Tag>> {
        Ok(self
            .children(TAGS)?
            .into_iter()
            .map(|group| Tag::new(self.file.clone(), group, self.group.clone()))
            .collect())
    }

    /// Look up a tag by id.
    pub fn tag(&self, id: &str) -> Result<Tag> {
        let group = self.child(TAGS, id)?;
        Ok(Tag::new(self.file.clone(), group, self.group.clone()))
    }

    pub fn tag_count(&self) -> Result<usize> {
        Ok(self.children(TAGS)?.len())
    }

    /// Remove a tag. Returns `false` when no such tag exists.
    pub fn remove_tag(&self, id: &str) -> Result<bool> {
        self.remove_child(TAGS, id)
    }
}
