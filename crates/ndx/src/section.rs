//! Metadata tree nodes.
//!
//! A section owns child sections and properties, may link to one other
//! section of the same type for one-level property inheritance, and keeps a
//! weak back-reference to its parent by id, resolved through the file.

use ndx_error::{NdxError, Result};
use ndx_store::Group;

use crate::entity::{self, Entity, Named};
use crate::file::NdxFile;
use crate::property::Property;
use crate::search;

const SECTIONS: &str = "sections";
const PROPERTIES: &str = "properties";

const ATTR_REPOSITORY: &str = "repository";
const ATTR_MAPPING: &str = "mapping";
const ATTR_LINK: &str = "link";
const ATTR_PARENT: &str = "parent";

/// A node of the metadata forest.
#[derive(Debug, Clone)]
pub struct Section {
    file: NdxFile,
    group: Group,
}

impl Entity for Section {
    fn group(&self) -> &Group {
        &self.group
    }

    fn file(&self) -> &NdxFile {
        &self.file
    }
}

impl Named for Section {}

impl Section {
    pub(crate) fn new(file: NdxFile, group: Group) -> Self {
        Self { file, group }
    }

    // --- Attributes ---

    /// URI of a repository holding the terminology this section follows.
    pub fn repository(&self) -> Result<Option<String>> {
        self.group.attr_str(ATTR_REPOSITORY)
    }

    pub fn set_repository(&self, uri: &str) -> Result<()> {
        self.group.set_attr(ATTR_REPOSITORY, uri)?;
        self.touch()
    }

    /// Mapping-definition string.
    pub fn mapping(&self) -> Result<Option<String>> {
        self.group.attr_str(ATTR_MAPPING)
    }

    pub fn set_mapping(&self, mapping: &str) -> Result<()> {
        self.group.set_attr(ATTR_MAPPING, mapping)?;
        self.touch()
    }

    // --- Parent ---

    /// Id of the owning section, `None` at a forest root.
    pub fn parent_id(&self) -> Result<Option<String>> {
        self.group.attr_str(ATTR_PARENT)
    }

    pub fn has_parent(&self) -> Result<bool> {
        Ok(self.parent_id()?.is_some())
    }

    /// The owning section, resolved through the file.
    pub fn parent(&self) -> Result<Option<Section>> {
        match self.parent_id()? {
            Some(id) => Ok(Some(self.file.find_section(&id)?)),
            None => Ok(None),
        }
    }

    // --- Link ---

    /// Id of the linked section, if any.
    pub fn link_id(&self) -> Result<Option<String>> {
        self.group.attr_str(ATTR_LINK)
    }

    /// The linked section, resolved through the file.
    pub fn link(&self) -> Result<Option<Section>> {
        match self.link_id()? {
            Some(id) => Ok(Some(self.file.find_section(&id)?)),
            None => Ok(None),
        }
    }

    /// Link this section to another one for property inheritance.
    ///
    /// The target must resolve through the file and carry the same type as
    /// this section; otherwise `NoSuchSection` or `TypeMismatch`.
    pub fn set_link(&self, target_id: &str) -> Result<()> {
        let target = self.file.find_section(target_id)?;
        let own_type = self.type_name()?;
        let target_type = target.type_name()?;
        if own_type != target_type {
            tracing::warn!(target_id, %own_type, %target_type, "link target type rejected");
            return Err(NdxError::type_mismatch(own_type, target_type));
        }
        self.group.set_attr(ATTR_LINK, target_id)?;
        self.touch()
    }

    /// Remove the link. Returns `false` when none was set.
    pub fn unset_link(&self) -> Result<bool> {
        let removed = self.group.remove_attr(ATTR_LINK)?;
        if removed {
            self.touch()?;
        }
        Ok(removed)
    }

    // --- Child sections ---

    /// Create a child section. The child's parent is set to this section's
    /// id; a generated id colliding with an existing sibling is retried.
    pub fn add_section(&self, name: &str, type_name: &str) -> Result<Section> {
        let children = self.group.open_group(SECTIONS, true)?;
        let ctx = self.file.context();
        let mut id = ctx.new_id("section");
        while children.has_group(&id) {
            id = ctx.new_id("section");
        }
        let child = children.create_group(&id)?;
        entity::init_named(&child, &id, name, type_name, ctx.now())?;
        child.set_attr(ATTR_PARENT, self.id()?)?;
        self.touch()?;
        tracing::debug!(%id, name, "child section created");
        Ok(Section::new(self.file.clone(), child))
    }

    /// Remove the child subtree rooted at `id`, properties included.
    ///
    /// Returns `false` (not an error) when no direct child has this id.
    pub fn remove_section(&self, id: &str) -> Result<bool> {
        if !self.group.has_group(SECTIONS) {
            return Ok(false);
        }
        let removed = self.group.open_group(SECTIONS, false)?.remove_group(id)?;
        if removed {
            self.touch()?;
        }
        Ok(removed)
    }

    /// Direct child sections, in creation order.
    pub fn sections(&self) -> Result<Vec<Section>> {
        if !self.group.has_group(SECTIONS) {
            return Ok(Vec::new());
        }
        let children = self.group.open_group(SECTIONS, false)?;
        let mut sections = Vec::with_capacity(children.object_count()?);
        for index in 0..children.object_count()? {
            if let Some(id) = children.object_name(index)? {
                sections.push(Section::new(
                    self.file.clone(),
                    children.open_group(&id, false)?,
                ));
            }
        }
        Ok(sections)
    }

    /// Number of direct child sections.
    pub fn section_count(&self) -> Result<usize> {
        Ok(self.sections()?.len())
    }

    // --- Properties ---

    /// Create a property. Names are unique per section, checked
    /// case-sensitively against local properties only.
    pub fn add_property(&self, name: &str) -> Result<Property> {
        if self.has_property_by_name(name)? {
            return Err(NdxError::PropertyExists {
                name: name.to_owned(),
            });
        }
        let props = self.group.open_group(PROPERTIES, true)?;
        let ctx = self.file.context();
        let mut id = ctx.new_id("property");
        while props.has_group(&id) {
            id = ctx.new_id("property");
        }
        let group = props.create_group(&id)?;
        entity::init_entity(&group, &id, ctx.now())?;
        group.set_attr(entity::attrs::NAME, name)?;
        self.touch()?;
        Ok(Property::new(self.file.clone(), group))
    }

    /// Local properties, in creation order. Never follows the link.
    pub fn properties(&self) -> Result<Vec<Property>> {
        if !self.group.has_group(PROPERTIES) {
            return Ok(Vec::new());
        }
        let props = self.group.open_group(PROPERTIES, false)?;
        let mut properties = Vec::with_capacity(props.object_count()?);
        for index in 0..props.object_count()? {
            if let Some(id) = props.object_name(index)? {
                properties.push(Property::new(
                    self.file.clone(),
                    props.open_group(&id, false)?,
                ));
            }
        }
        Ok(properties)
    }

    /// Number of local properties.
    pub fn property_count(&self) -> Result<usize> {
        Ok(self.properties()?.len())
    }

    /// Whether a local property has this id.
    pub fn has_property(&self, id: &str) -> Result<bool> {
        if !self.group.has_group(PROPERTIES) {
            return Ok(false);
        }
        Ok(self.group.open_group(PROPERTIES, false)?.has_group(id))
    }

    /// Look up a local property by id.
    pub fn get_property(&self, id: &str) -> Result<Property> {
        if self.group.has_group(PROPERTIES) {
            let props = self.group.open_group(PROPERTIES, false)?;
            if props.has_group(id) {
                return Ok(Property::new(self.file.clone(), props.open_group(id, false)?));
            }
        }
        Err(NdxError::NoSuchProperty { name: id.to_owned() })
    }

    /// Look up a property by name, falling back to the linked section's own
    /// properties when not found locally.
    pub fn get_property_by_name(&self, name: &str) -> Result<Property> {
        for property in self.properties()? {
            if property.name()? == name {
                return Ok(property);
            }
        }
        if let Some(target) = self.link()? {
            for property in target.properties()? {
                if property.name()? == name {
                    return Ok(property);
                }
            }
        }
        Err(NdxError::NoSuchProperty {
            name: name.to_owned(),
        })
    }

    /// Whether a local property has this name. Does not follow the link.
    pub fn has_property_by_name(&self, name: &str) -> Result<bool> {
        for property in self.properties()? {
            if property.name()? == name {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Remove a local property by id.
    ///
    /// Returns `false` (not an error) when no such property exists.
    pub fn remove_property(&self, id: &str) -> Result<bool> {
        if !self.group.has_group(PROPERTIES) {
            return Ok(false);
        }
        let removed = self.group.open_group(PROPERTIES, false)?.remove_group(id)?;
        if removed {
            self.touch()?;
        }
        Ok(removed)
    }

    /// Properties inherited through the link: exactly the target's own
    /// properties, one level only. The target's own link is not followed.
    pub fn inherited_properties(&self) -> Result<Vec<Property>> {
        match self.link()? {
            Some(target) => target.properties(),
            None => Ok(Vec::new()),
        }
    }

    // --- Search ---

    /// Pre-order search of the subtree rooted here.
    ///
    /// Includes this section unless `exclude_root`. Children are at level
    /// 1; nodes deeper than `max_depth` are skipped when `max_depth > 0`
    /// (0 means unbounded).
    pub fn find_sections<F>(
        &self,
        predicate: F,
        exclude_root: bool,
        max_depth: usize,
    ) -> Result<Vec<Section>>
    where
        F: Fn(&Section) -> Result<bool>,
    {
        let mut out = Vec::new();
        if !exclude_root && predicate(self)? {
            out.push(self.clone());
        }
        for child in self.sections()? {
            collect(&child, &predicate, 1, max_depth, &mut out)?;
        }
        Ok(out)
    }

    /// Related sections of the given type, first non-empty of: matching
    /// descendants, the nearest matching ancestor, matching siblings found
    /// by walking ancestors.
    pub fn get_related_sections(&self, type_name: &str) -> Result<Vec<Section>> {
        search::related_sections(self, type_name)
    }

    /// Boolean form of [`Section::get_related_sections`], short-circuiting
    /// at the first hit.
    pub fn has_related_section(&self, type_name: &str) -> Result<bool> {
        search::has_related_section(self, type_name)
    }
}

fn collect<F>(
    section: &Section,
    predicate: &F,
    level: usize,
    max_depth: usize,
    out: &mut Vec<Section>,
) -> Result<()>
where
    F: Fn(&Section) -> Result<bool>,
{
    if max_depth > 0 && level > max_depth {
        return Ok(());
    }
    if predicate(section)? {
        out.push(section.clone());
    }
    for child in section.sections()? {
        collect(&child, predicate, level + 1, max_depth, out)?;
    }
    Ok(())
}
