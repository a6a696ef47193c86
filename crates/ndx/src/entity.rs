//! Identity layer shared by every persisted object.
//!
//! Composition instead of an inheritance chain: each concrete object holds
//! its storage group and implements [`Entity`], and layers [`Named`] and
//! [`WithMetadata`] on top where applicable. All state lives in group
//! attributes; the handles themselves are cheap views.

use ndx_store::Group;

use ndx_error::{NdxError, Result};

use crate::file::NdxFile;
use crate::section::Section;

/// Attribute keys shared by all entity kinds.
pub(crate) mod attrs {
    pub const ENTITY_ID: &str = "entity_id";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const DEFINITION: &str = "definition";
    pub const METADATA: &str = "metadata";
    pub const SOURCE_COUNT: &str = "source_count";
}

/// Write the identity record into a freshly created group.
pub(crate) fn init_entity(group: &Group, id: &str, now: i64) -> Result<()> {
    group.set_attr(attrs::ENTITY_ID, id)?;
    group.set_attr(attrs::CREATED_AT, now)?;
    group.set_attr(attrs::UPDATED_AT, now)?;
    Ok(())
}

/// Write identity plus name and type into a freshly created group.
pub(crate) fn init_named(
    group: &Group,
    id: &str,
    name: &str,
    type_name: &str,
    now: i64,
) -> Result<()> {
    init_entity(group, id, now)?;
    group.set_attr(attrs::NAME, name)?;
    group.set_attr(attrs::TYPE, type_name)?;
    Ok(())
}

fn required_str(group: &Group, key: &str) -> Result<String> {
    group
        .attr_str(key)?
        .ok_or_else(|| NdxError::corrupt(format!("missing required attribute: {key}")))
}

fn required_int(group: &Group, key: &str) -> Result<i64> {
    group
        .attr_int(key)?
        .ok_or_else(|| NdxError::corrupt(format!("missing required attribute: {key}")))
}

/// A persisted object with id and timestamps.
pub trait Entity {
    /// The storage group backing this object.
    fn group(&self) -> &Group;

    /// The file this object belongs to.
    fn file(&self) -> &NdxFile;

    /// The generated, immutable id.
    fn id(&self) -> Result<String> {
        required_str(self.group(), attrs::ENTITY_ID)
    }

    /// Creation time in epoch seconds. Set once, never mutated.
    fn created_at(&self) -> Result<i64> {
        required_int(self.group(), attrs::CREATED_AT)
    }

    /// Last-update time in epoch seconds.
    fn updated_at(&self) -> Result<i64> {
        required_int(self.group(), attrs::UPDATED_AT)
    }

    /// Record that a persisted field changed.
    fn touch(&self) -> Result<()> {
        let now = self.file().context().now();
        self.group().set_attr(attrs::UPDATED_AT, now)
    }
}

/// An entity with a name, a free-form type tag and an optional definition.
pub trait Named: Entity {
    /// The name given at creation. Immutable afterwards.
    fn name(&self) -> Result<String> {
        required_str(self.group(), attrs::NAME)
    }

    /// The free-form type tag.
    fn type_name(&self) -> Result<String> {
        required_str(self.group(), attrs::TYPE)
    }

    /// Replace the type tag.
    fn set_type(&self, type_name: &str) -> Result<()> {
        self.group().set_attr(attrs::TYPE, type_name)?;
        self.touch()
    }

    /// The optional human-readable definition.
    fn definition(&self) -> Result<Option<String>> {
        self.group().attr_str(attrs::DEFINITION)
    }

    /// Set the definition.
    fn set_definition(&self, definition: &str) -> Result<()> {
        self.group().set_attr(attrs::DEFINITION, definition)?;
        self.touch()
    }

    /// Clear the definition. Returns `false` when none was set.
    fn unset_definition(&self) -> Result<bool> {
        let removed = self.group().remove_attr(attrs::DEFINITION)?;
        if removed {
            self.touch()?;
        }
        Ok(removed)
    }
}

/// An entity that can point at one metadata [`Section`].
pub trait WithMetadata: Entity {
    /// The attached metadata section, resolved through the file.
    ///
    /// Fails with `NoSuchSection` when the stored id no longer resolves.
    fn metadata(&self) -> Result<Option<Section>> {
        match self.group().attr_str(attrs::METADATA)? {
            Some(id) => Ok(Some(self.file().find_section(&id)?)),
            None => Ok(None),
        }
    }

    /// Attach a metadata section by id.
    fn set_metadata(&self, section: &Section) -> Result<()> {
        self.group().set_attr(attrs::METADATA, section.id()?)?;
        self.touch()
    }

    /// Detach the metadata section. Returns `false` when none was attached.
    fn unset_metadata(&self) -> Result<bool> {
        let removed = self.group().remove_attr(attrs::METADATA)?;
        if removed {
            self.touch()?;
        }
        Ok(removed)
    }

    /// Number of attached sources. Tracked as a count only at this layer.
    fn source_count(&self) -> Result<u64> {
        let count = self.group().attr_int(attrs::SOURCE_COUNT)?.unwrap_or(0);
        u64::try_from(count).map_err(|_| NdxError::corrupt("negative source count"))
    }
}
