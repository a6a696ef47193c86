//! The root container.
//!
//! An `NdxFile` owns the store handle and the id/clock context, exposes the
//! factory operations for top-level [`Block`]s and [`Section`]s, and is the
//! sole authority for resolving section ids across the whole metadata
//! forest. Handles derived from a file share its store reference; the file
//! must stay open for their lifetime.

use std::path::Path;
use std::rc::Rc;

use ndx_error::{NdxError, Result};
use ndx_store::{Group, OpenMode, Store};

use crate::block::Block;
use crate::ctx::Context;
use crate::entity::{self, Entity};
use crate::section::Section;

/// Format tag written into the container root.
pub const FORMAT: &str = "ndx";
/// Format version written into the container root.
pub const VERSION: &str = "1.0";

const DATA_ROOT: &str = "data";
const METADATA_ROOT: &str = "metadata";

mod root_attrs {
    pub const FORMAT: &str = "format";
    pub const VERSION: &str = "version";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

/// How a container is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Existing container, no mutation allowed.
    ReadOnly,
    /// Read-write; the container is created when the path does not exist.
    ReadWrite,
}

impl FileMode {
    const fn store_mode(self) -> OpenMode {
        match self {
            Self::ReadOnly => OpenMode::ReadOnly,
            Self::ReadWrite => OpenMode::ReadWrite,
        }
    }
}

/// An open container.
///
/// Cloning duplicates the handle; all clones observe the same tree and the
/// same closed flag.
#[derive(Debug, Clone)]
pub struct NdxFile {
    store: Store,
    ctx: Rc<Context>,
}

impl NdxFile {
    /// Open a path-backed container with an entropy-seeded context.
    pub fn open(path: impl AsRef<Path>, mode: FileMode) -> Result<Self> {
        Self::open_with_context(path, mode, Context::new())
    }

    /// Open a path-backed container with an explicit context.
    pub fn open_with_context(
        path: impl AsRef<Path>,
        mode: FileMode,
        ctx: Context,
    ) -> Result<Self> {
        let store = Store::open(path, mode.store_mode())?;
        Self::from_store(store, ctx)
    }

    /// Create an in-memory container.
    pub fn in_memory() -> Result<Self> {
        Self::in_memory_with_context(Context::new())
    }

    /// Create an in-memory container with an explicit context.
    pub fn in_memory_with_context(ctx: Context) -> Result<Self> {
        Self::from_store(Store::in_memory(), ctx)
    }

    fn from_store(store: Store, ctx: Context) -> Result<Self> {
        let file = Self {
            store,
            ctx: Rc::new(ctx),
        };
        file.init_root()?;
        Ok(file)
    }

    /// Default absent root attributes and create the two top-level groups.
    /// Read-only containers are left untouched; getters fall back instead.
    fn init_root(&self) -> Result<()> {
        if self.store.mode() != OpenMode::ReadWrite {
            return Ok(());
        }
        let root = self.store.root();
        if !root.has_attr(root_attrs::FORMAT) {
            root.set_attr(root_attrs::FORMAT, FORMAT)?;
        }
        if !root.has_attr(root_attrs::VERSION) {
            root.set_attr(root_attrs::VERSION, VERSION)?;
        }
        let now = self.ctx.now();
        if !root.has_attr(root_attrs::CREATED_AT) {
            root.set_attr(root_attrs::CREATED_AT, now)?;
        }
        if !root.has_attr(root_attrs::UPDATED_AT) {
            root.set_attr(root_attrs::UPDATED_AT, now)?;
        }
        root.open_group(DATA_ROOT, true)?;
        root.open_group(METADATA_ROOT, true)?;
        Ok(())
    }

    /// The id/clock context in use.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The mode the container was opened with.
    pub fn mode(&self) -> FileMode {
        match self.store.mode() {
            OpenMode::ReadOnly => FileMode::ReadOnly,
            OpenMode::ReadWrite => FileMode::ReadWrite,
        }
    }

    /// The format tag, defaulted when the container never recorded one.
    pub fn format(&self) -> Result<String> {
        Ok(self
            .store
            .root()
            .attr_str(root_attrs::FORMAT)?
            .unwrap_or_else(|| FORMAT.to_owned()))
    }

    /// The format version, defaulted when the container never recorded one.
    pub fn version(&self) -> Result<String> {
        Ok(self
            .store
            .root()
            .attr_str(root_attrs::VERSION)?
            .unwrap_or_else(|| VERSION.to_owned()))
    }

    /// Container creation time in epoch seconds, `0` when never recorded.
    pub fn created_at(&self) -> Result<i64> {
        Ok(self
            .store
            .root()
            .attr_int(root_attrs::CREATED_AT)?
            .unwrap_or(0))
    }

    /// Last container update time in epoch seconds, `0` when never recorded.
    pub fn updated_at(&self) -> Result<i64> {
        Ok(self
            .store
            .root()
            .attr_int(root_attrs::UPDATED_AT)?
            .unwrap_or(0))
    }

    /// Whether [`NdxFile::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.store.is_closed()
    }

    /// Write pending changes out without closing.
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    /// Flush and close the container. Idempotent: a second close is a
    /// no-op, not an error.
    pub fn close(&self) -> Result<()> {
        if self.store.is_closed() {
            return Ok(());
        }
        if self.store.mode() == OpenMode::ReadWrite {
            self.store
                .root()
                .set_attr(root_attrs::UPDATED_AT, self.ctx.now())?;
        }
        self.store.close()?;
        tracing::debug!("container closed");
        Ok(())
    }

    fn data_root(&self) -> Result<Group> {
        self.store.root().open_group(DATA_ROOT, false)
    }

    fn metadata_root(&self) -> Result<Group> {
        self.store.root().open_group(METADATA_ROOT, false)
    }

    // --- Blocks ---

    /// Create a top-level block.
    pub fn create_block(&self, name: &str, type_name: &str) -> Result<Block> {
        let data = self.store.root().open_group(DATA_ROOT, true)?;
        let mut id = self.ctx.new_id("block");
        while data.has_group(&id) {
            id = self.ctx.new_id("block");
        }
        let group = data.create_group(&id)?;
        entity::init_named(&group, &id, name, type_name, self.ctx.now())?;
        tracing::debug!(%id, name, "block created");
        Ok(Block::new(self.clone(), group))
    }

    /// All top-level blocks, in creation order.
    pub fn blocks(&self) -> Result<Vec<Block>> {
        let data = match self.data_root() {
            Ok(group) => group,
            Err(NdxError::NoSuchGroup { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut blocks = Vec::with_capacity(data.object_count()?);
        for index in 0..data.object_count()? {
            if let Some(id) = data.object_name(index)? {
                blocks.push(Block::new(self.clone(), data.open_group(&id, false)?));
            }
        }
        Ok(blocks)
    }

    /// Look up a block by id.
    pub fn block(&self, id: &str) -> Result<Block> {
        let data = self.data_root().map_err(|e| match e {
            NdxError::NoSuchGroup { .. } => NdxError::NoSuchEntity { id: id.to_owned() },
            other => other,
        })?;
        if !data.has_group(id) {
            return Err(NdxError::NoSuchEntity { id: id.to_owned() });
        }
        Ok(Block::new(self.clone(), data.open_group(id, false)?))
    }

    /// Remove a block and everything it owns.
    ///
    /// Returns `false` (not an error) when no such block exists.
    pub fn remove_block(&self, id: &str) -> Result<bool> {
        let data = self.store.root().open_group(DATA_ROOT, true)?;
        data.remove_group(id)
    }

    // --- Sections ---

    /// Create a root section of the metadata forest.
    pub fn create_section(&self, name: &str, type_name: &str) -> Result<Section> {
        let metadata = self.store.root().open_group(METADATA_ROOT, true)?;
        let mut id = self.ctx.new_id("section");
        while metadata.has_group(&id) {
            id = self.ctx.new_id("section");
        }
        let group = metadata.create_group(&id)?;
        entity::init_named(&group, &id, name, type_name, self.ctx.now())?;
        tracing::debug!(%id, name, "section created");
        Ok(Section::new(self.clone(), group))
    }

    /// All root sections, in creation order.
    pub fn sections(&self) -> Result<Vec<Section>> {
        let metadata = match self.metadata_root() {
            Ok(group) => group,
            Err(NdxError::NoSuchGroup { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut sections = Vec::with_capacity(metadata.object_count()?);
        for index in 0..metadata.object_count()? {
            if let Some(id) = metadata.object_name(index)? {
                sections.push(Section::new(self.clone(), metadata.open_group(&id, false)?));
            }
        }
        Ok(sections)
    }

    /// Resolve a section id anywhere in the metadata forest.
    ///
    /// This is the lookup used for links, parents and metadata attachments.
    pub fn find_section(&self, id: &str) -> Result<Section> {
        let mut stack = self.sections()?;
        while let Some(section) = stack.pop() {
            if section.id()? == id {
                return Ok(section);
            }
            stack.extend(section.sections()?);
        }
        Err(NdxError::NoSuchSection { id: id.to_owned() })
    }

    /// Remove a root section and its whole subtree.
    ///
    /// Returns `false` (not an error) when no root section has this id.
    pub fn remove_section(&self, id: &str) -> Result<bool> {
        let metadata = self.store.root().open_group(METADATA_ROOT, true)?;
        metadata.remove_group(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Named;

    fn deterministic_file() -> NdxFile {
        NdxFile::in_memory_with_context(Context::deterministic(7, 1_700_000_000)).unwrap()
    }

    #[test]
    fn root_attrs_defaulted_on_create() {
        let file = deterministic_file();
        assert_eq!(file.format().unwrap(), FORMAT);
        assert_eq!(file.version().unwrap(), VERSION);
        assert_eq!(file.created_at().unwrap(), 1_700_000_000);
        assert_eq!(file.updated_at().unwrap(), 1_700_000_000);
    }

    #[test]
    fn block_lifecycle() {
        let file = deterministic_file();
        let a = file.create_block("trial-1", "ephys").unwrap();
        let b = file.create_block("trial-2", "ephys").unwrap();
        let a_id = a.id().unwrap();
        assert_ne!(a_id, b.id().unwrap());

        let listed = file.blocks().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name().unwrap(), "trial-1");
        assert_eq!(listed[1].name().unwrap(), "trial-2");

        let found = file.block(&a_id).unwrap();
        assert_eq!(found.name().unwrap(), "trial-1");

        // Handles into the removed subtree are stale after this; only the
        // captured id is used below.
        assert!(file.remove_block(&a_id).unwrap());
        assert!(!file.remove_block(&a_id).unwrap());
        assert_eq!(file.blocks().unwrap().len(), 1);

        let err = file.block(&a_id).unwrap_err();
        assert!(matches!(err, NdxError::NoSuchEntity { .. }));
    }

    #[test]
    fn find_section_searches_the_whole_forest() {
        let file = deterministic_file();
        let root = file.create_section("root", "experiment").unwrap();
        let child = root.add_section("child", "trial").unwrap();
        let grandchild = child.add_section("grandchild", "trial").unwrap();

        let id = grandchild.id().unwrap();
        let found = file.find_section(&id).unwrap();
        assert_eq!(found.name().unwrap(), "grandchild");

        let err = file.find_section("section_missing").unwrap_err();
        assert!(matches!(err, NdxError::NoSuchSection { .. }));
    }

    #[test]
    fn close_is_idempotent_and_touches_updated_at() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("container.ndx");
        let ctx = Context::deterministic(3, 1_700_000_000);
        let file = NdxFile::open_with_context(&path, FileMode::ReadWrite, ctx).unwrap();
        file.create_block("b", "t").unwrap();

        file.context().set_time_for_testing(1_700_000_100);
        file.close().unwrap();
        file.close().unwrap();
        assert!(file.is_closed());

        let reopened = NdxFile::open(&path, FileMode::ReadOnly).unwrap();
        assert_eq!(reopened.updated_at().unwrap(), 1_700_000_100);
    }

    #[test]
    fn read_only_missing_container_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = NdxFile::open(dir.path().join("absent.ndx"), FileMode::ReadOnly).unwrap_err();
        assert!(matches!(err, NdxError::CannotOpen { .. }));
    }

    #[test]
    fn reopen_preserves_blocks_and_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("container.ndx");
        let block_id;
        {
            let file = NdxFile::open(&path, FileMode::ReadWrite).unwrap();
            let block = file.create_block("trial-1", "ephys").unwrap();
            block_id = block.id().unwrap();
            file.create_section("session", "recording").unwrap();
            file.close().unwrap();
        }

        let file = NdxFile::open(&path, FileMode::ReadOnly).unwrap();
        assert_eq!(file.block(&block_id).unwrap().name().unwrap(), "trial-1");
        assert_eq!(file.sections().unwrap().len(), 1);
        assert_eq!(file.format().unwrap(), FORMAT);
    }

    #[test]
    fn fresh_file_has_no_blocks() {
        let file = deterministic_file();
        assert!(file.blocks().unwrap().is_empty());
        assert!(file.sections().unwrap().is_empty());
    }
}
