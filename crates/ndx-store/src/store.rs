use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ndx_error::{NdxError, Result};
use serde::{Deserialize, Serialize};

use crate::object::{AttrValue, DataSet};

/// Index of a node in the store's arena.
type NodeId = usize;

/// How a store was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing container, no mutation allowed.
    ReadOnly,
    /// Read-write; the container is created when the path does not exist.
    ReadWrite,
}

/// A single node in the group tree.
///
/// Children keep insertion order; lookups by name scan the (short) child
/// list rather than maintaining a second index.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Node {
    attrs: BTreeMap<String, AttrValue>,
    data: BTreeMap<String, DataSet>,
    children: Vec<(String, NodeId)>,
}

/// The persisted form of the arena.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    nodes: Vec<Option<Node>>,
}

#[derive(Debug)]
struct StoreInner {
    /// Arena of nodes; removed subtrees leave `None` slots behind.
    nodes: Vec<Option<Node>>,
    path: Option<PathBuf>,
    mode: OpenMode,
    closed: bool,
    dirty: bool,
}

const ROOT: NodeId = 0;

impl StoreInner {
    fn fresh(path: Option<PathBuf>, mode: OpenMode) -> Self {
        Self {
            nodes: vec![Some(Node::default())],
            path,
            mode,
            closed: false,
            dirty: false,
        }
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or_else(|| NdxError::internal(format!("dangling group handle: node {id}")))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or_else(|| NdxError::internal(format!("dangling group handle: node {id}")))
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(NdxError::Closed);
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        self.check_open()?;
        if self.mode == OpenMode::ReadOnly {
            return Err(NdxError::ReadOnly);
        }
        Ok(())
    }

    fn child_id(&self, parent: NodeId, name: &str) -> Result<Option<NodeId>> {
        let node = self.node(parent)?;
        Ok(node
            .children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id))
    }

    fn insert_child(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        let id = self.nodes.len();
        self.nodes.push(Some(Node::default()));
        self.node_mut(parent)?.children.push((name.to_owned(), id));
        self.dirty = true;
        Ok(id)
    }

    /// Tombstone `root` and its whole subtree.
    fn remove_subtree(&mut self, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(id).and_then(Option::take) {
                stack.extend(node.children.iter().map(|(_, c)| *c));
            }
        }
        self.dirty = true;
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty || self.mode == OpenMode::ReadOnly {
            return Ok(());
        }
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        let snapshot = Snapshot {
            nodes: std::mem::take(&mut self.nodes),
        };
        let encoded = serde_json::to_vec(&snapshot)
            .map_err(|e| NdxError::internal(format!("snapshot encode failed: {e}")));
        self.nodes = snapshot.nodes;
        std::fs::write(&path, encoded?)?;
        self.dirty = false;
        tracing::debug!(path = %path.display(), "store snapshot flushed");
        Ok(())
    }
}

/// Handle to an open store.
///
/// Cloning duplicates the reference; all clones observe the same tree and
/// the same closed flag.
#[derive(Debug, Clone)]
pub struct Store {
    inner: Rc<RefCell<StoreInner>>,
}

impl Store {
    /// Create an in-memory store with an empty root group.
    pub fn in_memory() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner::fresh(None, OpenMode::ReadWrite))),
        }
    }

    /// Open a path-backed store.
    ///
    /// Read-only mode requires the file to exist. Read-write mode starts
    /// from an empty root when it does not.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let inner = if path.exists() {
            let raw = std::fs::read(path)?;
            let snapshot: Snapshot = serde_json::from_slice(&raw)
                .map_err(|e| NdxError::corrupt(format!("snapshot decode failed: {e}")))?;
            if snapshot.nodes.first().and_then(Option::as_ref).is_none() {
                return Err(NdxError::corrupt("snapshot has no root group"));
            }
            StoreInner {
                nodes: snapshot.nodes,
                path: Some(path.to_path_buf()),
                mode,
                closed: false,
                dirty: false,
            }
        } else {
            if mode == OpenMode::ReadOnly {
                return Err(NdxError::CannotOpen {
                    path: path.to_path_buf(),
                });
            }
            StoreInner::fresh(Some(path.to_path_buf()), mode)
        };
        tracing::debug!(path = %path.display(), ?mode, "store opened");
        Ok(Self {
            inner: Rc::new(RefCell::new(inner)),
        })
    }

    /// The root group.
    pub fn root(&self) -> Group {
        Group {
            store: self.clone(),
            node: ROOT,
        }
    }

    /// The mode this store was opened with.
    pub fn mode(&self) -> OpenMode {
        self.inner.borrow().mode
    }

    /// Whether [`Store::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Write the snapshot out if the tree changed since the last flush.
    ///
    /// A no-op for in-memory and read-only stores.
    pub fn flush(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.check_open()?;
        inner.flush()
    }

    /// Flush and close the store. Idempotent: a second close is a no-op.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.closed {
            return Ok(());
        }
        inner.flush()?;
        inner.closed = true;
        tracing::debug!("store closed");
        Ok(())
    }
}

/// A view of one group in the store tree.
#[derive(Debug, Clone)]
pub struct Group {
    store: Store,
    node: NodeId,
}

impl Group {
    /// Create a child group. Fails if the name is taken.
    pub fn create_group(&self, name: &str) -> Result<Group> {
        let mut inner = self.store.inner.borrow_mut();
        inner.check_writable()?;
        if inner.child_id(self.node, name)?.is_some() {
            return Err(NdxError::GroupExists {
                name: name.to_owned(),
            });
        }
        let id = inner.insert_child(self.node, name)?;
        drop(inner);
        Ok(Group {
            store: self.store.clone(),
            node: id,
        })
    }

    /// Open a child group, optionally creating it when missing.
    pub fn open_group(&self, name: &str, create_if_missing: bool) -> Result<Group> {
        let mut inner = self.store.inner.borrow_mut();
        inner.check_open()?;
        let id = match inner.child_id(self.node, name)? {
            Some(id) => id,
            None => {
                if !create_if_missing {
                    return Err(NdxError::NoSuchGroup {
                        name: name.to_owned(),
                    });
                }
                inner.check_writable()?;
                inner.insert_child(self.node, name)?
            }
        };
        drop(inner);
        Ok(Group {
            store: self.store.clone(),
            node: id,
        })
    }

    /// Whether a child group with this name exists.
    pub fn has_group(&self, name: &str) -> bool {
        let inner = self.store.inner.borrow();
        !inner.closed && matches!(inner.child_id(self.node, name), Ok(Some(_)))
    }

    /// Remove the child group and its whole subtree.
    ///
    /// Returns `false` (not an error) when no such child exists.
    pub fn remove_group(&self, name: &str) -> Result<bool> {
        let mut inner = self.store.inner.borrow_mut();
        inner.check_writable()?;
        let Some(id) = inner.child_id(self.node, name)? else {
            return Ok(false);
        };
        inner.node_mut(self.node)?.children.retain(|(n, _)| n != name);
        inner.remove_subtree(id);
        Ok(true)
    }

    /// Number of child groups, in insertion order.
    pub fn object_count(&self) -> Result<usize> {
        let inner = self.store.inner.borrow();
        inner.check_open()?;
        Ok(inner.node(self.node)?.children.len())
    }

    /// Name of the child group at `index`, if in range.
    pub fn object_name(&self, index: usize) -> Result<Option<String>> {
        let inner = self.store.inner.borrow();
        inner.check_open()?;
        Ok(inner
            .node(self.node)?
            .children
            .get(index)
            .map(|(n, _)| n.clone()))
    }

    // --- Attributes ---

    /// Set an attribute, replacing any previous value.
    pub fn set_attr(&self, name: &str, value: impl Into<AttrValue>) -> Result<()> {
        let mut inner = self.store.inner.borrow_mut();
        inner.check_writable()?;
        inner
            .node_mut(self.node)?
            .attrs
            .insert(name.to_owned(), value.into());
        inner.dirty = true;
        Ok(())
    }

    /// Read an attribute.
    pub fn get_attr(&self, name: &str) -> Result<Option<AttrValue>> {
        let inner = self.store.inner.borrow();
        inner.check_open()?;
        Ok(inner.node(self.node)?.attrs.get(name).cloned())
    }

    /// Whether the attribute is set.
    pub fn has_attr(&self, name: &str) -> bool {
        let inner = self.store.inner.borrow();
        !inner.closed
            && inner
                .node(self.node)
                .map(|n| n.attrs.contains_key(name))
                .unwrap_or(false)
    }

    /// Remove an attribute. Returns `false` when it was not set.
    pub fn remove_attr(&self, name: &str) -> Result<bool> {
        let mut inner = self.store.inner.borrow_mut();
        inner.check_writable()?;
        let removed = inner.node_mut(self.node)?.attrs.remove(name).is_some();
        if removed {
            inner.dirty = true;
        }
        Ok(removed)
    }

    /// String attribute, or `None` when absent or of another shape.
    pub fn attr_str(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .get_attr(name)?
            .and_then(|v| v.as_str().map(str::to_owned)))
    }

    /// Integer attribute, or `None` when absent or of another shape.
    pub fn attr_int(&self, name: &str) -> Result<Option<i64>> {
        Ok(self.get_attr(name)?.and_then(|v| v.as_int()))
    }

    /// Float attribute, or `None` when absent or of another shape.
    pub fn attr_float(&self, name: &str) -> Result<Option<f64>> {
        Ok(self.get_attr(name)?.and_then(|v| v.as_float()))
    }

    /// String-vector attribute, or `None` when absent or of another shape.
    pub fn attr_str_vec(&self, name: &str) -> Result<Option<Vec<String>>> {
        Ok(self.get_attr(name)?.and_then(|v| match v {
            AttrValue::StrVec(items) => Some(items),
            _ => None,
        }))
    }

    /// Float-vector attribute, or `None` when absent or of another shape.
    pub fn attr_float_vec(&self, name: &str) -> Result<Option<Vec<f64>>> {
        Ok(self.get_attr(name)?.and_then(|v| match v {
            AttrValue::FloatVec(items) => Some(items),
            _ => None,
        }))
    }

    // --- Datasets ---

    /// Store a raw payload under `name`, replacing any previous one.
    pub fn set_data(&self, name: &str, data: DataSet) -> Result<()> {
        let mut inner = self.store.inner.borrow_mut();
        inner.check_writable()?;
        inner.node_mut(self.node)?.data.insert(name.to_owned(), data);
        inner.dirty = true;
        Ok(())
    }

    /// Read the payload stored under `name`.
    pub fn get_data(&self, name: &str) -> Result<DataSet> {
        let inner = self.store.inner.borrow();
        inner.check_open()?;
        inner
            .node(self.node)?
            .data
            .get(name)
            .cloned()
            .ok_or_else(|| NdxError::NoSuchData {
                name: name.to_owned(),
            })
    }

    /// Whether a payload is stored under `name`.
    pub fn has_data(&self, name: &str) -> bool {
        let inner = self.store.inner.borrow();
        !inner.closed
            && inner
                .node(self.node)
                .map(|n| n.data.contains_key(name))
                .unwrap_or(false)
    }

    /// The store this group belongs to.
    pub fn store(&self) -> &Store {
        &self.store
    }
}
