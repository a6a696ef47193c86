//! Persistent group/attribute store backing the ndx container.
//!
//! The object model in the `ndx` crate depends only on the contract exposed
//! here: a tree of named groups, each carrying scalar/vector attributes and
//! raw typed datasets. Two backings share the same API: a pure in-memory
//! store, and a path-backed store that loads a snapshot on open and flushes
//! it on close. The snapshot encoding is an implementation detail behind
//! this seam, not a stable container format.
//!
//! Handles are cheap views: cloning a [`Store`] or a [`Group`] duplicates a
//! reference to the shared state, never the data. The store is
//! single-threaded; nothing here locks.

mod object;
mod store;

pub use object::{AttrValue, DataSet};
pub use store::{Group, OpenMode, Store};
