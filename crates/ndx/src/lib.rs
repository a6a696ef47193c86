//! Hierarchical data-and-metadata container for scientific datasets.
//!
//! An [`NdxFile`] owns two forests: the primary-data side ([`Block`]s
//! holding [`DataArray`]s and [`Tag`]s) and the metadata side ([`Section`]s
//! holding [`Property`]s). Every persisted object carries a generated id and
//! creation/update timestamps; cross-references (section links, section
//! parents, tag targets, metadata attachments) are stored as ids and
//! resolved through the file, never as direct object handles.
//!
//! Array payloads are addressed through [`NdArray`], a row-major strided
//! view over a flat byte buffer.
//!
//! ```
//! use ndx::{NdxFile, Value, WithMetadata};
//!
//! let file = NdxFile::in_memory()?;
//! let session = file.create_section("session-1", "recording")?;
//! let gain = session.add_property("gain")?;
//! gain.set_values(&[Value::Float64(2.5)])?;
//!
//! let block = file.create_block("trial-1", "ephys")?;
//! block.set_metadata(&session)?;
//! file.close()?;
//! # Ok::<(), ndx::NdxError>(())
//! ```

mod block;
mod ctx;
mod data_array;
mod dimension;
mod entity;
mod file;
mod ndarray;
mod property;
mod search;
mod section;
mod tag;
mod value;

pub use block::Block;
pub use ctx::{Context, IdGenerator};
pub use data_array::DataArray;
pub use dimension::Dimension;
pub use entity::{Entity, Named, WithMetadata};
pub use file::{FileMode, NdxFile, FORMAT, VERSION};
pub use ndarray::NdArray;
pub use ndx_error::{ErrorKind, NdxError, Result};
pub use property::Property;
pub use section::Section;
pub use tag::{Tag, TagKind};
pub use value::{DataType, Value};
