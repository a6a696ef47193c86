use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for ndx container operations.
///
/// Structured variants for the common failure cases; every variant maps to
/// one of the abstract kinds in [`ErrorKind`] via [`NdxError::kind`].
#[derive(Error, Debug)]
pub enum NdxError {
    // === Container errors ===
    /// Container file cannot be opened (missing in read-only mode, or the
    /// path is not accessible).
    #[error("unable to open container file: '{path}'")]
    CannotOpen { path: PathBuf },

    /// Container content could not be decoded.
    #[error("container is malformed: {detail}")]
    Corrupt { detail: String },

    /// Operation attempted on a closed container.
    #[error("container is closed")]
    Closed,

    /// Write attempted on a container opened read-only.
    #[error("attempt to write a read-only container")]
    ReadOnly,

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Lookup errors ===
    /// No group with the given name under the current group.
    #[error("no such group: {name}")]
    NoSuchGroup { name: String },

    /// No section with the given id is reachable from the file.
    #[error("no such section: {id}")]
    NoSuchSection { id: String },

    /// No property with the given id or name in the section (after link
    /// fallback, where the lookup performs one).
    #[error("no such property: {name}")]
    NoSuchProperty { name: String },

    /// No entity (block, data array, tag, dimension) with the given id.
    #[error("no such entity: {id}")]
    NoSuchEntity { id: String },

    /// No dataset with the given name in the group.
    #[error("no such dataset: {name}")]
    NoSuchData { name: String },

    // === Constraint errors ===
    /// A group with this name already exists under the current group.
    #[error("group already exists: {name}")]
    GroupExists { name: String },

    /// A property with this name already exists in the section.
    #[error("property already exists: {name}")]
    PropertyExists { name: String },

    /// Declared or linked type differs from the required one.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Rank of a payload, dimension set, or tag position does not match the
    /// entity it is being attached to.
    #[error("rank mismatch: expected {expected}, got {actual}")]
    RankMismatch { expected: usize, actual: usize },

    /// A cross-reference (tag target, link id) is malformed.
    #[error("invalid reference: {detail}")]
    InvalidReference { detail: String },

    // === Array arithmetic errors ===
    /// Requested array size exceeds the addressable-size domain.
    #[error("allocation exceeds addressable size")]
    AllocationOverflow,

    /// Computed flat offset exceeds the addressable-size domain.
    #[error("index offset exceeds addressable size")]
    OffsetOverflow,

    // === Internal ===
    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Abstract error classification used by callers that care about the
/// failure category rather than the specific variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Referenced id or name is absent.
    NotFound,
    /// Duplicate where uniqueness is required.
    AlreadyExists,
    /// Declared type differs from the required one.
    TypeMismatch,
    /// Malformed or rank-incompatible cross-reference.
    InvalidReference,
    /// Array allocation exceeds the addressable-size domain.
    Allocation,
    /// Flat-offset computation exceeds the addressable-size domain.
    Index,
    /// Underlying I/O failure.
    Io,
    /// Container already closed.
    Closed,
    /// Container content could not be decoded.
    Corrupt,
    /// Write on a read-only container.
    ReadOnly,
    /// Internal logic error.
    Internal,
}

impl NdxError {
    /// Map this error to its abstract kind.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CannotOpen { .. } | Self::Io(_) => ErrorKind::Io,
            Self::Corrupt { .. } => ErrorKind::Corrupt,
            Self::Closed => ErrorKind::Closed,
            Self::ReadOnly => ErrorKind::ReadOnly,
            Self::NoSuchGroup { .. }
            | Self::NoSuchSection { .. }
            | Self::NoSuchProperty { .. }
            | Self::NoSuchEntity { .. }
            | Self::NoSuchData { .. } => ErrorKind::NotFound,
            Self::GroupExists { .. } | Self::PropertyExists { .. } => ErrorKind::AlreadyExists,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::RankMismatch { .. } | Self::InvalidReference { .. } => {
                ErrorKind::InvalidReference
            }
            Self::AllocationOverflow => ErrorKind::Allocation,
            Self::OffsetOverflow => ErrorKind::Index,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the error reports a missing id or name.
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound)
    }

    /// Create a type-mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid-reference error.
    pub fn invalid_reference(detail: impl Into<String>) -> Self {
        Self::InvalidReference {
            detail: detail.into(),
        }
    }

    /// Create a corrupt-container error.
    pub fn corrupt(detail: impl Into<String>) -> Self {
        Self::Corrupt {
            detail: detail.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using [`NdxError`].
pub type Result<T> = std::result::Result<T, NdxError>;
