//! Error types for container loading and accessor resolution.

use std::path::PathBuf;

use crate::model::ComponentType;

/// Whole-model failures. Any of these aborts loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("I/O error reading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse container: {0}")]
    Parse(String),

    #[error("model contains no meshes")]
    NoMeshes,

    #[error("no drawable primitives survived loading ({skipped} skipped)")]
    NoPrimitives { skipped: usize },
}

/// Failures while resolving a single accessor. Fatal for the owning primitive only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("{table} index {index} out of range (len {len})")]
    IndexOutOfRange {
        table: &'static str,
        index: usize,
        len: usize,
    },

    #[error("accessor {accessor} has no buffer view")]
    MissingBufferView { accessor: usize },

    #[error("byte range {start}..{end} exceeds {what} bound {bound}")]
    ByteRange {
        what: &'static str,
        start: usize,
        end: usize,
        bound: usize,
    },

    #[error("accessor {accessor}: stride {stride} is smaller than element size {element_size}")]
    StrideTooSmall {
        accessor: usize,
        stride: usize,
        element_size: usize,
    },

    #[error("accessor {accessor}: expected {expected} components, found {found}")]
    Shape {
        accessor: usize,
        expected: usize,
        found: usize,
    },

    #[error("accessor {accessor}: component type {found:?} not usable as {usage}")]
    ComponentType {
        accessor: usize,
        found: ComponentType,
        usage: &'static str,
    },
}

/// Why a primitive was left out of the model. Logged, never fatal on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("missing POSITION attribute")]
    MissingPosition,

    #[error("missing index accessor")]
    MissingIndices,

    #[error("{attribute} has {found} elements but POSITION has {expected}")]
    CountMismatch {
        attribute: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("no vertices or no indices")]
    Empty,

    #[error("index {index} out of bounds for {vertices} vertices")]
    IndexOutOfBounds { index: u32, vertices: usize },

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}
