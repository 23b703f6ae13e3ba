//! Asset decoding: container bytes → [`AssetModel`] → GPU-ready primitives.
//!
//! Pipeline: [`container`] fills the model, [`resolve`] turns accessor indices
//! into bounds-checked views, [`assemble`] interleaves vertices and reads indices.

pub mod assemble;
pub mod container;
pub mod error;
pub mod mesh;
pub mod model;
pub mod resolve;
pub mod texture;

#[cfg(test)]
mod fixtures;

pub use assemble::{assemble, assemble_model};
pub use error::{AssetError, ResolveError, SkipReason};
pub use mesh::{IndexArray, IndexWidth, PrimitiveData, Vertex};
pub use model::{AssetModel, TextureResolutionFailure};
pub use texture::TextureData;
