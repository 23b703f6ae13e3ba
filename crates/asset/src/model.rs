//! In-memory representation of a decoded container.
//!
//! All cross references are plain indices into the tables of [`AssetModel`].
//! Nothing here is validated on construction; the resolver checks every index
//! and byte range before it touches buffer memory.

use std::collections::BTreeMap;

use crate::texture::TextureData;

pub const POSITION: &str = "POSITION";
pub const NORMAL: &str = "NORMAL";
pub const TEXCOORD_0: &str = "TEXCOORD_0";

/// Scalar type of one accessor component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub const fn size(self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }
}

/// Byte-range window into a buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferView {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
}

/// Typed array description over a buffer view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accessor {
    pub buffer_view: Option<usize>,
    /// Offset relative to the start of the buffer view.
    pub byte_offset: usize,
    pub component_type: ComponentType,
    pub normalized: bool,
    /// Number of elements.
    pub count: usize,
    /// Components per element (1 for SCALAR, 3 for VEC3, ...).
    pub components: usize,
}

/// One drawable unit of a mesh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Primitive {
    pub attributes: BTreeMap<String, usize>,
    pub indices: Option<usize>,
    pub material: Option<usize>,
}

impl Primitive {
    /// Accessor index bound to `name`, if any.
    pub fn attribute(&self, name: &str) -> Option<usize> {
        self.attributes.get(name).copied()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Material {
    pub name: Option<String>,
    pub base_color_texture: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Texture {
    pub source: Option<usize>,
}

/// Decoded image. `pixels` is `None` when the container referenced an image
/// whose pixel format could not be converted.
#[derive(Clone, Debug, Default)]
pub struct Image {
    pub pixels: Option<TextureData>,
}

/// Why a material did not yield a texture. Always soft: render untextured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureResolutionFailure {
    NoMaterial,
    MaterialOutOfRange(usize),
    NoBaseColorTexture,
    TextureOutOfRange(usize),
    NoImageSource,
    ImageOutOfRange(usize),
    NoPixels,
}

/// Decoded container contents. Immutable once populated.
#[derive(Clone, Debug, Default)]
pub struct AssetModel {
    pub buffers: Vec<Vec<u8>>,
    pub buffer_views: Vec<BufferView>,
    pub accessors: Vec<Accessor>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub images: Vec<Image>,
}

impl AssetModel {
    /// Walk material → texture → image, range-checking each hop.
    pub fn base_color_texture(
        &self,
        material: Option<usize>,
    ) -> Result<&TextureData, TextureResolutionFailure> {
        use TextureResolutionFailure as F;

        let mi = material.ok_or(F::NoMaterial)?;
        let material = self.materials.get(mi).ok_or(F::MaterialOutOfRange(mi))?;
        let ti = material.base_color_texture.ok_or(F::NoBaseColorTexture)?;
        let texture = self.textures.get(ti).ok_or(F::TextureOutOfRange(ti))?;
        let ii = texture.source.ok_or(F::NoImageSource)?;
        let image = self.images.get(ii).ok_or(F::ImageOutOfRange(ii))?;
        image.pixels.as_ref().ok_or(F::NoPixels)
    }

    /// Number of primitives across all meshes.
    pub fn primitive_count(&self) -> usize {
        self.meshes.iter().map(|m| m.primitives.len()).sum()
    }
}
