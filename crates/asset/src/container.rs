//! Container parser: GLB / embedded glTF bytes → [`AssetModel`].
//!
//! Parsing and chunk handling are delegated to the `gltf` crate; this module
//! only copies its tables into our index-based model and converts embedded
//! images to RGBA8.

use std::path::Path;

use gltf::accessor::DataType;
use gltf::mesh::Mode;
use gltf::Semantic;
use image::{DynamicImage, ImageBuffer};

use crate::error::AssetError;
use crate::model::{
    Accessor, AssetModel, BufferView, ComponentType, Image, Material, Mesh, Primitive, Texture,
};
use crate::texture::TextureData;

/// Read and parse a container file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<AssetModel, AssetError> {
    let path = path.as_ref();
    log::info!("Loading container from {:?}", path);
    let bytes = std::fs::read(path).map_err(|e| AssetError::Io(path.to_path_buf(), e))?;
    load_from_slice(&bytes)
}

/// Parse a container held in memory. Only self-contained assets (GLB, or glTF
/// with data URIs) are supported.
pub fn load_from_slice(bytes: &[u8]) -> Result<AssetModel, AssetError> {
    let (document, buffers, images) =
        gltf::import_slice(bytes).map_err(|e| AssetError::Parse(e.to_string()))?;

    log::info!(
        "Container: {} scenes, {} meshes, {} buffers, {} images",
        document.scenes().len(),
        document.meshes().len(),
        buffers.len(),
        images.len()
    );

    let model = AssetModel {
        buffers: buffers.into_iter().map(|b| b.0).collect(),
        buffer_views: document
            .views()
            .map(|v| BufferView {
                buffer: v.buffer().index(),
                byte_offset: v.offset(),
                byte_length: v.length(),
                byte_stride: v.stride(),
            })
            .collect(),
        accessors: document
            .accessors()
            .map(|a| Accessor {
                buffer_view: a.view().map(|v| v.index()),
                byte_offset: a.offset(),
                component_type: component_type(a.data_type()),
                normalized: a.normalized(),
                count: a.count(),
                components: a.dimensions().multiplicity(),
            })
            .collect(),
        meshes: document.meshes().map(convert_mesh).collect(),
        materials: document
            .materials()
            .map(|m| Material {
                name: m.name().map(str::to_owned),
                base_color_texture: m
                    .pbr_metallic_roughness()
                    .base_color_texture()
                    .map(|info| info.texture().index()),
            })
            .collect(),
        textures: document
            .textures()
            .map(|t| Texture {
                source: Some(t.source().index()),
            })
            .collect(),
        images: images
            .into_iter()
            .enumerate()
            .map(|(i, data)| {
                let pixels = convert_image(data);
                if pixels.is_none() {
                    log::warn!("Image {} has an unsupported pixel layout; ignoring", i);
                }
                Image { pixels }
            })
            .collect(),
    };

    Ok(model)
}

fn component_type(data_type: DataType) -> ComponentType {
    match data_type {
        DataType::I8 => ComponentType::I8,
        DataType::U8 => ComponentType::U8,
        DataType::I16 => ComponentType::I16,
        DataType::U16 => ComponentType::U16,
        DataType::U32 => ComponentType::U32,
        DataType::F32 => ComponentType::F32,
    }
}

fn semantic_name(semantic: &Semantic) -> Option<String> {
    let name = match semantic {
        Semantic::Positions => "POSITION".to_owned(),
        Semantic::Normals => "NORMAL".to_owned(),
        Semantic::Tangents => "TANGENT".to_owned(),
        Semantic::TexCoords(n) => format!("TEXCOORD_{n}"),
        Semantic::Colors(n) => format!("COLOR_{n}"),
        Semantic::Joints(n) => format!("JOINTS_{n}"),
        Semantic::Weights(n) => format!("WEIGHTS_{n}"),
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(name)
}

fn convert_mesh(mesh: gltf::Mesh<'_>) -> Mesh {
    let name = mesh.name().map(str::to_owned);
    let primitives = mesh
        .primitives()
        .filter(|p| {
            let triangles = p.mode() == Mode::Triangles;
            if !triangles {
                log::warn!(
                    "Mesh '{}' primitive {} uses {:?}; only triangle lists are drawn",
                    name.as_deref().unwrap_or("unnamed"),
                    p.index(),
                    p.mode()
                );
            }
            triangles
        })
        .map(|p| Primitive {
            attributes: p
                .attributes()
                .filter_map(|(semantic, accessor)| {
                    semantic_name(&semantic).map(|n| (n, accessor.index()))
                })
                .collect(),
            indices: p.indices().map(|a| a.index()),
            material: p.material().index(),
        })
        .collect();
    Mesh { name, primitives }
}

fn ne_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .collect()
}

fn ne_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn convert_image(data: gltf::image::Data) -> Option<TextureData> {
    use gltf::image::Format;

    let (w, h) = (data.width, data.height);
    let px = data.pixels;
    let img = match data.format {
        Format::R8G8B8A8 => return TextureData::from_rgba8(w, h, px),
        Format::R8 => DynamicImage::ImageLuma8(ImageBuffer::from_raw(w, h, px)?),
        Format::R8G8 => DynamicImage::ImageLumaA8(ImageBuffer::from_raw(w, h, px)?),
        Format::R8G8B8 => DynamicImage::ImageRgb8(ImageBuffer::from_raw(w, h, px)?),
        Format::R16 => DynamicImage::ImageLuma16(ImageBuffer::from_raw(w, h, ne_u16(&px))?),
        Format::R16G16 => DynamicImage::ImageLumaA16(ImageBuffer::from_raw(w, h, ne_u16(&px))?),
        Format::R16G16B16 => DynamicImage::ImageRgb16(ImageBuffer::from_raw(w, h, ne_u16(&px))?),
        Format::R16G16B16A16 => {
            DynamicImage::ImageRgba16(ImageBuffer::from_raw(w, h, ne_u16(&px))?)
        }
        Format::R32G32B32FLOAT => {
            DynamicImage::ImageRgb32F(ImageBuffer::from_raw(w, h, ne_f32(&px))?)
        }
        Format::R32G32B32A32FLOAT => {
            DynamicImage::ImageRgba32F(ImageBuffer::from_raw(w, h, ne_f32(&px))?)
        }
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    TextureData::from_image(img)
}
