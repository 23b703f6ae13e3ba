//! GPU upload layer: write-once vertex/index buffers and textures.
//!
//! The device side is abstracted behind [`GpuDevice`] so ownership and release
//! rules live in one place regardless of backend. [`GpuResources`] owns every
//! handle it creates until [`GpuResources::release`] runs.

use asset::{AssetModel, IndexArray, IndexWidth, PrimitiveData, TextureData, Vertex};

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("device rejected {what} '{label}': {reason}")]
    Rejected {
        what: &'static str,
        label: String,
        reason: String,
    },

    #[error("refusing to upload empty {what} '{label}'")]
    Empty { what: &'static str, label: String },

    #[error("'{label}' has {count} indices, more than a draw call can address")]
    TooManyIndices { label: String, count: usize },
}

/// Device operations the upload layer needs.
pub trait GpuDevice {
    type Buffer;
    type Texture;

    fn create_vertex_buffer(&mut self, label: &str, contents: &[u8]) -> Result<Self::Buffer, UploadError>;
    fn create_index_buffer(&mut self, label: &str, contents: &[u8]) -> Result<Self::Buffer, UploadError>;
    fn create_texture(&mut self, label: &str, texture: &TextureData) -> Result<Self::Texture, UploadError>;
    fn destroy_buffer(&mut self, buffer: Self::Buffer);
    fn destroy_texture(&mut self, texture: Self::Texture);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Device-resident geometry of one primitive.
#[derive(Debug)]
pub struct MeshHandle<B> {
    pub vertex_buffer: B,
    pub index_buffer: B,
    pub index_count: u32,
    pub index_width: IndexWidth,
}

/// Owner of all uploaded handles for the session.
#[derive(Debug)]
pub struct GpuResources<B, T> {
    meshes: Vec<MeshHandle<B>>,
    textures: Vec<T>,
    released: bool,
}

impl<B, T> Default for GpuResources<B, T> {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            textures: Vec::new(),
            released: false,
        }
    }
}

impl<B, T> GpuResources<B, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and fill vertex + index buffers for one primitive.
    pub fn upload<D>(
        &mut self,
        device: &mut D,
        label: &str,
        vertices: &[Vertex],
        indices: &IndexArray,
    ) -> Result<MeshId, UploadError>
    where
        D: GpuDevice<Buffer = B, Texture = T>,
    {
        if vertices.is_empty() || indices.is_empty() {
            return Err(UploadError::Empty {
                what: "mesh",
                label: label.to_owned(),
            });
        }
        let index_count = u32::try_from(indices.len()).map_err(|_| UploadError::TooManyIndices {
            label: label.to_owned(),
            count: indices.len(),
        })?;

        let vertex_buffer = device.create_vertex_buffer(label, bytemuck::cast_slice(vertices))?;
        let index_buffer = match device.create_index_buffer(label, indices.as_bytes()) {
            Ok(buf) => buf,
            Err(e) => {
                device.destroy_buffer(vertex_buffer);
                return Err(e);
            }
        };

        log::debug!(
            "Uploaded '{}': {} vertices ({} bytes), {} {:?} indices",
            label,
            vertices.len(),
            std::mem::size_of_val(vertices),
            index_count,
            indices.width()
        );

        self.meshes.push(MeshHandle {
            vertex_buffer,
            index_buffer,
            index_count,
            index_width: indices.width(),
        });
        Ok(MeshId(self.meshes.len() - 1))
    }

    /// Upload decoded pixels. Missing or inconsistent pixel data yields `Ok(None)`.
    pub fn upload_texture<D>(
        &mut self,
        device: &mut D,
        label: &str,
        image: Option<&TextureData>,
    ) -> Result<Option<TextureId>, UploadError>
    where
        D: GpuDevice<Buffer = B, Texture = T>,
    {
        let Some(image) = image else {
            return Ok(None);
        };
        if !image.is_valid() {
            log::warn!(
                "Texture '{}' has {} bytes for {}x{}; rendering untextured",
                label,
                image.data.len(),
                image.width,
                image.height
            );
            return Ok(None);
        }

        let texture = device.create_texture(label, image)?;
        log::debug!("Uploaded texture '{}' {}x{}", label, image.width, image.height);
        self.textures.push(texture);
        Ok(Some(TextureId(self.textures.len() - 1)))
    }

    pub fn meshes(&self) -> &[MeshHandle<B>] {
        &self.meshes
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshHandle<B>> {
        self.meshes.get(id.0)
    }

    pub fn texture(&self, id: TextureId) -> Option<&T> {
        self.textures.get(id.0)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Destroy every handle. Later calls do nothing.
    pub fn release<D>(&mut self, device: &mut D)
    where
        D: GpuDevice<Buffer = B, Texture = T>,
    {
        if self.released {
            return;
        }
        let (meshes, textures) = (self.meshes.len(), self.textures.len());
        for mesh in self.meshes.drain(..) {
            device.destroy_buffer(mesh.vertex_buffer);
            device.destroy_buffer(mesh.index_buffer);
        }
        for texture in self.textures.drain(..) {
            device.destroy_texture(texture);
        }
        self.released = true;
        log::info!("Released {} meshes and {} textures", meshes, textures);
    }
}

/// Upload every assembled primitive and, if requested, the first base-color
/// texture any of them resolves to.
pub fn upload_scene<D>(
    resources: &mut GpuResources<D::Buffer, D::Texture>,
    device: &mut D,
    model: &AssetModel,
    primitives: &[PrimitiveData],
    with_texture: bool,
) -> Result<Option<TextureId>, UploadError>
where
    D: GpuDevice,
{
    for prim in primitives {
        let label = format!("mesh{}/prim{}", prim.mesh, prim.primitive);
        resources.upload(device, &label, &prim.vertices, &prim.indices)?;
    }

    if !with_texture {
        return Ok(None);
    }

    let mut image = None;
    for prim in primitives {
        match model.base_color_texture(prim.material) {
            Ok(tex) => {
                image = Some(tex);
                break;
            }
            Err(reason) => log::debug!(
                "mesh{}/prim{}: no base color texture ({:?})",
                prim.mesh,
                prim.primitive,
                reason
            ),
        }
    }
    let texture = resources.upload_texture(device, "base_color", image)?;
    if texture.is_none() {
        log::warn!("No usable base color texture; rendering untextured");
    }
    Ok(texture)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use asset::model::{Image, Material, Texture};
    use std::collections::BTreeSet;

    /// Records every create/destroy; handles are plain ids.
    #[derive(Default)]
    pub struct MockDevice {
        next: u32,
        pub live: BTreeSet<u32>,
        pub destroyed: Vec<u32>,
        pub fail_index_buffers: bool,
        pub fail_textures: bool,
    }

    impl MockDevice {
        fn alloc(&mut self) -> u32 {
            self.next += 1;
            self.live.insert(self.next);
            self.next
        }

        fn free(&mut self, id: u32) {
            assert!(self.live.remove(&id), "handle {id} destroyed twice");
            self.destroyed.push(id);
        }
    }

    impl GpuDevice for MockDevice {
        type Buffer = u32;
        type Texture = u32;

        fn create_vertex_buffer(&mut self, _: &str, contents: &[u8]) -> Result<u32, UploadError> {
            assert_eq!(contents.len() % std::mem::size_of::<Vertex>(), 0);
            Ok(self.alloc())
        }

        fn create_index_buffer(&mut self, label: &str, _: &[u8]) -> Result<u32, UploadError> {
            if self.fail_index_buffers {
                return Err(UploadError::Rejected {
                    what: "index buffer",
                    label: label.to_owned(),
                    reason: "out of memory".into(),
                });
            }
            Ok(self.alloc())
        }

        fn create_texture(&mut self, label: &str, _: &TextureData) -> Result<u32, UploadError> {
            if self.fail_textures {
                return Err(UploadError::Rejected {
                    what: "texture",
                    label: label.to_owned(),
                    reason: "too large".into(),
                });
            }
            Ok(self.alloc())
        }

        fn destroy_buffer(&mut self, buffer: u32) {
            self.free(buffer);
        }

        fn destroy_texture(&mut self, texture: u32) {
            self.free(texture);
        }
    }

    pub fn triangle(mesh: usize, material: Option<usize>, indices: IndexArray) -> PrimitiveData {
        PrimitiveData {
            mesh,
            primitive: 0,
            material,
            vertices: vec![Vertex::default(); 3],
            indices,
        }
    }

    pub fn textured_model() -> AssetModel {
        AssetModel {
            materials: vec![Material {
                name: None,
                base_color_texture: Some(0),
            }],
            textures: vec![Texture { source: Some(0) }],
            images: vec![Image {
                pixels: Some(TextureData::white()),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn upload_keeps_index_width_and_count() {
        let mut dev = MockDevice::default();
        let mut res = GpuResources::new();
        let a = res
            .upload(&mut dev, "a", &[Vertex::default(); 3], &IndexArray::U16(vec![0, 1, 2]))
            .unwrap();
        let b = res
            .upload(&mut dev, "b", &[Vertex::default(); 3], &IndexArray::U32(vec![0, 1, 2, 2, 1, 0]))
            .unwrap();
        assert_eq!(res.mesh(a).unwrap().index_width, IndexWidth::U16);
        assert_eq!(res.mesh(b).unwrap().index_width, IndexWidth::U32);
        assert_eq!(res.mesh(b).unwrap().index_count, 6);
        assert_eq!(dev.live.len(), 4);
    }

    #[test]
    fn failed_index_buffer_does_not_leak_vertex_buffer() {
        let mut dev = MockDevice {
            fail_index_buffers: true,
            ..Default::default()
        };
        let mut res: GpuResources<u32, u32> = GpuResources::new();
        let err = res.upload(&mut dev, "a", &[Vertex::default(); 3], &IndexArray::U16(vec![0, 1, 2]));
        assert!(matches!(err, Err(UploadError::Rejected { .. })));
        assert!(dev.live.is_empty());
        assert!(res.meshes().is_empty());
    }

    #[test]
    fn empty_upload_is_rejected() {
        let mut dev = MockDevice::default();
        let mut res: GpuResources<u32, u32> = GpuResources::new();
        let err = res.upload(&mut dev, "e", &[], &IndexArray::U16(vec![]));
        assert!(matches!(err, Err(UploadError::Empty { .. })));
    }

    #[test]
    fn absent_or_broken_image_is_soft() {
        let mut dev = MockDevice::default();
        let mut res: GpuResources<u32, u32> = GpuResources::new();
        assert_eq!(res.upload_texture(&mut dev, "t", None).unwrap(), None);

        let mut broken = TextureData::white();
        broken.width = 4;
        assert_eq!(res.upload_texture(&mut dev, "t", Some(&broken)).unwrap(), None);
        assert!(dev.live.is_empty());
    }

    #[test]
    fn device_texture_rejection_is_fatal() {
        let mut dev = MockDevice {
            fail_textures: true,
            ..Default::default()
        };
        let mut res: GpuResources<u32, u32> = GpuResources::new();
        assert!(res.upload_texture(&mut dev, "t", Some(&TextureData::white())).is_err());
    }

    #[test]
    fn release_destroys_everything_once() {
        let mut dev = MockDevice::default();
        let mut res = GpuResources::new();
        let model = textured_model();
        let prims = vec![
            triangle(0, Some(0), IndexArray::U16(vec![0, 1, 2])),
            triangle(1, None, IndexArray::U32(vec![0, 1, 2])),
        ];
        let tex = upload_scene(&mut res, &mut dev, &model, &prims, true).unwrap();
        assert!(tex.is_some());
        assert_eq!(dev.live.len(), 5);

        res.release(&mut dev);
        assert!(res.is_released());
        assert!(dev.live.is_empty());
        assert_eq!(dev.destroyed.len(), 5);

        res.release(&mut dev);
        assert_eq!(dev.destroyed.len(), 5);
    }

    #[test]
    fn out_of_range_material_texture_yields_none() {
        let mut dev = MockDevice::default();
        let mut res = GpuResources::new();
        let mut model = textured_model();
        model.materials[0].base_color_texture = Some(9);
        let prims = vec![triangle(0, Some(0), IndexArray::U16(vec![0, 1, 2]))];
        let tex = upload_scene(&mut res, &mut dev, &model, &prims, true).unwrap();
        assert_eq!(tex, None);
        assert_eq!(res.meshes().len(), 1);
    }

    #[test]
    fn texture_stage_can_be_disabled() {
        let mut dev = MockDevice::default();
        let mut res = GpuResources::new();
        let prims = vec![triangle(0, Some(0), IndexArray::U16(vec![0, 1, 2]))];
        let tex = upload_scene(&mut res, &mut dev, &textured_model(), &prims, false).unwrap();
        assert_eq!(tex, None);
        assert_eq!(dev.live.len(), 2);
    }
}
