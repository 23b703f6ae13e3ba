//! `GpuDevice` over a live wgpu device.

use asset::TextureData;
use wgpu::util::DeviceExt;
use wgpu::{
    BindGroup, BindGroupLayout, BufferUsages, Device, ErrorFilter, Extent3d, Queue, Sampler,
    Texture, TextureDimension, TextureFormat, TextureUsages,
};

use crate::upload::{GpuDevice, UploadError};

/// Color texture together with the bind group the mesh pipeline samples it through.
#[derive(Debug)]
pub struct GpuTexture {
    pub texture: Texture,
    pub bind_group: BindGroup,
}

/// Borrowed device context used during upload and release.
pub struct WgpuDevice<'a> {
    pub(crate) device: &'a Device,
    pub(crate) queue: &'a Queue,
    pub(crate) texture_bgl: &'a BindGroupLayout,
    pub(crate) sampler: &'a Sampler,
}

impl WgpuDevice<'_> {
    /// Run `f` inside validation + out-of-memory error scopes.
    fn scoped<R>(&self, what: &'static str, label: &str, f: impl FnOnce() -> R) -> Result<R, UploadError> {
        self.device.push_error_scope(ErrorFilter::OutOfMemory);
        self.device.push_error_scope(ErrorFilter::Validation);
        let out = f();
        let validation = pollster::block_on(self.device.pop_error_scope());
        let oom = pollster::block_on(self.device.pop_error_scope());

        match validation.or(oom) {
            Some(err) => Err(UploadError::Rejected {
                what,
                label: label.to_owned(),
                reason: err.to_string(),
            }),
            None => Ok(out),
        }
    }

    fn create_buffer(
        &self,
        what: &'static str,
        label: &str,
        contents: &[u8],
        usage: BufferUsages,
    ) -> Result<wgpu::Buffer, UploadError> {
        self.scoped(what, label, || {
            self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
        })
    }
}

impl GpuDevice for WgpuDevice<'_> {
    type Buffer = wgpu::Buffer;
    type Texture = GpuTexture;

    fn create_vertex_buffer(&mut self, label: &str, contents: &[u8]) -> Result<wgpu::Buffer, UploadError> {
        self.create_buffer("vertex buffer", label, contents, BufferUsages::VERTEX)
    }

    fn create_index_buffer(&mut self, label: &str, contents: &[u8]) -> Result<wgpu::Buffer, UploadError> {
        self.create_buffer("index buffer", label, contents, BufferUsages::INDEX)
    }

    fn create_texture(&mut self, label: &str, texture: &TextureData) -> Result<GpuTexture, UploadError> {
        let limit = self.device.limits().max_texture_dimension_2d;
        if texture.width > limit || texture.height > limit {
            return Err(UploadError::Rejected {
                what: "texture",
                label: label.to_owned(),
                reason: format!(
                    "{}x{} exceeds the device limit of {}",
                    texture.width, texture.height, limit
                ),
            });
        }
        self.scoped("texture", label, || {
            create_gpu_texture(self.device, self.queue, self.texture_bgl, self.sampler, label, texture)
        })
    }

    fn destroy_buffer(&mut self, buffer: wgpu::Buffer) {
        buffer.destroy();
    }

    fn destroy_texture(&mut self, texture: GpuTexture) {
        texture.texture.destroy();
    }
}

/// Layout of the base-color group: sampled 2D texture + filtering sampler.
pub(crate) fn texture_bind_group_layout(device: &Device) -> BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Base Color BGL"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

pub(crate) fn base_color_sampler(device: &Device) -> Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Base Color Sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Full mip chain, downsampled on the CPU; pixels are treated as sRGB.
pub(crate) fn create_gpu_texture(
    device: &Device,
    queue: &Queue,
    layout: &BindGroupLayout,
    sampler: &Sampler,
    label: &str,
    data: &TextureData,
) -> GpuTexture {
    let size = Extent3d {
        width: data.width,
        height: data.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: data.mip_level_count(),
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: TextureFormat::Rgba8UnormSrgb,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_level(queue, &texture, 0, data);
    for (i, level) in data.mip_chain().iter().enumerate() {
        write_level(queue, &texture, i as u32 + 1, level);
    }
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    GpuTexture {
        texture,
        bind_group,
    }
}

fn write_level(queue: &Queue, texture: &Texture, mip_level: u32, level: &TextureData) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &level.data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(level.bytes_per_row()),
            rows_per_image: Some(level.height),
        },
        Extent3d {
            width: level.width,
            height: level.height,
            depth_or_array_layers: 1,
        },
    );
}
