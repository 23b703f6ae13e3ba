//! CPU-side mesh representation produced by the assembler.

use bytemuck::{Pod, Zeroable};

/// Interleaved vertex with position/normal/uv. Values are in object space.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Element width of an index buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexWidth {
    U16,
    U32,
}

impl IndexWidth {
    pub const fn size(self) -> usize {
        match self {
            IndexWidth::U16 => 2,
            IndexWidth::U32 => 4,
        }
    }
}

/// Index array keeping the width declared by the source accessor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexArray {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexArray {
    pub fn width(&self) -> IndexWidth {
        match self {
            IndexArray::U16(_) => IndexWidth::U16,
            IndexArray::U32(_) => IndexWidth::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexArray::U16(v) => v.len(),
            IndexArray::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexArray::U16(v) => bytemuck::cast_slice(v),
            IndexArray::U32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Largest index value, if any.
    pub fn max(&self) -> Option<u32> {
        match self {
            IndexArray::U16(v) => v.iter().copied().max().map(u32::from),
            IndexArray::U32(v) => v.iter().copied().max(),
        }
    }
}

/// One assembled primitive, ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveData {
    pub mesh: usize,
    pub primitive: usize,
    pub material: Option<usize>,
    pub vertices: Vec<Vertex>,
    pub indices: IndexArray,
}

impl PrimitiveData {
    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }
}
