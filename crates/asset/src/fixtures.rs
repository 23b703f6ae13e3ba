//! Test helpers for building synthetic models.

use std::collections::BTreeMap;

use crate::model::{Accessor, AssetModel, BufferView, ComponentType, Mesh, Primitive};

/// Packs every accessor into its own 4-byte-aligned view of buffer 0.
#[derive(Default)]
pub struct ModelBuilder {
    bytes: Vec<u8>,
    model: AssetModel,
}

impl ModelBuilder {
    pub fn raw_accessor(
        &mut self,
        data: &[u8],
        component_type: ComponentType,
        count: usize,
        components: usize,
        normalized: bool,
    ) -> usize {
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        let byte_offset = self.bytes.len();
        self.bytes.extend_from_slice(data);
        self.model.buffer_views.push(BufferView {
            buffer: 0,
            byte_offset,
            byte_length: data.len(),
            byte_stride: None,
        });
        self.model.accessors.push(Accessor {
            buffer_view: Some(self.model.buffer_views.len() - 1),
            byte_offset: 0,
            component_type,
            normalized,
            count,
            components,
        });
        self.model.accessors.len() - 1
    }

    pub fn f32_accessor(&mut self, values: &[f32], components: usize) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.raw_accessor(&bytes, ComponentType::F32, values.len() / components, components, false)
    }

    pub fn u16_indices(&mut self, values: &[u16]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.raw_accessor(&bytes, ComponentType::U16, values.len(), 1, false)
    }

    pub fn u32_indices(&mut self, values: &[u32]) -> usize {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.raw_accessor(&bytes, ComponentType::U32, values.len(), 1, false)
    }

    /// Build a primitive and append it to mesh 0.
    pub fn primitive(&mut self, attributes: &[(&str, usize)], indices: Option<usize>) -> Primitive {
        let primitive = Primitive {
            attributes: attributes
                .iter()
                .map(|(name, acc)| (name.to_string(), *acc))
                .collect::<BTreeMap<_, _>>(),
            indices,
            material: None,
        };
        if self.model.meshes.is_empty() {
            self.model.meshes.push(Mesh::default());
        }
        self.model.meshes[0].primitives.push(primitive.clone());
        primitive
    }

    pub fn finish(mut self) -> AssetModel {
        self.model.buffers = vec![self.bytes];
        self.model
    }
}
