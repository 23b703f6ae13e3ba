//! Attribute resolver: accessor → buffer view → buffer.
//!
//! A [`TypedView`] is only handed out after the whole element range has been
//! checked against both the buffer view window and the underlying blob, so the
//! read methods never leave the slice they were built from.

use crate::error::ResolveError;
use crate::mesh::IndexWidth;
use crate::model::{AssetModel, ComponentType, Primitive};

/// Outcome of a lookup that may legitimately find nothing.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolved<T> {
    Present(T),
    Absent,
}

impl<T> Resolved<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Resolved::Present(v) => Some(v),
            Resolved::Absent => None,
        }
    }
}

/// Bounds-checked strided view over accessor elements.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TypedView<'a> {
    /// Starts at element 0 and ends at the last byte of the last element.
    bytes: &'a [u8],
    accessor: usize,
    stride: usize,
    component_type: ComponentType,
    components: usize,
    normalized: bool,
    count: usize,
}

impl<'a> TypedView<'a> {
    /// Build a view of `count` elements starting `offset` bytes into `window`.
    /// Fails when any element would extend past the window.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        window: &'a [u8],
        offset: usize,
        stride: usize,
        component_type: ComponentType,
        components: usize,
        normalized: bool,
        count: usize,
        accessor: usize,
    ) -> Result<Self, ResolveError> {
        let Some(element_size) = components.checked_mul(component_type.size()) else {
            return Err(ResolveError::ByteRange {
                what: "element",
                start: offset,
                end: usize::MAX,
                bound: window.len(),
            });
        };
        if stride < element_size {
            return Err(ResolveError::StrideTooSmall {
                accessor,
                stride,
                element_size,
            });
        }

        let span = match count {
            0 => Some(0),
            n => (n - 1)
                .checked_mul(stride)
                .and_then(|v| v.checked_add(element_size)),
        };
        let end = span.and_then(|s| offset.checked_add(s)).unwrap_or(usize::MAX);
        if end > window.len() {
            return Err(ResolveError::ByteRange {
                what: "buffer view",
                start: offset,
                end,
                bound: window.len(),
            });
        }

        Ok(Self {
            bytes: &window[offset..end],
            accessor,
            stride,
            component_type,
            components,
            normalized,
            count,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    fn slot(&self, i: usize) -> &'a [u8] {
        assert!(i < self.count, "element {i} out of range ({})", self.count);
        let start = i * self.stride;
        &self.bytes[start..start + self.components * self.component_type.size()]
    }

    /// Require exactly `expected` components per element.
    pub fn expect_components(self, expected: usize) -> Result<Self, ResolveError> {
        if self.components != expected {
            return Err(ResolveError::Shape {
                accessor: self.accessor,
                expected,
                found: self.components,
            });
        }
        Ok(self)
    }

    /// Require components that decode to floats: `F32`, or a normalized integer.
    pub fn expect_float(self, usage: &'static str) -> Result<Self, ResolveError> {
        let ok = match self.component_type {
            ComponentType::F32 => true,
            ComponentType::U32 => false,
            _ => self.normalized,
        };
        if !ok {
            return Err(ResolveError::ComponentType {
                accessor: self.accessor,
                found: self.component_type,
                usage,
            });
        }
        Ok(self)
    }

    /// GPU index width this view maps to. 8-bit indices widen to 16-bit.
    pub fn index_width(&self) -> Option<IndexWidth> {
        match self.component_type {
            ComponentType::U8 | ComponentType::U16 => Some(IndexWidth::U16),
            ComponentType::U32 => Some(IndexWidth::U32),
            _ => None,
        }
    }

    /// Decode element `i` as `N` floats.
    ///
    /// Panics if `i >= len()` or `N` differs from the component count. Call
    /// [`expect_components`](Self::expect_components) and
    /// [`expect_float`](Self::expect_float) first.
    pub fn read_f32<const N: usize>(&self, i: usize) -> [f32; N] {
        assert_eq!(N, self.components, "component count mismatch");
        let bytes = self.slot(i);
        let size = self.component_type.size();
        let mut out = [0.0; N];
        for (c, slot) in out.iter_mut().enumerate() {
            *slot = decode_float(self.component_type, &bytes[c * size..(c + 1) * size]);
        }
        out
    }

    /// Decode element `i` of an unsigned integer scalar view.
    ///
    /// Panics if `i >= len()`.
    pub fn read_index(&self, i: usize) -> u32 {
        let b = self.slot(i);
        match self.component_type {
            ComponentType::U8 => u32::from(b[0]),
            ComponentType::U16 => u32::from(u16::from_le_bytes([b[0], b[1]])),
            ComponentType::U32 => u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            other => panic!("{other:?} is not an index component type"),
        }
    }
}

/// glTF normalization: unsigned → [0,1], signed → [-1,1].
fn decode_float(component_type: ComponentType, b: &[u8]) -> f32 {
    match component_type {
        ComponentType::F32 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        ComponentType::U8 => f32::from(b[0]) / 255.0,
        ComponentType::U16 => f32::from(u16::from_le_bytes([b[0], b[1]])) / 65535.0,
        ComponentType::I8 => (f32::from(b[0] as i8) / 127.0).max(-1.0),
        ComponentType::I16 => (f32::from(i16::from_le_bytes([b[0], b[1]])) / 32767.0).max(-1.0),
        ComponentType::U32 => u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32,
    }
}

fn lookup<'m, T>(table: &'m [T], index: usize, name: &'static str) -> Result<&'m T, ResolveError> {
    table.get(index).ok_or(ResolveError::IndexOutOfRange {
        table: name,
        index,
        len: table.len(),
    })
}

/// Resolve accessor `index` into a typed view.
pub fn resolve_accessor(model: &AssetModel, index: usize) -> Result<TypedView<'_>, ResolveError> {
    let accessor = lookup(&model.accessors, index, "accessor")?;
    let view_index = accessor
        .buffer_view
        .ok_or(ResolveError::MissingBufferView { accessor: index })?;
    let view = lookup(&model.buffer_views, view_index, "buffer view")?;
    let buffer = lookup(&model.buffers, view.buffer, "buffer")?;

    let view_end = view
        .byte_offset
        .checked_add(view.byte_length)
        .unwrap_or(usize::MAX);
    if view_end > buffer.len() {
        return Err(ResolveError::ByteRange {
            what: "buffer",
            start: view.byte_offset,
            end: view_end,
            bound: buffer.len(),
        });
    }
    let window = &buffer[view.byte_offset..view_end];

    // Overflow is reported by `TypedView::new`.
    let packed = accessor
        .components
        .checked_mul(accessor.component_type.size())
        .unwrap_or(usize::MAX);
    let stride = match view.byte_stride {
        Some(s) if s != 0 => s,
        _ => packed,
    };

    TypedView::new(
        window,
        accessor.byte_offset,
        stride,
        accessor.component_type,
        accessor.components,
        accessor.normalized,
        accessor.count,
        index,
    )
}

/// Resolve a named vertex attribute of `primitive`.
pub fn resolve_attribute<'m>(
    model: &'m AssetModel,
    primitive: &Primitive,
    name: &str,
) -> Result<Resolved<TypedView<'m>>, ResolveError> {
    match primitive.attribute(name) {
        Some(index) => resolve_accessor(model, index).map(Resolved::Present),
        None => Ok(Resolved::Absent),
    }
}

/// Resolve the index accessor of `primitive`, checking it is an unsigned scalar.
pub fn resolve_indices<'m>(
    model: &'m AssetModel,
    primitive: &Primitive,
) -> Result<Resolved<TypedView<'m>>, ResolveError> {
    let Some(index) = primitive.indices else {
        return Ok(Resolved::Absent);
    };
    let view = resolve_accessor(model, index)?.expect_components(1)?;
    if view.index_width().is_none() {
        return Err(ResolveError::ComponentType {
            accessor: index,
            found: view.component_type(),
            usage: "index",
        });
    }
    Ok(Resolved::Present(view))
}
