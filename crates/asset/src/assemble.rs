//! Vertex assembler: resolved attribute views → interleaved vertices + indices.

use crate::error::{AssetError, SkipReason};
use crate::mesh::{IndexArray, IndexWidth, PrimitiveData, Vertex};
use crate::model::{AssetModel, NORMAL, POSITION, Primitive, TEXCOORD_0};
use crate::resolve::{TypedView, resolve_attribute, resolve_indices};

/// Build the vertex and index arrays for one primitive.
///
/// `POSITION` and indices are mandatory. `NORMAL` and `TEXCOORD_0` default to
/// zero when absent but must match the position count when present.
pub fn assemble(
    model: &AssetModel,
    primitive: &Primitive,
) -> Result<(Vec<Vertex>, IndexArray), SkipReason> {
    let positions = resolve_attribute(model, primitive, POSITION)?
        .into_option()
        .ok_or(SkipReason::MissingPosition)?
        .expect_components(3)?
        .expect_float("position")?;
    let indices = resolve_indices(model, primitive)?
        .into_option()
        .ok_or(SkipReason::MissingIndices)?;

    let count = positions.len();
    let normals = optional_attribute(model, primitive, NORMAL, 3, count)?;
    let uvs = optional_attribute(model, primitive, TEXCOORD_0, 2, count)?;

    if count == 0 || indices.is_empty() {
        return Err(SkipReason::Empty);
    }

    let vertices: Vec<Vertex> = (0..count)
        .map(|i| {
            Vertex::new(
                positions.read_f32(i),
                normals.map_or([0.0; 3], |n| n.read_f32(i)),
                uvs.map_or([0.0; 2], |t| t.read_f32(i)),
            )
        })
        .collect();

    let indices = read_indices(&indices);
    if cfg!(debug_assertions) {
        if let Some(max) = indices.max() {
            if max as usize >= count {
                return Err(SkipReason::IndexOutOfBounds {
                    index: max,
                    vertices: count,
                });
            }
        }
    }

    Ok((vertices, indices))
}

fn optional_attribute<'m>(
    model: &'m AssetModel,
    primitive: &Primitive,
    name: &'static str,
    components: usize,
    expected: usize,
) -> Result<Option<TypedView<'m>>, SkipReason> {
    let Some(view) = resolve_attribute(model, primitive, name)?.into_option() else {
        return Ok(None);
    };
    let view = view.expect_components(components)?.expect_float(name)?;
    if view.len() != expected {
        return Err(SkipReason::CountMismatch {
            attribute: name,
            expected,
            found: view.len(),
        });
    }
    Ok(Some(view))
}

fn read_indices(view: &TypedView<'_>) -> IndexArray {
    let n = view.len();
    match view.index_width() {
        Some(IndexWidth::U32) => IndexArray::U32((0..n).map(|i| view.read_index(i)).collect()),
        // 8- and 16-bit sources both fit.
        _ => IndexArray::U16((0..n).map(|i| view.read_index(i) as u16).collect()),
    }
}

/// Assemble every primitive of every mesh, dropping the ones that cannot be drawn.
pub fn assemble_model(model: &AssetModel) -> Result<Vec<PrimitiveData>, AssetError> {
    if model.meshes.is_empty() {
        return Err(AssetError::NoMeshes);
    }

    let mut out = Vec::with_capacity(model.primitive_count());
    let mut skipped = 0;

    for (mi, mesh) in model.meshes.iter().enumerate() {
        let name = mesh.name.as_deref().unwrap_or("unnamed");
        if mesh.primitives.is_empty() {
            log::warn!("Mesh {} '{}' has no primitives", mi, name);
            continue;
        }

        for (pi, primitive) in mesh.primitives.iter().enumerate() {
            match assemble(model, primitive) {
                Ok((vertices, indices)) => {
                    log::debug!(
                        "Mesh '{}' primitive {}: {} vertices, {} indices ({:?})",
                        name,
                        pi,
                        vertices.len(),
                        indices.len(),
                        indices.width()
                    );
                    out.push(PrimitiveData {
                        mesh: mi,
                        primitive: pi,
                        material: primitive.material,
                        vertices,
                        indices,
                    });
                }
                Err(reason) => {
                    skipped += 1;
                    log::warn!("Skipping primitive {} of mesh '{}': {}", pi, name, reason);
                }
            }
        }
    }

    if out.is_empty() {
        return Err(AssetError::NoPrimitives { skipped });
    }
    Ok(out)
}
