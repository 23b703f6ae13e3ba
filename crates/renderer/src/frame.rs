//! Per-frame driver: drain input, update rotation, build the draw list.
//!
//! Backend-free so the loop can be exercised without a window or device.

use asset::IndexWidth;
use bytemuck::{Pod, Zeroable};
use corelib::camera::Camera;
use corelib::orbit::{InputEvent, RotationState};

use crate::upload::{GpuResources, MeshId, TextureId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    Terminated,
}

/// One indexed draw, in upload order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub mesh: MeshId,
    pub index_count: u32,
    pub index_width: IndexWidth,
    /// `None` binds the white fallback.
    pub texture: Option<TextureId>,
}

/// Uniform block shared by both shader stages.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub mvp: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

#[derive(Debug)]
pub struct Frame<'a> {
    pub uniforms: FrameUniforms,
    pub draws: &'a [DrawCall],
}

pub struct FrameDriver {
    rotation: RotationState,
    state: RunState,
    sensitivity: f32,
    rotation_enabled: bool,
    // Reused every frame.
    draws: Vec<DrawCall>,
    frames: u64,
}

impl FrameDriver {
    pub fn new(sensitivity: f32, rotation_enabled: bool) -> Self {
        Self {
            rotation: RotationState::new(),
            state: RunState::Running,
            sensitivity,
            rotation_enabled,
            draws: Vec::new(),
            frames: 0,
        }
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Quit => {
                if self.state == RunState::Running {
                    log::info!("Quit requested after {} frames", self.frames);
                }
                self.state = RunState::Terminated;
            }
            _ if self.rotation_enabled => self.rotation.apply(event, self.sensitivity),
            _ => {}
        }
    }

    /// Apply queued events in arrival order.
    pub fn drain<I>(&mut self, events: I) -> RunState
    where
        I: IntoIterator<Item = InputEvent>,
    {
        for event in events {
            self.handle_event(event);
        }
        self.state
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Build this frame's uniforms and draw list. Returns `None` once terminated.
    pub fn prepare<B, T>(
        &mut self,
        resources: &GpuResources<B, T>,
        texture: Option<TextureId>,
        camera: &Camera,
    ) -> Option<Frame<'_>> {
        if self.state == RunState::Terminated || resources.is_released() {
            return None;
        }

        let model = self.rotation.matrix();
        let uniforms = FrameUniforms {
            mvp: (camera.proj_view() * model).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
        };

        self.draws.clear();
        self.draws
            .extend(resources.meshes().iter().enumerate().map(|(i, mesh)| DrawCall {
                mesh: MeshId(i),
                index_count: mesh.index_count,
                index_width: mesh.index_width,
                texture,
            }));
        self.frames += 1;

        Some(Frame {
            uniforms,
            draws: &self.draws,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::tests::{MockDevice, textured_model, triangle};
    use crate::upload::upload_scene;
    use asset::{AssetModel, IndexArray};
    use corelib::Mat4;
    use corelib::orbit::DEFAULT_SENSITIVITY;

    fn scene() -> (MockDevice, GpuResources<u32, u32>) {
        let mut dev = MockDevice::default();
        let mut res = GpuResources::new();
        let prims = vec![
            triangle(0, None, IndexArray::U16(vec![0, 1, 2])),
            triangle(1, None, IndexArray::U32(vec![0, 1, 2, 0, 2, 1])),
        ];
        upload_scene(&mut res, &mut dev, &AssetModel::default(), &prims, true).unwrap();
        (dev, res)
    }

    #[test]
    fn draws_follow_upload_order() {
        let (_dev, res) = scene();
        let mut driver = FrameDriver::new(DEFAULT_SENSITIVITY, true);
        let frame = driver.prepare(&res, None, &Camera::viewer(1.0)).unwrap();
        assert_eq!(frame.draws.len(), 2);
        assert_eq!(frame.draws[0].mesh, MeshId(0));
        assert_eq!(frame.draws[0].index_width, IndexWidth::U16);
        assert_eq!(frame.draws[1].index_count, 6);
        assert_eq!(frame.draws[1].index_width, IndexWidth::U32);
    }

    #[test]
    fn dangling_texture_reference_still_draws_untextured() {
        let mut dev = MockDevice::default();
        let mut res = GpuResources::new();
        let mut model = textured_model();
        model.materials[0].base_color_texture = Some(9);
        let prims = vec![
            triangle(0, Some(0), IndexArray::U16(vec![0, 1, 2])),
            triangle(1, Some(0), IndexArray::U16(vec![2, 1, 0])),
        ];
        let texture = upload_scene(&mut res, &mut dev, &model, &prims, true).unwrap();
        assert_eq!(texture, None);

        let mut driver = FrameDriver::new(DEFAULT_SENSITIVITY, true);
        let frame = driver.prepare(&res, texture, &Camera::viewer(1.0)).unwrap();
        assert_eq!(frame.draws.len(), 2);
        assert!(frame.draws.iter().all(|d| d.texture.is_none()));
    }

    #[test]
    fn uploaded_texture_is_bound_to_every_draw() {
        let mut dev = MockDevice::default();
        let mut res = GpuResources::new();
        let prims = vec![triangle(0, Some(0), IndexArray::U16(vec![0, 1, 2]))];
        let texture = upload_scene(&mut res, &mut dev, &textured_model(), &prims, true).unwrap();
        assert!(texture.is_some());

        let mut driver = FrameDriver::new(DEFAULT_SENSITIVITY, true);
        let frame = driver.prepare(&res, texture, &Camera::viewer(1.0)).unwrap();
        assert!(frame.draws.iter().all(|d| d.texture == texture));
    }

    #[test]
    fn drag_updates_model_matrix() {
        let (_dev, res) = scene();
        let mut driver = FrameDriver::new(DEFAULT_SENSITIVITY, true);
        driver.drain([
            InputEvent::PointerDown { x: 100.0, y: 100.0 },
            InputEvent::PointerMove { x: 110.0, y: 115.0 },
        ]);
        let expected = driver.rotation().matrix().to_cols_array_2d();
        let frame = driver.prepare(&res, None, &Camera::viewer(1.0)).unwrap();
        assert_eq!(frame.uniforms.model, expected);
        assert_ne!(frame.uniforms.model, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn rotation_can_be_disabled() {
        let mut driver = FrameDriver::new(DEFAULT_SENSITIVITY, false);
        driver.drain([
            InputEvent::PointerDown { x: 0.0, y: 0.0 },
            InputEvent::PointerMove { x: 50.0, y: 50.0 },
        ]);
        assert_eq!(driver.rotation().matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn quit_stops_frames_but_keeps_events_ordered() {
        let (_dev, res) = scene();
        let mut driver = FrameDriver::new(DEFAULT_SENSITIVITY, true);
        let state = driver.drain([
            InputEvent::PointerDown { x: 0.0, y: 0.0 },
            InputEvent::PointerMove { x: 10.0, y: 0.0 },
            InputEvent::Quit,
            InputEvent::PointerMove { x: 20.0, y: 0.0 },
        ]);
        assert_eq!(state, RunState::Terminated);
        // Events after Quit in the same batch are still applied.
        assert!((driver.rotation().rotation_y - 20.0 * DEFAULT_SENSITIVITY).abs() < 1e-6);
        assert!(driver.prepare(&res, None, &Camera::viewer(1.0)).is_none());
        assert_eq!(driver.frames(), 0);
    }

    #[test]
    fn released_resources_produce_no_frame() {
        let (mut dev, mut res) = scene();
        let mut driver = FrameDriver::new(DEFAULT_SENSITIVITY, true);
        res.release(&mut dev);
        assert!(driver.prepare(&res, None, &Camera::viewer(1.0)).is_none());
    }
}
