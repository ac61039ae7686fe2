use bytemuck::{Pod, Zeroable};

use crate::geometry::{model_view_projection, Camera, Mat4, PlaneTransform};

/// CPU copy of the `FlameParams` std140 block.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FlameUniforms {
    pub mvp: Mat4,
    pub time: f32,
    pub intensity: f32,
    pub _padding: [f32; 2],
}

unsafe impl Zeroable for FlameUniforms {}
unsafe impl Pod for FlameUniforms {}

impl FlameUniforms {
    pub fn new(camera: &Camera, plane: &PlaneTransform, intensity: f32) -> Self {
        Self {
            mvp: model_view_projection(camera, plane),
            time: 0.0,
            intensity,
            _padding: [0.0; 2],
        }
    }

    pub fn set_transform(&mut self, camera: &Camera, plane: &PlaneTransform) {
        self.mvp = model_view_projection(camera, plane);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, offset_of, size_of};

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(size_of::<FlameUniforms>(), 80);
        assert_eq!(align_of::<FlameUniforms>(), 16);
        assert_eq!(offset_of!(FlameUniforms, time), 64);
        assert_eq!(offset_of!(FlameUniforms, intensity), 68);
    }

    #[test]
    fn starts_at_time_zero() {
        let camera = Camera::for_container(640, 480);
        let plane = PlaneTransform::for_container(640, 480);
        let uniforms = FlameUniforms::new(&camera, &plane, 0.5);
        assert_eq!(uniforms.time, 0.0);
        assert_eq!(uniforms.intensity, 0.5);
        assert_eq!(uniforms.mvp, model_view_projection(&camera, &plane));
    }
}
