//! Plane mesh, camera and transforms for the flame primitive.
//!
//! Matrices are column-major `[[f32; 4]; 4]` (each inner array is a column),
//! which is what a std140 `mat4` expects. Projection targets wgpu clip space
//! (right-handed, depth in `[0, 1]`).

use bytemuck::{Pod, Zeroable};

pub type Mat4 = [[f32; 4]; 4];

pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Width and height of the unscaled plane in world units.
pub const PLANE_SIZE: f32 = 2.0;
/// Grid subdivisions along each axis.
pub const PLANE_SEGMENTS: u16 = 32;
/// World height the plane is stretched to; width follows the container aspect.
pub const PLANE_HEIGHT_UNIT: f32 = 2.0;
const PLANE_WIDTH_FALLBACK: f32 = 1.0;

pub const CAMERA_FOV_DEGREES: f32 = 45.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 100.0;
pub const CAMERA_DISTANCE: f32 = 4.0;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub(crate) const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Subdivided rectangle centred on the origin in the XY plane, facing +Z.
///
/// UV `(0, 1)` sits at the top-left corner and `(1, 0)` at the bottom-right.
#[derive(Debug, Clone)]
pub struct PlaneGeometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32, segments_x: u16, segments_y: u16) -> Self {
        let grid_x = segments_x.max(1);
        let grid_y = segments_y.max(1);
        let columns = grid_x + 1;
        let rows = grid_y + 1;
        let segment_width = width / f32::from(grid_x);
        let segment_height = height / f32::from(grid_y);

        let mut vertices = Vec::with_capacity(usize::from(columns) * usize::from(rows));
        for iy in 0..rows {
            let y = f32::from(iy) * segment_height - height * 0.5;
            for ix in 0..columns {
                let x = f32::from(ix) * segment_width - width * 0.5;
                vertices.push(Vertex {
                    position: [x, -y, 0.0],
                    uv: [
                        f32::from(ix) / f32::from(grid_x),
                        1.0 - f32::from(iy) / f32::from(grid_y),
                    ],
                });
            }
        }

        let mut indices = Vec::with_capacity(usize::from(grid_x) * usize::from(grid_y) * 6);
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + columns * iy;
                let b = ix + columns * (iy + 1);
                let c = ix + 1 + columns * (iy + 1);
                let d = ix + 1 + columns * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self { vertices, indices }
    }

    pub fn flame() -> Self {
        Self::new(PLANE_SIZE, PLANE_SIZE, PLANE_SEGMENTS, PLANE_SEGMENTS)
    }
}

/// Non-uniform scale applied to the plane so it matches the container shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneTransform {
    pub scale: [f32; 3],
}

impl PlaneTransform {
    pub fn for_container(width: u32, height: u32) -> Self {
        let aspect = aspect_ratio(width, height);
        let plane_width = if aspect > 0.0 {
            aspect * PLANE_HEIGHT_UNIT
        } else {
            PLANE_WIDTH_FALLBACK
        };
        Self {
            scale: [plane_width, PLANE_HEIGHT_UNIT, 1.0],
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let [x, y, z] = self.scale;
        [
            [x, 0.0, 0.0, 0.0],
            [0.0, y, 0.0, 0.0],
            [0.0, 0.0, z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }
}

/// Perspective camera placed on the +Z axis looking at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
}

impl Camera {
    pub fn for_container(width: u32, height: u32) -> Self {
        Self {
            fov_y_degrees: CAMERA_FOV_DEGREES,
            aspect: aspect_ratio(width, height),
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            distance: CAMERA_DISTANCE,
        }
    }

    pub fn projection(&self) -> Mat4 {
        let f = 1.0 / (self.fov_y_degrees.to_radians() * 0.5).tan();
        // A degenerate container still needs an invertible projection.
        let aspect = if self.aspect > 0.0 { self.aspect } else { 1.0 };
        let range = self.near - self.far;
        [
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, self.far / range, -1.0],
            [0.0, 0.0, self.near * self.far / range, 0.0],
        ]
    }

    pub fn view(&self) -> Mat4 {
        let mut view = IDENTITY;
        view[3][2] = -self.distance;
        view
    }
}

/// `projection * view * model` for the flame plane.
pub fn model_view_projection(camera: &Camera, plane: &PlaneTransform) -> Mat4 {
    multiply(&multiply(&camera.projection(), &camera.view()), &plane.matrix())
}

pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [[0.0f32; 4]; 4];
    for (column, out_column) in out.iter_mut().enumerate() {
        for (row, cell) in out_column.iter_mut().enumerate() {
            *cell = (0..4).map(|k| a[k][row] * b[column][k]).sum();
        }
    }
    out
}

pub fn transform_point(m: &Mat4, point: [f32; 3]) -> [f32; 4] {
    let [x, y, z] = point;
    let mut out = [0.0f32; 4];
    for (row, cell) in out.iter_mut().enumerate() {
        *cell = m[0][row] * x + m[1][row] * y + m[2][row] * z + m[3][row];
    }
    out
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        0.0
    } else {
        width as f32 / height as f32
    }
}
