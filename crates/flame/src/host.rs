//! Seams between the flame effect and the display environment it lives in.
//!
//! A [`Host`] plays the part a browser page plus 3D library would: it finds
//! display regions by identifier, hands out render surfaces, builds renderers
//! for them and drives per-frame callbacks. [`crate::window::WindowHost`]
//! implements it on top of `winit` and `wgpu`.

use crate::geometry::{Camera, PlaneTransform};
use crate::texture::FlameImage;
use crate::types::RenderOptions;

/// A display region the flame can be rendered into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    /// Current size in physical pixels.
    pub width: u32,
    pub height: u32,
}

/// Opaque ticket for a scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Everything a renderer needs to build the flame scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneDescriptor {
    pub width: u32,
    pub height: u32,
    pub camera: Camera,
    pub plane: PlaneTransform,
    /// Normalized intensity in `[0, 1]`.
    pub intensity: f32,
    pub options: RenderOptions,
}

/// Why a frame could not be drawn.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Swapchain lost or outdated; reconfigure and try again next frame.
    #[error("render surface lost or outdated")]
    SurfaceLost,
    #[error("timed out acquiring the next frame")]
    Timeout,
    #[error("out of GPU memory")]
    OutOfMemory,
    #[error("render failed: {0}")]
    Other(String),
}

impl RenderError {
    /// Whether the session can keep animating after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RenderError::SurfaceLost | RenderError::Timeout)
    }
}

/// Live flame scene: a plane with `time`/`intensity` uniforms and a texture slot.
pub trait FlameRenderer {
    fn set_time(&mut self, time: f32);
    fn set_intensity(&mut self, intensity: f32);
    /// Replaces the texture sampled by the fragment stage.
    fn bind_texture(&mut self, image: &FlameImage);
    /// Rebuilds size-dependent state after the container changed shape.
    fn resize(&mut self, width: u32, height: u32, camera: &Camera, plane: &PlaneTransform);
    /// Reconfigures the surface after [`RenderError::SurfaceLost`].
    fn recover(&mut self);
    fn render(&mut self) -> Result<(), RenderError>;
    /// Presents one empty frame so nothing of the flame stays on screen.
    fn clear(&mut self) -> Result<(), RenderError>;
    /// Releases every GPU resource held by the scene.
    fn dispose(self);
}

/// Display environment: containers, surfaces, renderers and frame scheduling.
pub trait Host {
    /// Render target attached to a container.
    type Surface;
    type Renderer: FlameRenderer;

    fn find_container(&self, id: &str) -> Option<Container>;

    /// Inserts a render surface into `container`.
    fn attach_surface(&mut self, container: &Container) -> anyhow::Result<Self::Surface>;

    /// Removes a surface previously returned by [`Host::attach_surface`].
    fn detach_surface(&mut self, container: &Container, surface: Self::Surface);

    fn create_renderer(
        &mut self,
        surface: &Self::Surface,
        scene: &SceneDescriptor,
    ) -> anyhow::Result<Self::Renderer>;

    /// Asks for one callback on the container's next refresh.
    fn request_frame(&mut self, container: &Container) -> FrameRequest;

    fn cancel_frame(&mut self, request: FrameRequest);
}
