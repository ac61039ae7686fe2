//! Animated flame overlay rendered with `wgpu`.
//!
//! A [`FlameEffect`] draws a textured plane into a display region (a
//! *container*) provided by a [`Host`]. Each frame the fragment stage ripples
//! the texture and scales its opacity and brightness by the current level:
//! level 0 is fully transparent, level 100 is opaque and bright.
//!
//! ```no_run
//! use flame::{FlameConfig, run_preview};
//!
//! let config = FlameConfig::default();
//! run_preview(&config)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! Embedders that manage their own windows implement [`Host`] and drive
//! [`FlameEffect::tick`] from their frame callbacks.

mod config;
mod effect;
mod geometry;
mod gpu;
mod host;
mod intensity;
mod shader;
mod texture;
mod types;
mod window;

pub use config::{
    ConfigError, FlameConfig, DEFAULT_CONTAINER, DEFAULT_HEIGHT, DEFAULT_LEVEL_STEP,
    DEFAULT_WIDTH,
};
pub use effect::{EffectOptions, FlameEffect, FlameError, TickOutcome, TIME_STEP};
pub use geometry::{
    model_view_projection, transform_point, Camera, Mat4, PlaneGeometry, PlaneTransform, Vertex,
    CAMERA_DISTANCE, CAMERA_FAR, CAMERA_FOV_DEGREES, CAMERA_NEAR, PLANE_SEGMENTS, PLANE_SIZE,
};
pub use gpu::GpuRenderer;
pub use host::{Container, FlameRenderer, FrameRequest, Host, RenderError, SceneDescriptor};
pub use intensity::{Intensity, DEFAULT_LEVEL, MAX_LEVEL, MIN_LEVEL};
pub use shader::{
    premultiply, ripple_offset, shade_fragment, BRIGHTNESS_BASE, BRIGHTNESS_GAIN, RIPPLE_AMPLITUDE,
    RIPPLE_FREQUENCY, RIPPLE_SPEED,
};
pub use texture::{
    decode_flame_image, FlameImage, FlameTexture, TextureStatus, DEFAULT_TEXTURE_PATH,
};
pub use types::{Antialiasing, ColorSpaceMode, GpuPowerPreference, RenderOptions, SurfaceAlpha};
pub use window::{run_preview, PreviewCommand, WindowHost};
