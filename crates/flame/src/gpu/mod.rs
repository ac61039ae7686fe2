//! wgpu side of the flame effect.
//!
//! - `context` owns instance/device/surface wiring and negotiates surface
//!   format, MSAA and alpha compositing for the container.
//! - `pipeline` compiles the GLSL pair into a render pipeline with a uniform
//!   group (set 0) and a texture group (set 1).
//! - `uniforms` mirrors the `FlameParams` block.
//! - `texture` uploads the decoded flame image, or a transparent placeholder.
//! - `renderer` glues everything together behind [`crate::host::FlameRenderer`].

mod context;
mod pipeline;
mod renderer;
mod texture;
mod uniforms;

pub use renderer::GpuRenderer;
