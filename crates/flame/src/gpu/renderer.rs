use anyhow::Result;
use tracing::{debug, trace};
use wgpu::util::DeviceExt;

use crate::geometry::{Camera, PlaneGeometry, PlaneTransform};
use crate::host::{FlameRenderer, RenderError, SceneDescriptor};
use crate::texture::FlameImage;

use super::context::GpuContext;
use super::pipeline::FlamePipeline;
use super::texture::{self, TextureBinding};
use super::uniforms::FlameUniforms;

struct MultisampleTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("flame msaa target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn for_context(context: &GpuContext) -> Option<Self> {
        (context.sample_count > 1).then(|| {
            Self::new(
                &context.device,
                context.surface_format(),
                context.config.width,
                context.config.height,
                context.sample_count,
            )
        })
    }
}

/// wgpu scene drawing the textured flame plane into a window surface.
pub struct GpuRenderer {
    context: GpuContext,
    pipeline: FlamePipeline,
    uniforms: FlameUniforms,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    sampler: wgpu::Sampler,
    texture: TextureBinding,
    multisample_target: Option<MultisampleTarget>,
}

impl GpuRenderer {
    pub fn new<T>(target: T, scene: &SceneDescriptor) -> Result<Self>
    where
        T: wgpu::WindowHandle + 'static,
    {
        let context = GpuContext::new(target, scene.width, scene.height, &scene.options)?;
        let device = &context.device;
        let pipeline = FlamePipeline::new(device, context.surface_format(), context.sample_count);

        let uniforms = FlameUniforms::new(&scene.camera, &scene.plane, scene.intensity);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("flame uniform buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("flame uniform bind group"),
            layout: &pipeline.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let plane = PlaneGeometry::flame();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("flame plane vertices"),
            contents: bytemuck::cast_slice(&plane.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("flame plane indices"),
            contents: bytemuck::cast_slice(&plane.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let sampler = texture::create_sampler(device);
        let texture = TextureBinding::placeholder(
            device,
            &context.queue,
            &pipeline.texture_layout,
            &sampler,
            context.color_space,
        );
        let multisample_target = MultisampleTarget::for_context(&context);

        debug!(
            width = context.config.width,
            height = context.config.height,
            vertices = plane.vertices.len(),
            "flame renderer ready"
        );

        Ok(Self {
            index_count: plane.indices.len() as u32,
            context,
            pipeline,
            uniforms,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            index_buffer,
            sampler,
            texture,
            multisample_target,
        })
    }

    fn clear_color(&self) -> wgpu::Color {
        if self.context.transparent {
            wgpu::Color::TRANSPARENT
        } else {
            wgpu::Color::BLACK
        }
    }
}

impl FlameRenderer for GpuRenderer {
    fn set_time(&mut self, time: f32) {
        self.uniforms.time = time;
    }

    fn set_intensity(&mut self, intensity: f32) {
        self.uniforms.intensity = intensity;
    }

    fn bind_texture(&mut self, image: &FlameImage) {
        let binding = TextureBinding::from_image(
            &self.context.device,
            &self.context.queue,
            &self.pipeline.texture_layout,
            &self.sampler,
            self.context.color_space,
            image,
        );
        std::mem::replace(&mut self.texture, binding).destroy();
    }

    fn resize(&mut self, width: u32, height: u32, camera: &Camera, plane: &PlaneTransform) {
        self.context.resize(width, height);
        self.uniforms.set_transform(camera, plane);
        if let Some(old) = self.multisample_target.take() {
            old.texture.destroy();
        }
        self.multisample_target = MultisampleTarget::for_context(&self.context);
    }

    fn recover(&mut self) {
        trace!("reconfiguring flame surface");
        self.context.reconfigure();
    }

    fn render(&mut self) -> Result<(), RenderError> {
        let frame = self
            .context
            .surface
            .get_current_texture()
            .map_err(map_surface_error)?;
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("flame encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("flame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &self.texture.bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..self.index_count, 0, 0..1);
        }

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn clear(&mut self) -> Result<(), RenderError> {
        let frame = self
            .context
            .surface
            .get_current_texture()
            .map_err(map_surface_error)?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("flame clear encoder"),
                });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("flame clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color()),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        trace!("flame surface cleared");
        Ok(())
    }

    fn dispose(self) {
        self.uniform_buffer.destroy();
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.texture.destroy();
        if let Some(msaa) = self.multisample_target {
            msaa.texture.destroy();
        }
        debug!("flame renderer disposed");
    }
}

fn map_surface_error(err: wgpu::SurfaceError) -> RenderError {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => RenderError::SurfaceLost,
        wgpu::SurfaceError::Timeout => RenderError::Timeout,
        wgpu::SurfaceError::OutOfMemory => RenderError::OutOfMemory,
        other => RenderError::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_errors_map_to_recoverability() {
        assert!(map_surface_error(wgpu::SurfaceError::Lost).is_recoverable());
        assert!(map_surface_error(wgpu::SurfaceError::Outdated).is_recoverable());
        assert!(map_surface_error(wgpu::SurfaceError::Timeout).is_recoverable());
        assert!(!map_surface_error(wgpu::SurfaceError::OutOfMemory).is_recoverable());
        assert!(!map_surface_error(wgpu::SurfaceError::Other).is_recoverable());
    }
}
