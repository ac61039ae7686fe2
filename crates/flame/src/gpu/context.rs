use anyhow::{Context as AnyhowContext, Result};
use wgpu::TextureFormatFeatureFlags;

use crate::types::{Antialiasing, ColorSpaceMode, GpuPowerPreference, RenderOptions, SurfaceAlpha};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SurfaceColorSpace {
    Gamma,
    Linear,
}

impl SurfaceColorSpace {
    pub(crate) fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            SurfaceColorSpace::Gamma => wgpu::TextureFormat::Rgba8Unorm,
            SurfaceColorSpace::Linear => wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}

/// Device, queue and configured swapchain for one container surface.
pub(crate) struct GpuContext {
    _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub sample_count: u32,
    pub color_space: SurfaceColorSpace,
    pub transparent: bool,
}

impl GpuContext {
    pub(crate) fn new<T>(target: T, width: u32, height: u32, options: &RenderOptions) -> Result<Self>
    where
        T: wgpu::WindowHandle + 'static,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let surface = instance
            .create_surface(target)
            .context("failed to create rendering surface")?;

        let power_preference = match options.power_preference {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let adapter_info = adapter.get_info();
        let is_software = adapter_info.device_type == wgpu::DeviceType::Cpu;
        tracing::debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            is_software,
            "selected GPU adapter"
        );

        let limits = adapter.limits();
        let max_dimension = limits.max_texture_dimension_2d;
        let width = width.max(1);
        let height = height.max(1);
        if width > max_dimension || height > max_dimension {
            anyhow::bail!(
                "GPU max texture dimension is {max_dimension}, requested surface is {width}x{height}"
            );
        }

        let surface_caps = surface.get_capabilities(&adapter);
        let color_space = match options.color_space {
            ColorSpaceMode::Auto | ColorSpaceMode::Gamma => SurfaceColorSpace::Gamma,
            ColorSpaceMode::Linear => SurfaceColorSpace::Linear,
        };
        let surface_format = pick_surface_format(&surface_caps.formats, color_space)?;

        let format_features = adapter.get_texture_format_features(surface_format);
        let mut sample_count = negotiate_sample_count(
            options.antialiasing,
            format_features.flags.supported_sample_counts(),
        );
        if sample_count > 1
            && !format_features
                .flags
                .contains(TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE)
        {
            tracing::warn!(
                ?surface_format,
                "surface format does not support MSAA resolve; disabling MSAA"
            );
            sample_count = 1;
        }
        if is_software && sample_count > 1 {
            tracing::warn!(
                sample_count,
                "software rasterizer detected; disabling MSAA for performance"
            );
            sample_count = 1;
        }

        let mut required_features = wgpu::Features::empty();
        if sample_count > 4 {
            required_features |= wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("flame device"),
            required_features,
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let present_mode = surface_caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Fifo)
            .or_else(|| surface_caps.present_modes.first().copied())
            .unwrap_or(wgpu::PresentMode::Fifo);

        let (alpha_mode, transparent) =
            pick_alpha_mode(&surface_caps.alpha_modes, options.surface_alpha);
        tracing::debug!(
            ?surface_format,
            ?present_mode,
            ?alpha_mode,
            sample_count,
            "configuring flame surface"
        );

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            sample_count,
            color_space,
            transparent,
        })
    }

    pub(crate) fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
    }

    pub(crate) fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }
}

fn pick_surface_format(
    formats: &[wgpu::TextureFormat],
    color_space: SurfaceColorSpace,
) -> Result<wgpu::TextureFormat> {
    let fallback = *formats
        .first()
        .context("surface reports no supported formats")?;
    let wanted_srgb = color_space == SurfaceColorSpace::Linear;
    let format = formats
        .iter()
        .copied()
        .find(|format| format.is_srgb() == wanted_srgb)
        .unwrap_or_else(|| {
            tracing::warn!(
                ?fallback,
                ?color_space,
                "no matching surface format available; falling back"
            );
            fallback
        });
    Ok(format)
}

fn negotiate_sample_count(antialiasing: Antialiasing, mut supported: Vec<u32>) -> u32 {
    if !supported.contains(&1) {
        supported.push(1);
    }
    supported.sort_unstable();
    supported.dedup();

    match antialiasing {
        Antialiasing::Auto => supported.last().copied().unwrap_or(1),
        Antialiasing::Off => 1,
        Antialiasing::Samples(requested) if supported.contains(&requested) => requested,
        Antialiasing::Samples(requested) => {
            let fallback = supported
                .iter()
                .copied()
                .filter(|&count| count <= requested)
                .max()
                .unwrap_or(1);
            tracing::warn!(
                requested,
                fallback,
                ?supported,
                "requested MSAA sample count not supported; falling back"
            );
            fallback
        }
    }
}

/// The flame fades to nothing at low levels, so a transparent surface lets
/// whatever sits behind the container show through.
fn pick_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    surface_alpha: SurfaceAlpha,
) -> (wgpu::CompositeAlphaMode, bool) {
    let fallback = modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);
    let find = |wanted: wgpu::CompositeAlphaMode| modes.iter().copied().find(|mode| *mode == wanted);
    let opaque = find(wgpu::CompositeAlphaMode::Opaque).unwrap_or(fallback);
    match surface_alpha {
        SurfaceAlpha::Opaque => (opaque, false),
        // Fragments leave the pipeline premultiplied.
        SurfaceAlpha::Transparent => match find(wgpu::CompositeAlphaMode::PreMultiplied) {
            Some(mode) => (mode, true),
            None => {
                tracing::warn!(
                    ?modes,
                    "surface cannot composite premultiplied alpha; rendering opaque"
                );
                (opaque, false)
            }
        },
    }
}
