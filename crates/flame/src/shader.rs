use std::borrow::Cow;

use wgpu::naga::ShaderStage;

/// Peak vertical UV displacement at full intensity.
pub const RIPPLE_AMPLITUDE: f32 = 0.04;
/// Horizontal phase frequency of the ripple.
pub const RIPPLE_FREQUENCY: f32 = 12.0;
/// Phase advance per unit of animation time.
pub const RIPPLE_SPEED: f32 = 12.0;
/// RGB multiplier at zero intensity.
pub const BRIGHTNESS_BASE: f32 = 0.7;
/// Extra RGB multiplier gained at full intensity.
pub const BRIGHTNESS_GAIN: f32 = 0.6;

/// Compiles the plane vertex stage.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("flame vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(vertex_source()),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Compiles the flame fragment stage with the ripple constants baked in.
pub(crate) fn compile_fragment_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("flame fragment"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(fragment_source()),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    })
}

pub(crate) fn vertex_source() -> String {
    format!("#version 450\n{PARAMS_BLOCK}{VERTEX_BODY}")
}

/// Produces the fragment stage: prelude with `#define`s for every tunable
/// constant, the shared uniform block, texture bindings, then the body.
pub(crate) fn fragment_source() -> String {
    let defines = [
        ("RIPPLE_AMPLITUDE", RIPPLE_AMPLITUDE),
        ("RIPPLE_FREQUENCY", RIPPLE_FREQUENCY),
        ("RIPPLE_SPEED", RIPPLE_SPEED),
        ("BRIGHTNESS_BASE", BRIGHTNESS_BASE),
        ("BRIGHTNESS_GAIN", BRIGHTNESS_GAIN),
    ]
    .iter()
    .map(|(name, value)| format!("#define {name} {value:?}\n"))
    .collect::<String>();

    format!("#version 450\n{defines}{PARAMS_BLOCK}{FRAGMENT_BODY}")
}

/// CPU mirror of the fragment stage, used to reason about output without a GPU.
///
/// `sample` stands in for the texture lookup and receives the perturbed UV.
pub fn shade_fragment<F>(uv: [f32; 2], time: f32, intensity: f32, sample: F) -> [f32; 4]
where
    F: Fn([f32; 2]) -> [f32; 4],
{
    let [u, v] = uv;
    let offset = ripple_offset(u, v, time, intensity);
    let texel = sample([u, v + offset]);
    let brightness = BRIGHTNESS_BASE + BRIGHTNESS_GAIN * intensity;
    [
        texel[0] * brightness,
        texel[1] * brightness,
        texel[2] * brightness,
        texel[3] * intensity,
    ]
}

/// Scales RGB by alpha, the form the fragment stage writes to the surface.
pub fn premultiply(color: [f32; 4]) -> [f32; 4] {
    let [r, g, b, a] = color;
    [r * a, g * a, b * a, a]
}

/// Vertical UV displacement; vanishes at the top edge (`v = 1`).
pub fn ripple_offset(u: f32, v: f32, time: f32, intensity: f32) -> f32 {
    RIPPLE_AMPLITUDE * (RIPPLE_FREQUENCY * u + time * RIPPLE_SPEED).sin() * (1.0 - v) * intensity
}

// Layout must match `FlameUniforms` in `gpu/uniforms.rs`.
const PARAMS_BLOCK: &str = r"
layout(std140, set = 0, binding = 0) uniform FlameParams {
    mat4 mvp;
    float time;
    float intensity;
    vec2 _padding;
} params;
";

const VERTEX_BODY: &str = r"
layout(location = 0) in vec3 position;
layout(location = 1) in vec2 uv;
layout(location = 0) out vec2 v_uv;

void main() {
    v_uv = uv;
    gl_Position = params.mvp * vec4(position, 1.0);
}
";

const FRAGMENT_BODY: &str = r"
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(set = 1, binding = 0) uniform texture2D flame_texture;
layout(set = 1, binding = 1) uniform sampler flame_sampler;

void main() {
    float k = params.intensity;
    float offset = RIPPLE_AMPLITUDE * sin(RIPPLE_FREQUENCY * v_uv.x + params.time * RIPPLE_SPEED)
        * (1.0 - v_uv.y) * k;
    vec4 texel = texture(sampler2D(flame_texture, flame_sampler), v_uv + vec2(0.0, offset));
    float alpha = texel.a * k;
    vec3 color = texel.rgb * (BRIGHTNESS_BASE + BRIGHTNESS_GAIN * k);
    outColor = vec4(color * alpha, alpha);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(texel: [f32; 4]) -> impl Fn([f32; 2]) -> [f32; 4] {
        move |_| texel
    }

    #[test]
    fn zero_intensity_is_fully_transparent() {
        for texel in [[1.0, 0.5, 0.2, 1.0], [0.3, 0.3, 0.3, 0.6], [0.0, 0.0, 0.0, 0.0]] {
            for uv in [[0.0, 0.0], [0.5, 0.25], [1.0, 1.0]] {
                let out = shade_fragment(uv, 3.7, 0.0, solid(texel));
                assert_eq!(out[3], 0.0);
            }
        }
    }

    #[test]
    fn full_intensity_keeps_alpha_and_boosts_rgb() {
        let texel = [0.5, 0.25, 0.1, 0.8];
        let out = shade_fragment([0.3, 0.6], 1.0, 1.0, solid(texel));
        assert!((out[0] - 0.65).abs() < 1e-6);
        assert!((out[1] - 0.325).abs() < 1e-6);
        assert!((out[2] - 0.13).abs() < 1e-6);
        assert!((out[3] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn ripple_vanishes_at_top_and_without_intensity() {
        assert_eq!(ripple_offset(0.4, 1.0, 2.0, 1.0), 0.0);
        assert_eq!(ripple_offset(0.4, 0.0, 2.0, 0.0), 0.0);
        let bottom = ripple_offset(0.1, 0.0, 0.3, 1.0);
        assert!(bottom.abs() <= RIPPLE_AMPLITUDE);
        assert!(bottom.abs() > 0.0);
    }

    #[test]
    fn sampler_receives_vertically_perturbed_uv() {
        let uv = [0.2, 0.1];
        let expected_v = uv[1] + ripple_offset(uv[0], uv[1], 0.5, 0.75);
        let out = shade_fragment(uv, 0.5, 0.75, |sampled| {
            assert_eq!(sampled[0], uv[0]);
            assert!((sampled[1] - expected_v).abs() < 1e-6);
            [1.0, 1.0, 1.0, 1.0]
        });
        assert!((out[3] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn fragment_source_carries_constants() {
        let source = fragment_source();
        assert!(source.starts_with("#version 450"));
        assert!(source.contains("#define RIPPLE_AMPLITUDE 0.04"));
        assert!(source.contains("#define RIPPLE_FREQUENCY 12.0"));
        assert!(source.contains("#define BRIGHTNESS_BASE 0.7"));
        assert!(source.contains("#define BRIGHTNESS_GAIN 0.6"));
        assert!(source.contains("uniform FlameParams"));
        assert!(source.contains("outColor = vec4(color * alpha, alpha);"));
    }

    #[test]
    fn premultiplied_output_scales_rgb_by_alpha() {
        let out = premultiply(shade_fragment([0.5, 0.5], 0.0, 0.5, solid([1.0, 1.0, 1.0, 1.0])));
        assert!((out[3] - 0.5).abs() < 1e-6);
        assert!(out[..3].iter().all(|c| (*c - 0.5).abs() < 1e-6));
    }

    #[test]
    fn vertex_source_passes_uv_through() {
        let source = vertex_source();
        assert!(source.contains("v_uv = uv;"));
        assert!(source.contains("params.mvp"));
    }
}
