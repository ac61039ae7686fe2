use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Anti-aliasing policy for the flame pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl FromStr for Antialiasing {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("anti-alias mode must not be empty".to_string());
        }

        let normalized = trimmed.to_ascii_lowercase();
        match normalized.as_str() {
            "auto" | "max" | "default" => Ok(Antialiasing::Auto),
            "off" | "none" | "disable" | "disabled" | "0" => Ok(Antialiasing::Off),
            _ => {
                let samples: u32 = normalized.parse().map_err(|_| {
                    format!("invalid anti-alias sample count '{trimmed}'; use auto/off or 2/4/8/16")
                })?;

                if samples == 1 {
                    return Ok(Antialiasing::Off);
                }

                if !matches!(samples, 2 | 4 | 8 | 16) {
                    return Err(format!(
                        "unsupported sample count {samples}; supported values are 2, 4, 8, or 16"
                    ));
                }

                Ok(Antialiasing::Samples(samples))
            }
        }
    }
}

impl fmt::Display for Antialiasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Antialiasing::Auto => f.write_str("auto"),
            Antialiasing::Off => f.write_str("off"),
            Antialiasing::Samples(count) => write!(f, "{count}"),
        }
    }
}

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColorSpaceMode {
    /// Gamma-encoded swapchain, the way browser canvases present.
    #[default]
    Auto,
    /// Treat texture and shader outputs as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Treat shader outputs as linear and use sRGB swapchains/textures for conversion.
    Linear,
}

impl FromStr for ColorSpaceMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err("color space must not be empty".to_string());
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "auto" => Ok(ColorSpaceMode::Auto),
            "gamma" | "srgb-off" => Ok(ColorSpaceMode::Gamma),
            "linear" | "srgb" => Ok(ColorSpaceMode::Linear),
            other => Err(format!(
                "unknown color space '{other}'; expected auto, gamma, or linear"
            )),
        }
    }
}

impl fmt::Display for ColorSpaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSpaceMode::Auto => f.write_str("auto"),
            ColorSpaceMode::Gamma => f.write_str("gamma"),
            ColorSpaceMode::Linear => f.write_str("linear"),
        }
    }
}

/// Declares how the compositor should treat the swapchain alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SurfaceAlpha {
    /// Frames fully cover the container; transparent flame pixels show black.
    Opaque,
    /// Frames carry transparency so whatever is behind the container shows through.
    #[default]
    Transparent,
}

impl FromStr for SurfaceAlpha {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "opaque" => Ok(SurfaceAlpha::Opaque),
            "transparent" => Ok(SurfaceAlpha::Transparent),
            other => Err(format!(
                "unknown surface alpha '{other}'; expected opaque or transparent"
            )),
        }
    }
}

impl fmt::Display for SurfaceAlpha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceAlpha::Opaque => f.write_str("opaque"),
            SurfaceAlpha::Transparent => f.write_str("transparent"),
        }
    }
}

/// Which class of GPU adapter to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GpuPowerPreference {
    #[default]
    Low,
    High,
}

impl FromStr for GpuPowerPreference {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" | "low-power" => Ok(GpuPowerPreference::Low),
            "high" | "high-performance" => Ok(GpuPowerPreference::High),
            other => Err(format!(
                "unknown power preference '{other}'; expected low or high"
            )),
        }
    }
}

impl fmt::Display for GpuPowerPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuPowerPreference::Low => f.write_str("low"),
            GpuPowerPreference::High => f.write_str("high"),
        }
    }
}

macro_rules! string_conversions {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = String;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.parse()
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.to_string()
                }
            }
        )*
    };
}

string_conversions!(Antialiasing, ColorSpaceMode, SurfaceAlpha, GpuPowerPreference);

/// Quality knobs handed to the renderer when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub antialiasing: Antialiasing,
    pub color_space: ColorSpaceMode,
    pub surface_alpha: SurfaceAlpha,
    pub power_preference: GpuPowerPreference,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_antialias_modes() {
        assert_eq!("auto".parse::<Antialiasing>().unwrap(), Antialiasing::Auto);
        assert_eq!("OFF".parse::<Antialiasing>().unwrap(), Antialiasing::Off);
        assert_eq!("1".parse::<Antialiasing>().unwrap(), Antialiasing::Off);
        assert_eq!(
            "4".parse::<Antialiasing>().unwrap(),
            Antialiasing::Samples(4)
        );
        assert!("3".parse::<Antialiasing>().is_err());
        assert!("".parse::<Antialiasing>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for mode in [
            Antialiasing::Auto,
            Antialiasing::Off,
            Antialiasing::Samples(8),
        ] {
            assert_eq!(mode.to_string().parse::<Antialiasing>().unwrap(), mode);
        }
        assert_eq!(
            "srgb".parse::<ColorSpaceMode>().unwrap(),
            ColorSpaceMode::Linear
        );
        assert_eq!(
            "Transparent".parse::<SurfaceAlpha>().unwrap(),
            SurfaceAlpha::Transparent
        );
        assert!("bright".parse::<GpuPowerPreference>().is_err());
    }
}
