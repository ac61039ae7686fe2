//! On-disk and in-memory configuration for the flame preview.
//!
//! Every field has a default, so an empty document is a valid configuration.
//!
//! ```toml
//! container = "flame"
//! level = 50
//! level_step = 10
//! texture = "flame-appearance.png"
//! texture_timeout = "5s"
//! time_step = 0.02
//! width = 800
//! height = 600
//! antialias = "auto"
//! color_space = "auto"
//! surface_alpha = "transparent"
//! power_preference = "low"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::effect::{EffectOptions, TIME_STEP};
use crate::intensity::DEFAULT_LEVEL;
use crate::texture::DEFAULT_TEXTURE_PATH;
use crate::types::{Antialiasing, ColorSpaceMode, GpuPowerPreference, RenderOptions, SurfaceAlpha};

pub const DEFAULT_CONTAINER: &str = "flame";
pub const DEFAULT_LEVEL_STEP: f32 = 10.0;
pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlameConfig {
    /// Identifier of the display region the flame renders into.
    pub container: String,
    /// Starting level, clamped into `[0, 100]`.
    pub level: f32,
    /// Level change applied by the up/down keys.
    pub level_step: f32,
    pub texture: PathBuf,
    /// Gives up on the texture after this long; unset waits indefinitely.
    #[serde(
        deserialize_with = "deserialize_duration_opt",
        serialize_with = "serialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub texture_timeout: Option<Duration>,
    pub time_step: f32,
    pub width: u32,
    pub height: u32,
    pub antialias: Antialiasing,
    pub color_space: ColorSpaceMode,
    pub surface_alpha: SurfaceAlpha,
    pub power_preference: GpuPowerPreference,
}

impl Default for FlameConfig {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_string(),
            level: DEFAULT_LEVEL,
            level_step: DEFAULT_LEVEL_STEP,
            texture: PathBuf::from(DEFAULT_TEXTURE_PATH),
            texture_timeout: None,
            time_step: TIME_STEP,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            antialias: Antialiasing::default(),
            color_space: ColorSpaceMode::default(),
            surface_alpha: SurfaceAlpha::default(),
            power_preference: GpuPowerPreference::default(),
        }
    }
}

impl FlameConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: FlameConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.container.trim().is_empty() {
            return Err(ConfigError::Invalid("container must not be empty".into()));
        }
        if self.level.is_nan() {
            return Err(ConfigError::Invalid("level must be a number".into()));
        }
        if !self.level_step.is_finite() || self.level_step <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "level_step must be positive, got {}",
                self.level_step
            )));
        }
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.texture.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("texture path must not be empty".into()));
        }
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            antialiasing: self.antialias,
            color_space: self.color_space,
            surface_alpha: self.surface_alpha,
            power_preference: self.power_preference,
        }
    }

    pub fn effect_options(&self) -> EffectOptions {
        EffectOptions {
            time_step: self.time_step,
            render: self.render_options(),
        }
    }
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(v)
                .map(|secs| Some(Duration::from_secs(secs)))
                .map_err(|_| E::custom("duration must be non-negative"))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Duration::try_from_secs_f64(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration_opt<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => serializer.serialize_str(&humantime::format_duration(*duration).to_string()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = FlameConfig::from_toml_str("").unwrap();
        assert_eq!(config, FlameConfig::default());
        assert_eq!(config.container, "flame");
        assert_eq!(config.level, 50.0);
        assert_eq!(config.time_step, 0.02);
        assert_eq!(config.texture_timeout, None);
    }

    #[test]
    fn parses_full_document() {
        let config = FlameConfig::from_toml_str(
            r#"
container = "hearth"
level = 75
level_step = 5
texture = "assets/fire.png"
texture_timeout = "1500ms"
time_step = 0.01
width = 320
height = 240
antialias = "4"
color_space = "linear"
surface_alpha = "opaque"
power_preference = "high"
"#,
        )
        .unwrap();

        assert_eq!(config.container, "hearth");
        assert_eq!(config.level, 75.0);
        assert_eq!(config.texture, PathBuf::from("assets/fire.png"));
        assert_eq!(config.texture_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.antialias, Antialiasing::Samples(4));
        assert_eq!(config.color_space, ColorSpaceMode::Linear);
        assert_eq!(config.surface_alpha, SurfaceAlpha::Opaque);
        assert_eq!(config.power_preference, GpuPowerPreference::High);

        let options = config.effect_options();
        assert_eq!(options.time_step, 0.01);
        assert_eq!(options.render.antialiasing, Antialiasing::Samples(4));
    }

    #[test]
    fn numeric_timeout_is_seconds() {
        let config = FlameConfig::from_toml_str("texture_timeout = 3").unwrap();
        assert_eq!(config.texture_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn rejects_invalid_values() {
        for input in [
            "time_step = 0",
            "level_step = -1",
            "width = 0",
            "container = \"  \"",
            "level = nan",
        ] {
            assert!(
                matches!(
                    FlameConfig::from_toml_str(input),
                    Err(ConfigError::Invalid(_))
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_unknown_keys_and_bad_enums() {
        assert!(matches!(
            FlameConfig::from_toml_str("colour = \"red\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FlameConfig::from_toml_str("antialias = \"3\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FlameConfig::from_toml_str("texture_timeout = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn serialised_config_parses_back() {
        let config = FlameConfig {
            level: 20.0,
            texture_timeout: Some(Duration::from_secs(2)),
            ..FlameConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("texture_timeout = \"2s\""));
        assert_eq!(FlameConfig::from_toml_str(&text).unwrap(), config);
    }
}
