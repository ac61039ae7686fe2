use anyhow::{Context, Result};
use flame::FlameConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

pub fn initialise_tracing() {
    let default_filter =
        "warn,flameview=info,flame=info,naga=error,wgpu=error,wgpu_core=error,wgpu_hal=error,winit=error";
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = resolve_config(&args, &paths)?;
    tracing::debug!(?config, "resolved flame configuration");
    flame::run_preview(&config)
}

pub fn print_config(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = resolve_config(&args, &paths)?;
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Defaults, then the configuration file, then command-line overrides.
pub fn resolve_config(args: &RunArgs, paths: &AppPaths) -> Result<FlameConfig> {
    let mut config = match &args.config {
        Some(path) => FlameConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            let default_path = paths.config_file();
            if default_path.is_file() {
                tracing::debug!(path = %default_path.display(), "loading flame config");
                FlameConfig::load(&default_path).with_context(|| {
                    format!("failed to load config from {}", default_path.display())
                })?
            } else {
                FlameConfig::default()
            }
        }
    };

    apply_overrides(&mut config, args);
    config.validate().context("invalid command-line overrides")?;
    Ok(config)
}

fn apply_overrides(config: &mut FlameConfig, args: &RunArgs) {
    if let Some(container) = &args.container {
        config.container = container.clone();
    }
    if let Some(level) = args.level {
        config.level = level;
    }
    if let Some(step) = args.level_step {
        config.level_step = step;
    }
    if let Some(texture) = &args.texture {
        config.texture = texture.clone();
    }
    if let Some(timeout) = args.texture_timeout {
        config.texture_timeout = Some(timeout);
    }
    if let Some(step) = args.time_step {
        config.time_step = step;
    }
    if let Some((width, height)) = args.size {
        config.width = width;
        config.height = height;
    }
    if let Some(mode) = args.antialias {
        config.antialias = mode;
    }
    if let Some(mode) = args.color_space {
        config.color_space = mode;
    }
    if let Some(mode) = args.surface_alpha {
        config.surface_alpha = mode;
    }
    if let Some(mode) = args.power_preference {
        config.power_preference = mode;
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use flame::{Antialiasing, SurfaceAlpha};

    use super::*;

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut config = FlameConfig {
            level: 20.0,
            ..FlameConfig::default()
        };
        let args = RunArgs {
            texture: Some(PathBuf::from("fire.png")),
            texture_timeout: Some(Duration::from_secs(1)),
            size: Some((320, 240)),
            antialias: Some(Antialiasing::Off),
            surface_alpha: Some(SurfaceAlpha::Opaque),
            ..RunArgs::default()
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.level, 20.0);
        assert_eq!(config.texture, PathBuf::from("fire.png"));
        assert_eq!(config.texture_timeout, Some(Duration::from_secs(1)));
        assert_eq!((config.width, config.height), (320, 240));
        assert_eq!(config.antialias, Antialiasing::Off);
        assert_eq!(config.surface_alpha, SurfaceAlpha::Opaque);
        assert_eq!(config.container, "flame");
    }
}
