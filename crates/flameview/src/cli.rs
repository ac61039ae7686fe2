use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use flame::{Antialiasing, ColorSpaceMode, GpuPowerPreference, SurfaceAlpha};

#[derive(Parser, Debug)]
#[command(
    name = "flameview",
    author,
    version,
    about = "Animated flame effect preview",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Overrides layered on top of the configuration file.
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Configuration file; defaults to `config.toml` in the flameview config directory.
    #[arg(long, value_name = "PATH", env = "FLAME_CONFIG")]
    pub config: Option<PathBuf>,

    /// Identifier the preview window is registered under.
    #[arg(long, value_name = "ID")]
    pub container: Option<String>,

    /// Starting flame level, clamped to 0-100.
    #[arg(long, value_name = "LEVEL", allow_negative_numbers = true)]
    pub level: Option<f32>,

    /// Level change per arrow key press.
    #[arg(long, value_name = "STEP")]
    pub level_step: Option<f32>,

    /// Flame appearance image.
    #[arg(long, value_name = "PATH", env = "FLAME_TEXTURE")]
    pub texture: Option<PathBuf>,

    /// Give up on the texture after this long (e.g. `5s`, `750ms`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub texture_timeout: Option<Duration>,

    /// Animation time added per frame.
    #[arg(long, value_name = "STEP")]
    pub time_step: Option<f32>,

    /// Preview window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Anti-aliasing policy: `auto`, `off`, or an explicit MSAA sample count (e.g. `4`).
    #[arg(long, value_name = "MODE", value_parser = parse_antialias)]
    pub antialias: Option<Antialiasing>,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_color_space)]
    pub color_space: Option<ColorSpaceMode>,

    /// Window compositing: `transparent` or `opaque`.
    #[arg(long, value_name = "MODE", value_parser = parse_surface_alpha)]
    pub surface_alpha: Option<SurfaceAlpha>,

    /// GPU adapter preference: `low` or `high`.
    #[arg(long, value_name = "MODE", value_parser = parse_power_preference)]
    pub power_preference: Option<GpuPowerPreference>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved configuration as TOML and exit.
    Config,
    /// Print the directories flameview reads from.
    Where,
}

pub fn parse() -> Cli {
    Cli::parse()
}

fn parse_antialias(value: &str) -> Result<Antialiasing, String> {
    value.parse()
}

fn parse_color_space(value: &str) -> Result<ColorSpaceMode, String> {
    value.parse()
}

fn parse_surface_alpha(value: &str) -> Result<SurfaceAlpha, String> {
    value.parse()
}

fn parse_power_preference(value: &str) -> Result<GpuPowerPreference, String> {
    value.parse()
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|err| format!("invalid duration '{value}': {err}"))
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid size '{value}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in '{value}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in '{value}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("size must be non-zero, got '{value}'"));
    }
    Ok((width, height))
}
