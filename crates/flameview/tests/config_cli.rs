use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn flameview(config_dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flameview"))
        .env("FLAME_CONFIG_DIR", config_dir)
        .env_remove("FLAME_CONFIG")
        .env_remove("FLAME_TEXTURE")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run flameview")
}

#[test]
fn config_without_file_prints_defaults() {
    let root = TempDir::new().unwrap();

    let output = flameview(root.path(), &["config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("container = \"flame\""), "{stdout}");
    assert!(stdout.contains("level = 50.0"), "{stdout}");
    assert!(stdout.contains("texture = \"flame-appearance.png\""), "{stdout}");
    assert!(!stdout.contains("texture_timeout"), "{stdout}");
}

#[test]
fn config_file_is_layered_under_cli_overrides() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("config.toml"),
        "level = 20\ntexture_timeout = \"2s\"\ncontainer = \"hearth\"\n",
    )
    .unwrap();

    let output = flameview(root.path(), &["config"]);
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("level = 20.0"), "{stdout}");
    assert!(stdout.contains("texture_timeout = \"2s\""), "{stdout}");
    assert!(stdout.contains("container = \"hearth\""), "{stdout}");

    let output = flameview(
        root.path(),
        &["--level", "70", "--container", "stage", "config"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("level = 70.0"), "{stdout}");
    assert!(stdout.contains("container = \"stage\""), "{stdout}");
    assert!(stdout.contains("texture_timeout = \"2s\""), "{stdout}");
}

#[test]
fn explicit_config_path_wins_over_config_dir() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config.toml"), "level = 20\n").unwrap();
    let explicit = root.path().join("other.toml");
    fs::write(&explicit, "level = 90\n").unwrap();

    let output = flameview(
        root.path(),
        &["--config", explicit.to_str().unwrap(), "config"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("level = 90.0"), "{stdout}");
}

#[test]
fn invalid_config_fails() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config.toml"), "time_step = 0\n").unwrap();

    let output = flameview(root.path(), &["config"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("time_step"), "{stderr}");
}
