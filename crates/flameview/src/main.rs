//! `flameview` opens a window, registers it as the flame container and
//! animates the effect until the window closes. The `config` subcommand prints
//! the configuration a run would use; `where` prints the config locations.

mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config) => run::print_config(cli.run),
        Some(Command::Where) => run_where(),
        None => run::run(cli.run),
    }
}

fn run_where() -> Result<()> {
    let paths = AppPaths::discover()?;
    println!("Configuration:");
    println!("  directory:  {}", paths.config_dir().display());
    println!("  file:       {}", paths.config_file().display());
    Ok(())
}
