//! svg-fragments - inline SVG fragment references of a stylesheet.

mod cli;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    svg_fragments::logger::set_verbose(cli.verbose);

    cli::run::run(&cli)?;
    Ok(())
}
