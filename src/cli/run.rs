//! The host pipeline step: read a stylesheet, rewrite it, write it back.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use svg_fragments::config::{CONFIG_FILE, Options};
use svg_fragments::{debug, log, process};

use super::Cli;

/// Process the input named on the command line. Returns the number of
/// warnings reported.
pub fn run(cli: &Cli) -> Result<usize> {
    let options = load_options(cli)?;
    debug!("config"; "{:?}", options);

    let (css, source) = read_input(cli)?;
    let processed = process(&css, &options, source.as_deref());

    for warning in &processed.warnings {
        log!("warning"; "{}", warning);
    }

    write_output(cli.output.as_deref(), &processed.css)?;
    Ok(processed.warnings.len())
}

/// Config file first, then CLI overrides.
fn load_options(cli: &Cli) -> Result<Options> {
    let mut options = match &cli.config {
        Some(path) => Options::load(path, true)?,
        None => Options::load(Path::new(CONFIG_FILE), false)?,
    };
    if let Some(utf8) = cli.utf8 {
        options.utf8 = utf8;
    }
    Ok(options)
}

fn read_input(cli: &Cli) -> Result<(String, Option<PathBuf>)> {
    if cli.reads_stdin() {
        let mut css = String::new();
        io::stdin()
            .read_to_string(&mut css)
            .context("Failed to read stylesheet from stdin")?;
        return Ok((css, None));
    }

    let css = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read `{}`", cli.input.display()))?;
    Ok((css, Some(cli.input.clone())))
}

fn write_output(output: Option<&Path>, css: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create `{}`", parent.display()))?;
            }
            fs::write(path, css).with_context(|| format!("Failed to write `{}`", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(css.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}
