use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write as _;
use ted_core::{Config, Vault};

#[derive(Args, Debug)]
pub struct InitArgs {}

#[derive(Debug, Serialize)]
struct InitReport {
    ok: bool,
    vault: String,
    dirs: Vec<String>,
}

/// Execute `ted init`. Creates, under the vault root:
///
/// ```text
/// todos/  done/  projects/  ref/  files/  inbox/
/// ```
///
/// Existing directories are left alone, so re-running is harmless.
///
/// # Errors
///
/// Returns an error if a directory cannot be created.
pub fn run_init(_args: &InitArgs, config: &Config, output: OutputMode) -> Result<()> {
    Vault::init(config)?;

    let report = InitReport {
        ok: true,
        vault: config.vault_dir.display().to_string(),
        dirs: config
            .required_dirs()
            .iter()
            .map(|d| d.display().to_string())
            .collect(),
    };
    render(output, &report, |r, w| {
        writeln!(w, "✓ Initialized ted vault at {}", r.vault)
    })
}
