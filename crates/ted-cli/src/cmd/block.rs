//! `ted block` — record that a todo waits on others.

use crate::cmd::{load_vault, status_after};
use crate::output::{OutputMode, render};
use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;
use std::io::Write as _;
use ted_core::{Config, Status};

#[derive(Args, Debug)]
pub struct BlockArgs {
    /// Todo that is blocked.
    pub id: String,

    /// Todo IDs it waits on (repeatable).
    #[arg(long = "by", required = true, value_name = "ID")]
    pub by: Vec<String>,
}

#[derive(Debug, Serialize)]
struct BlockReport {
    ok: bool,
    id: String,
    added: Vec<String>,
    blocked_by: Vec<String>,
    status: Status,
}

pub fn run_block(args: &BlockArgs, config: &Config, output: OutputMode) -> Result<()> {
    let (vault, mut data) = load_vault(config)?;
    let mut todo = data.require_todo(&args.id)?.clone();

    let mut added = Vec::new();
    for id in &args.by {
        let blocker = data.require_todo(id)?;
        if blocker.filename == todo.filename {
            bail!("{} cannot block itself", todo.id());
        }
        if todo.properties.add_blocker(&blocker.filename) {
            added.push(blocker.filename.clone());
        }
    }
    vault.save_todo(&todo)?;

    let report = BlockReport {
        ok: true,
        id: todo.id().to_string(),
        added,
        blocked_by: todo.properties.blocked_by.clone(),
        status: status_after(&mut data, &todo),
    };
    render(output, &report, |r, w| {
        for name in &r.added {
            writeln!(w, "✓ {} blocked by {name}", r.id)?;
        }
        if r.added.is_empty() {
            writeln!(w, "{} already blocked by every given todo", r.id)?;
        }
        Ok(())
    })
}
