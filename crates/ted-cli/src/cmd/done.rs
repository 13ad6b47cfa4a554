//! `ted done` — move a finished todo into `done/`.

use crate::cmd::{Written, load_vault};
use crate::output::{OutputMode, render};
use anyhow::{Result, bail};
use clap::Args;
use std::io::{self, BufRead, IsTerminal, Write};
use ted_core::{Config, TodoData};
use tracing::info;

#[derive(Args, Debug)]
pub struct DoneArgs {
    /// Todo ID.
    pub id: String,

    /// Mark any open tasks done without asking.
    #[arg(short, long)]
    pub yes: bool,
}

pub fn run_done(args: &DoneArgs, config: &Config, output: OutputMode) -> Result<()> {
    let (vault, data) = load_vault(config)?;
    let found = data.require_todo(&args.id)?;
    if data.is_done(found) {
        bail!("{} is already done", found.id());
    }
    let mut todo = found.clone();

    if !todo.is_completed() {
        let confirmed = args.yes || confirm(&todo)?;
        if !confirmed {
            bail!(
                "{} has open tasks; pass --yes to mark them done and complete it",
                todo.id()
            );
        }
        todo.mark_all_done();
    }

    let path = vault.complete_todo(&mut todo)?;
    info!(id = todo.id(), "todo done");
    render(output, &Written::new(todo.id(), &path), |v, w| {
        writeln!(w, "✓ {} done, moved to {}", v.id, v.path)
    })
}

/// Ask on the terminal. Without a TTY there is nobody to answer, so the
/// answer is no.
fn confirm(todo: &TodoData) -> Result<bool> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return Ok(false);
    }
    let open = todo.tasks.iter().filter(|t| !t.done).count();
    let mut err = io::stderr();
    write!(
        err,
        "{} has {open} open task(s). Mark all done and complete? [y/N] ",
        todo.id()
    )?;
    err.flush()?;

    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
