//! `ted status` — vault-wide counts.

use crate::cmd::{TodoSummary, log_failures};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write as _;
use ted_core::{Config, Status, StatusResolver, Vault};

#[derive(Args, Debug, Default)]
pub struct StatusArgs {
    /// List blocked and open todos by name.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Default, Serialize)]
struct StatusReport {
    vault: String,
    open: usize,
    blocked: usize,
    ready_to_close: usize,
    done: usize,
    projects: usize,
    references: usize,
    inbox: usize,
    unreadable: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    todos: Vec<TodoSummary>,
}

pub fn run_status(args: &StatusArgs, config: &Config, output: OutputMode) -> Result<()> {
    let vault = Vault::open(config)?;
    let report = vault.load();
    let (inbox, inbox_failures) = vault.load_inbox();
    log_failures(&report.failures);
    log_failures(&inbox_failures);

    let data = &report.data;
    let resolver = StatusResolver::new(data);
    let mut status = StatusReport {
        vault: config.vault_dir.display().to_string(),
        done: data.dones.len(),
        projects: data.projects.len(),
        references: data.references.len(),
        inbox: inbox.len(),
        unreadable: report
            .failures
            .iter()
            .chain(&inbox_failures)
            .map(|f| f.path.display().to_string())
            .collect(),
        ..StatusReport::default()
    };
    for todo in &data.todos {
        match resolver.status(todo) {
            Status::NotDone => status.open += 1,
            Status::Blocked => status.blocked += 1,
            Status::Done => status.ready_to_close += 1,
        }
        if args.verbose {
            status.todos.push(TodoSummary::new(todo, &resolver));
        }
    }

    render_mode(
        output,
        &status,
        |s, w| {
            writeln!(
                w,
                "open={} blocked={} ready={} done={} projects={} refs={} inbox={} unreadable={}",
                s.open,
                s.blocked,
                s.ready_to_close,
                s.done,
                s.projects,
                s.references,
                s.inbox,
                s.unreadable.len()
            )?;
            for t in &s.todos {
                writeln!(w, "{}\t{}\t{}", t.id, t.status, t.name)?;
            }
            Ok(())
        },
        |s, w| {
            pretty_section(w, &format!("Vault {}", s.vault))?;
            pretty_kv(w, "Open", s.open.to_string())?;
            pretty_kv(w, "Blocked", s.blocked.to_string())?;
            pretty_kv(w, "Ready", s.ready_to_close.to_string())?;
            pretty_kv(w, "Done", s.done.to_string())?;
            pretty_kv(w, "Projects", s.projects.to_string())?;
            pretty_kv(w, "References", s.references.to_string())?;
            pretty_kv(w, "Inbox", s.inbox.to_string())?;
            for path in &s.unreadable {
                pretty_kv(w, "Unreadable", path)?;
            }
            if !s.todos.is_empty() {
                writeln!(w)?;
                pretty_section(w, "Todos")?;
                for t in &s.todos {
                    writeln!(
                        w,
                        "  {:<10} {:<9} {} ({}/{})",
                        t.id, t.status, t.name, t.tasks_done, t.tasks_total
                    )?;
                }
            }
            Ok(())
        },
    )
}
