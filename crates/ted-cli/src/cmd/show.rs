//! `ted show` — one todo with its tasks, log and references.

use crate::cmd::{TodoSummary, load_vault};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write as _;
use ted_core::{Config, Reference, StatusResolver};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Todo ID (numeric part is enough: `12` finds `T00012`).
    pub id: String,

    /// Include the numbered task list in the status line.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Serialize)]
struct ShowReport {
    #[serde(flatten)]
    summary: TodoSummary,
    goal: String,
    archived: bool,
    project_id: Option<String>,
    created: String,
    completed: Option<String>,
    blocked_on: Vec<String>,
    tasks: Vec<TaskView>,
    info: Vec<String>,
    references: Vec<RefView>,
    path: String,
    #[serde(skip)]
    line: String,
}

#[derive(Debug, Serialize)]
struct TaskView {
    index: usize,
    done: bool,
    description: String,
}

#[derive(Debug, Serialize)]
struct RefView {
    id: String,
    name: String,
    reference: Reference,
    tldr: String,
}

pub fn run_show(args: &ShowArgs, config: &Config, output: OutputMode) -> Result<()> {
    let (_vault, data) = load_vault(config)?;
    let todo = data.require_todo(&args.id)?;
    let resolver = StatusResolver::new(&data);

    let report = ShowReport {
        summary: TodoSummary::new(todo, &resolver),
        goal: todo.goal.clone(),
        archived: data.is_done(todo),
        project_id: todo.properties.project_id.clone(),
        created: todo.properties.created.clone(),
        completed: todo.properties.completed.clone(),
        blocked_on: resolver
            .blocked_on(todo)
            .into_iter()
            .map(str::to_string)
            .collect(),
        tasks: todo
            .tasks
            .iter()
            .enumerate()
            .map(|(index, t)| TaskView {
                index,
                done: t.done,
                description: t.description.clone(),
            })
            .collect(),
        info: todo.info.clone(),
        references: data
            .references_for(&todo.filename)
            .map(|r| RefView {
                id: r.id().to_string(),
                name: r.name.clone(),
                reference: r.reference.clone(),
                tldr: r.tldr.clone(),
            })
            .collect(),
        path: todo.filepath.display().to_string(),
        line: resolver.status_line(todo, args.verbose),
    };

    render_mode(
        output,
        &report,
        |r, w| {
            writeln!(w, "{}", r.line)?;
            writeln!(w, "Goal: {}", r.goal)?;
            if !r.blocked_on.is_empty() {
                writeln!(w, "Blocked on: {}", r.blocked_on.join(", "))?;
            }
            for line in &r.info {
                writeln!(w, "  {line}")?;
            }
            for reference in &r.references {
                writeln!(w, "{}: {}", reference.id, reference.reference.encode())?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, &r.line.replace('\n', "\n  "))?;
            pretty_kv(w, "Goal", &r.goal)?;
            pretty_kv(w, "Status", r.summary.status.to_string())?;
            pretty_kv(
                w,
                "Tasks",
                format!("{}/{} done", r.summary.tasks_done, r.summary.tasks_total),
            )?;
            if !r.summary.tags.is_empty() {
                pretty_kv(w, "Tags", r.summary.tags.join(", "))?;
            }
            if let Some(project) = &r.project_id {
                pretty_kv(w, "Project", project)?;
            }
            pretty_kv(w, "Created", &r.created)?;
            if let Some(completed) = &r.completed {
                pretty_kv(w, "Completed", completed)?;
            }
            if !r.blocked_on.is_empty() {
                pretty_kv(w, "Blocked on", r.blocked_on.join(", "))?;
            }
            pretty_kv(w, "Path", &r.path)?;
            if !r.info.is_empty() {
                writeln!(w)?;
                pretty_section(w, "Info")?;
                for line in &r.info {
                    writeln!(w, "  {line}")?;
                }
            }
            if !r.references.is_empty() {
                writeln!(w)?;
                pretty_section(w, "References")?;
                for reference in &r.references {
                    writeln!(
                        w,
                        "  {} {}: {}",
                        reference.id,
                        reference.name,
                        reference.reference.encode()
                    )?;
                    if !reference.tldr.is_empty() {
                        writeln!(w, "    {}", reference.tldr)?;
                    }
                }
            }
            Ok(())
        },
    )
}
