//! `ted project` — create and list projects.

use crate::cmd::{Written, load_vault};
use crate::output::{OutputMode, pretty_section, render, render_mode};
use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Write as _;
use ted_core::id::format_id;
use ted_core::model::{EntityKind, single_line};
use ted_core::{Config, ProjectData};

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project.
    New(ProjectNewArgs),
    /// List projects.
    #[command(alias = "ls")]
    List,
}

#[derive(Args, Debug)]
pub struct ProjectNewArgs {
    /// Project name.
    pub name: String,

    /// One-line description.
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// 3-8 uppercase letters used as the ID prefix of its todos.
    #[arg(short, long)]
    pub shorthand: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProjectRow {
    id: String,
    name: String,
    shorthand: Option<String>,
    description: String,
    todos: usize,
}

pub fn run_project(command: &ProjectCommand, config: &Config, output: OutputMode) -> Result<()> {
    match command {
        ProjectCommand::New(args) => run_project_new(args, config, output),
        ProjectCommand::List => run_project_list(config, output),
    }
}

fn run_project_new(args: &ProjectNewArgs, config: &Config, output: OutputMode) -> Result<()> {
    let (vault, data) = load_vault(config)?;

    let id = format_id(EntityKind::Project, data.next_id(EntityKind::Project));
    let shorthand = args
        .shorthand
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if let Some(sh) = shorthand.as_deref()
        && data.projects.iter().any(|p| p.shorthand.as_deref() == Some(sh))
    {
        anyhow::bail!("shorthand '{sh}' is already used by another project");
    }

    let mut project = ProjectData::new(
        id,
        single_line("name", &args.name)?,
        single_line("description", &args.description)?,
        shorthand,
    )?;
    let path = vault.create_project(&mut project)?;
    render(output, &Written::new(project.id(), &path), |v, w| {
        writeln!(w, "✓ Created project {} at {}", v.id, v.path)
    })
}

fn run_project_list(config: &Config, output: OutputMode) -> Result<()> {
    let (_vault, data) = load_vault(config)?;

    let rows: Vec<ProjectRow> = data
        .projects
        .iter()
        .map(|p| ProjectRow {
            id: p.id().to_string(),
            name: p.name.clone(),
            shorthand: p.shorthand.clone(),
            description: p.description.clone(),
            todos: data
                .all_todos()
                .filter(|t| t.properties.project_id.as_deref() == Some(p.id()))
                .count(),
        })
        .collect();

    render_mode(
        output,
        &rows,
        |rows, w| {
            for r in rows {
                writeln!(w, "{}: {}", r.id, heading(r))?;
            }
            Ok(())
        },
        |rows, w| {
            pretty_section(w, &format!("Projects ({})", rows.len()))?;
            for r in rows {
                writeln!(w, "{:<8} {}  [{} todos]", r.id, heading(r), r.todos)?;
                if !r.description.is_empty() {
                    writeln!(w, "         {}", r.description)?;
                }
            }
            Ok(())
        },
    )
}

fn heading(row: &ProjectRow) -> String {
    row.shorthand
        .as_deref()
        .map_or_else(|| row.name.clone(), |sh| format!("{sh}: {}", row.name))
}
