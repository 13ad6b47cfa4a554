//! `ted new` — create a todo.

use crate::cmd::{Written, load_vault};
use crate::output::{OutputMode, render};
use anyhow::Result;
use clap::Args;
use std::io::Write as _;
use ted_core::model::single_line;
use ted_core::{Config, TodoData};

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Todo name.
    pub name: String,

    /// Pass/fail criteria for the todo.
    #[arg(short, long)]
    pub goal: String,

    /// First task to do.
    #[arg(short, long)]
    pub task: String,

    /// Project ID; a project shorthand becomes the todo ID prefix.
    #[arg(short, long)]
    pub project: Option<String>,

    /// Tags (repeatable).
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

pub fn run_new(args: &NewArgs, config: &Config, output: OutputMode) -> Result<()> {
    let (vault, data) = load_vault(config)?;

    let project = args
        .project
        .as_deref()
        .map(|id| data.require_project(id))
        .transpose()?;

    let mut todo = TodoData::new(
        data.next_todo_id(project),
        single_line("name", &args.name)?,
        single_line("goal", &args.goal)?,
        single_line("task", &args.task)?,
    );
    todo.properties.project_id = project.map(|p| p.id().to_string());
    for tag in &args.tags {
        todo.properties.add_tag(tag);
    }

    let path = vault.create_todo(&mut todo)?;
    render(output, &Written::new(todo.id(), &path), |v, w| {
        writeln!(w, "✓ Created {} at {}", v.id, v.path)
    })
}
