//! `ted update` — mark tasks, add tasks, info lines and tags.

use crate::cmd::{load_vault, status_after};
use crate::output::{OutputMode, render};
use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;
use std::io::Write as _;
use ted_core::model::single_line;
use ted_core::{Config, Status, TodoData};

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    /// Todo ID.
    pub id: String,

    /// Mark the task at this 0-based index done (repeatable).
    #[arg(long = "done", value_name = "INDEX")]
    pub done: Vec<usize>,

    /// Mark every task done.
    #[arg(long, conflicts_with = "done")]
    pub all: bool,

    /// Append a pending task (repeatable).
    #[arg(long = "task", value_name = "TEXT")]
    pub tasks: Vec<String>,

    /// Append a line to the info log.
    #[arg(long)]
    pub info: Option<String>,

    /// Add a tag (repeatable); existing tags are ignored.
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

impl UpdateArgs {
    const fn is_empty(&self) -> bool {
        self.done.is_empty()
            && !self.all
            && self.tasks.is_empty()
            && self.info.is_none()
            && self.tags.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct UpdateReport {
    ok: bool,
    id: String,
    status: Status,
    changes: Vec<String>,
    #[serde(skip)]
    line: String,
}

pub fn run_update(args: &UpdateArgs, config: &Config, output: OutputMode) -> Result<()> {
    if args.is_empty() {
        bail!("nothing to update: pass --done, --all, --task, --info or --tag");
    }

    let (vault, mut data) = load_vault(config)?;
    let mut todo = data.require_todo(&args.id)?.clone();
    let changes = apply(&mut todo, args)?;
    vault.save_todo(&todo)?;

    let status = status_after(&mut data, &todo);
    let report = UpdateReport {
        ok: true,
        id: todo.id().to_string(),
        status,
        changes,
        line: todo.status_line(status, false),
    };
    render(output, &report, |r, w| {
        for change in &r.changes {
            writeln!(w, "✓ {change}")?;
        }
        writeln!(w, "{}", r.line)
    })
}

/// Apply every requested edit to `todo`, failing before any write when a
/// task index is out of range or a text spans lines.
fn apply(todo: &mut TodoData, args: &UpdateArgs) -> Result<Vec<String>> {
    let tasks = args
        .tasks
        .iter()
        .map(|task| single_line("task", task))
        .collect::<Result<Vec<_>, _>>()?;
    let info = args
        .info
        .as_deref()
        .map(|info| single_line("info", info))
        .transpose()?;

    let mut changes = Vec::new();

    if args.all {
        todo.mark_all_done();
        changes.push("marked all tasks done".to_string());
    }
    for &index in &args.done {
        todo.mark_task_done(index)?;
        changes.push(format!("marked task {index} done"));
    }
    for task in tasks {
        changes.push(format!("added task '{task}'"));
        todo.add_task(task);
    }
    if let Some(info) = info {
        todo.add_info(info);
        changes.push("added info".to_string());
    }
    for tag in &args.tags {
        if todo.properties.add_tag(tag) {
            changes.push(format!("tagged '{tag}'"));
        }
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ted_core::TedError;

    fn todo() -> TodoData {
        TodoData::new("T00001", "Ship release", "CI green", "write changelog")
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let mut t = todo();
        let args = UpdateArgs {
            id: "1".into(),
            done: vec![3],
            ..UpdateArgs::default()
        };
        let err = apply(&mut t, &args).expect_err("index 3 is out of range");
        assert!(matches!(
            err.downcast_ref::<TedError>(),
            Some(TedError::IndexOutOfRange { index: 3, len: 1 })
        ));
    }

    #[test]
    fn edits_are_applied_in_order() {
        let mut t = todo();
        let args = UpdateArgs {
            id: "1".into(),
            done: vec![0],
            tasks: vec!["tag the release".into()],
            info: Some("waiting on review".into()),
            tags: vec!["work".into(), "work".into()],
            ..UpdateArgs::default()
        };
        let changes = apply(&mut t, &args).expect("apply");
        assert_eq!(changes.len(), 4);
        assert!(t.tasks[0].done);
        assert!(!t.tasks[1].done);
        assert_eq!(t.tags(), ["work".to_string()]);
        assert_eq!(t.info.last().map(String::as_str), Some("waiting on review"));
    }

    #[test]
    fn multiline_text_is_rejected_before_any_edit() {
        let mut t = todo();
        t.add_info("keep me");
        let before = t.clone();
        let args = UpdateArgs {
            id: "1".into(),
            done: vec![0],
            tasks: vec!["split\n# Info".into()],
            ..UpdateArgs::default()
        };
        let err = apply(&mut t, &args).expect_err("task spans two lines");
        assert!(matches!(
            err.downcast_ref::<TedError>(),
            Some(TedError::MultilineText("task"))
        ));
        assert_eq!(t, before);

        let args = UpdateArgs {
            id: "1".into(),
            info: Some("line one\r\nline two".into()),
            ..UpdateArgs::default()
        };
        assert!(apply(&mut t, &args).is_err());
        assert_eq!(t.info, vec!["keep me".to_string()]);
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(
            UpdateArgs {
                id: "1".into(),
                ..UpdateArgs::default()
            }
            .is_empty()
        );
    }
}
