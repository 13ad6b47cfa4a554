//! `ted ls` — active todos grouped by directory or tag.

use crate::cmd::{TodoSummary, load_vault};
use crate::output::{OutputMode, pretty_section, render_mode};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::{self, Write};
use ted_core::{Config, StatusResolver, TodoData};

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Group by tag instead of directory.
    #[arg(long)]
    pub by_tag: bool,

    /// Show each todo's numbered task list.
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Serialize)]
struct ListReport {
    by: &'static str,
    groups: Vec<Group>,
}

#[derive(Debug, Serialize)]
struct Group {
    name: String,
    todos: Vec<TodoSummary>,
    #[serde(skip)]
    lines: Vec<String>,
}

impl Group {
    fn new<'t>(
        name: impl Into<String>,
        todos: impl IntoIterator<Item = &'t TodoData>,
        resolver: &StatusResolver<'_>,
        verbose: bool,
    ) -> Self {
        let mut group = Self {
            name: name.into(),
            todos: Vec::new(),
            lines: Vec::new(),
        };
        for todo in todos {
            group.todos.push(TodoSummary::new(todo, resolver));
            group.lines.push(resolver.status_line(todo, verbose));
        }
        group
    }
}

pub fn run_list(args: &ListArgs, config: &Config, output: OutputMode) -> Result<()> {
    let (vault, data) = load_vault(config)?;
    let resolver = StatusResolver::new(&data);

    let report = if args.by_tag {
        ListReport {
            by: "tag",
            groups: data
                .todos_by_tag()
                .into_iter()
                .map(|(tag, todos)| Group::new(tag, todos, &resolver, args.verbose))
                .collect(),
        }
    } else {
        ListReport {
            by: "directory",
            groups: vault
                .todos_by_directory(&data)
                .into_iter()
                .map(|(dir, todos)| Group::new(dir, todos, &resolver, args.verbose))
                .collect(),
        }
    };

    let label = if args.by_tag { "Tag" } else { "Directory" };
    render_mode(
        output,
        &report,
        |r, w| write_groups(w, label, &r.groups),
        |r, w| {
            for group in &r.groups {
                pretty_section(w, &format!("{label}: {} ({})", group.name, group.todos.len()))?;
                for line in &group.lines {
                    writeln!(w, "  {}", line.replace('\n', "\n  "))?;
                }
                writeln!(w)?;
            }
            if r.groups.is_empty() {
                writeln!(w, "No todos.")?;
            }
            Ok(())
        },
    )
}

fn write_groups(w: &mut dyn Write, label: &str, groups: &[Group]) -> io::Result<()> {
    for group in groups {
        writeln!(w, "{label}: {}", group.name)?;
        for line in &group.lines {
            writeln!(w, "\t{}", line.replace('\n', "\n\t"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_groups_are_tab_indented() {
        let groups = vec![
            Group {
                name: ".".into(),
                todos: Vec::new(),
                lines: vec!["T00001: Ship release ❌".into()],
            },
            Group {
                name: "home".into(),
                todos: Vec::new(),
                lines: vec!["T00002: Paint ✅\nTasks:\n 0. ✅ buy paint".into()],
            },
        ];
        let mut buf = Vec::new();
        write_groups(&mut buf, "Directory", &groups).expect("write");
        assert_eq!(
            String::from_utf8(buf).expect("utf8"),
            "Directory: .\n\tT00001: Ship release ❌\nDirectory: home\n\tT00002: Paint ✅\n\tTasks:\n\t 0. ✅ buy paint\n"
        );
    }
}
