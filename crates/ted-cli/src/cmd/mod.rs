pub mod block;
pub mod completions;
pub mod done;
pub mod import;
pub mod inbox;
pub mod init;
pub mod list;
pub mod new;
pub mod project;
pub mod reference;
pub mod show;
pub mod status;
pub mod update;

use serde::Serialize;
use ted_core::vault::LoadFailure;
use ted_core::{Config, Status, StatusResolver, TodoData, Vault, VaultData};
use tracing::warn;

/// Open the configured vault and load a snapshot, logging skipped documents.
pub fn load_vault(config: &Config) -> anyhow::Result<(Vault<'_>, VaultData)> {
    let vault = Vault::open(config)?;
    let report = vault.load();
    log_failures(&report.failures);
    Ok((vault, report.data))
}

pub fn log_failures(failures: &[LoadFailure]) {
    for failure in failures {
        warn!(path = %failure.path.display(), error = %failure.error, "skipped unreadable document");
    }
}

/// Status of `todo` resolved over a snapshot that already holds the edit,
/// so a newly closed cycle shows up as blocked.
pub fn status_after(data: &mut VaultData, todo: &TodoData) -> Status {
    data.replace_todo(todo.clone());
    let resolver = StatusResolver::new(data);
    data.find_todo_by_filename(&todo.filename)
        .map_or(Status::NotDone, |saved| resolver.status(saved))
}

/// Uniform result for commands that write one document.
#[derive(Debug, Serialize)]
pub struct Written {
    pub ok: bool,
    pub id: String,
    pub path: String,
}

impl Written {
    pub fn new(id: &str, path: &std::path::Path) -> Self {
        Self {
            ok: true,
            id: id.to_string(),
            path: path.display().to_string(),
        }
    }
}

/// One todo as reported by `ls`, `show` and `status`.
#[derive(Debug, Serialize)]
pub struct TodoSummary {
    pub id: String,
    pub name: String,
    pub status: Status,
    pub tasks_done: usize,
    pub tasks_total: usize,
    pub tags: Vec<String>,
}

impl TodoSummary {
    pub fn new(todo: &TodoData, resolver: &StatusResolver<'_>) -> Self {
        Self {
            id: todo.id().to_string(),
            name: todo.name.clone(),
            status: resolver.status(todo),
            tasks_done: todo.tasks.iter().filter(|t| t.done).count(),
            tasks_total: todo.tasks.len(),
            tags: todo.tags().to_vec(),
        }
    }
}
