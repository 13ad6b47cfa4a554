//! Vault directory access and the in-memory index.
//!
//! # Overview
//!
//! A [`Vault`] is a handle on the directory tree named by a [`Config`].
//! [`Vault::load`] walks `todos/`, `done/`, `projects/` and `ref/`
//! recursively and decodes every `.md` file into a [`VaultData`] snapshot.
//! Documents that fail to read or decode are reported in
//! [`LoadReport::failures`] and left out of the snapshot; one bad file never
//! hides the rest of the vault.
//!
//! Mutations rewrite whole files. There is no locking: the last writer wins.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write as _};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::TedError;
use crate::id::{format_todo_id, id_to_int, next_id};
use crate::model::{
    EntityKind, InboxItem, ProjectData, ReferenceData, TodoData, new_timestamp,
};

/// Tag bucket for todos without tags in [`VaultData::todos_by_tag`].
pub const UNTAGGED: &str = "untagged";

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything decoded from one walk of the vault.
#[derive(Debug, Clone, Default)]
pub struct VaultData {
    pub todos: Vec<TodoData>,
    pub dones: Vec<TodoData>,
    pub projects: Vec<ProjectData>,
    pub references: Vec<ReferenceData>,
}

/// A borrowed entity returned by [`VaultData::find`].
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Todo(&'a TodoData),
    Project(&'a ProjectData),
    Reference(&'a ReferenceData),
}

impl Entity<'_> {
    pub fn id(&self) -> &str {
        match self {
            Self::Todo(t) => t.id(),
            Self::Project(p) => p.id(),
            Self::Reference(r) => r.id(),
        }
    }
}

impl VaultData {
    /// Active todos followed by done todos.
    pub fn all_todos(&self) -> impl Iterator<Item = &TodoData> {
        self.todos.iter().chain(&self.dones)
    }

    /// Every id currently in use for `kind`. Inbox items are not indexed.
    pub fn ids(&self, kind: EntityKind) -> Vec<&str> {
        match kind {
            EntityKind::Todo => self.all_todos().map(TodoData::id).collect(),
            EntityKind::Project => self.projects.iter().map(ProjectData::id).collect(),
            EntityKind::Reference => self.references.iter().map(ReferenceData::id).collect(),
            EntityKind::Inbox => Vec::new(),
        }
    }

    /// Next free numeric id for `kind`.
    pub fn next_id(&self, kind: EntityKind) -> u64 {
        next_id(self.ids(kind))
    }

    /// Next todo id, using the project's shorthand prefix when it has one.
    pub fn next_todo_id(&self, project: Option<&ProjectData>) -> String {
        format_todo_id(
            project.and_then(|p| p.shorthand.as_deref()),
            self.next_id(EntityKind::Todo),
        )
    }

    /// Look up an entity by id, comparing numeric parts.
    ///
    /// # Errors
    ///
    /// Returns [`TedError::MalformedId`] if `id` has no digits.
    pub fn find(&self, kind: EntityKind, id: &str) -> Result<Option<Entity<'_>>, TedError> {
        Ok(match kind {
            EntityKind::Todo => self.find_todo(id)?.map(Entity::Todo),
            EntityKind::Project => self.find_project(id)?.map(Entity::Project),
            EntityKind::Reference => self.find_reference(id)?.map(Entity::Reference),
            EntityKind::Inbox => {
                query_int(id)?;
                None
            }
        })
    }

    /// Search active todos, then done todos.
    ///
    /// # Errors
    ///
    /// Returns [`TedError::MalformedId`] if `id` has no digits.
    pub fn find_todo(&self, id: &str) -> Result<Option<&TodoData>, TedError> {
        let n = query_int(id)?;
        Ok(self.all_todos().find(|t| id_to_int(t.id()) == Some(n)))
    }

    /// # Errors
    ///
    /// Returns [`TedError::MalformedId`] if `id` has no digits.
    pub fn find_project(&self, id: &str) -> Result<Option<&ProjectData>, TedError> {
        let n = query_int(id)?;
        Ok(self.projects.iter().find(|p| id_to_int(p.id()) == Some(n)))
    }

    /// # Errors
    ///
    /// Returns [`TedError::MalformedId`] if `id` has no digits.
    pub fn find_reference(&self, id: &str) -> Result<Option<&ReferenceData>, TedError> {
        let n = query_int(id)?;
        Ok(self.references.iter().find(|r| id_to_int(r.id()) == Some(n)))
    }

    /// Like [`VaultData::find_todo`], but absence is an error.
    ///
    /// # Errors
    ///
    /// [`TedError::MalformedId`] or [`TedError::NotFound`].
    pub fn require_todo(&self, id: &str) -> Result<&TodoData, TedError> {
        self.find_todo(id)?.ok_or_else(|| TedError::NotFound {
            kind: EntityKind::Todo,
            id: id.to_string(),
        })
    }

    /// # Errors
    ///
    /// [`TedError::MalformedId`] or [`TedError::NotFound`].
    pub fn require_project(&self, id: &str) -> Result<&ProjectData, TedError> {
        self.find_project(id)?.ok_or_else(|| TedError::NotFound {
            kind: EntityKind::Project,
            id: id.to_string(),
        })
    }

    /// Active or done todo stored under `filename`.
    pub fn find_todo_by_filename(&self, filename: &str) -> Option<&TodoData> {
        self.all_todos().find(|t| t.filename == filename)
    }

    /// True if the todo lives in `done/`.
    pub fn is_done(&self, todo: &TodoData) -> bool {
        self.dones.iter().any(|d| d.filename == todo.filename)
    }

    /// References attached to the todo stored under `filename`.
    pub fn references_for<'a>(&'a self, filename: &'a str) -> impl Iterator<Item = &'a ReferenceData> {
        self.references.iter().filter(move |r| r.task == filename)
    }

    /// Active todos grouped by tag. A todo appears once per tag; untagged
    /// todos land under [`UNTAGGED`].
    pub fn todos_by_tag(&self) -> BTreeMap<&str, Vec<&TodoData>> {
        let mut groups: BTreeMap<&str, Vec<&TodoData>> = BTreeMap::new();
        for todo in &self.todos {
            if todo.tags().is_empty() {
                groups.entry(UNTAGGED).or_default().push(todo);
            }
            for tag in todo.tags() {
                groups.entry(tag.as_str()).or_default().push(todo);
            }
        }
        groups
    }

    /// Swap in an edited copy of a todo, matched by filename. Returns
    /// `false` if the snapshot holds no todo of that name.
    pub fn replace_todo(&mut self, todo: TodoData) -> bool {
        match self
            .todos
            .iter_mut()
            .chain(self.dones.iter_mut())
            .find(|t| t.filename == todo.filename)
        {
            Some(slot) => {
                *slot = todo;
                true
            }
            None => false,
        }
    }
}

fn query_int(id: &str) -> Result<u64, TedError> {
    id_to_int(id).ok_or_else(|| TedError::MalformedId(id.to_string()))
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// A document skipped during load.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: TedError,
}

/// Result of [`Vault::load`]: the snapshot plus every skipped document.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub data: VaultData,
    pub failures: Vec<LoadFailure>,
}

/// Handle on a vault directory.
#[derive(Debug, Clone, Copy)]
pub struct Vault<'c> {
    config: &'c Config,
}

impl<'c> Vault<'c> {
    /// Open an existing vault.
    ///
    /// # Errors
    ///
    /// Returns [`TedError::VaultMissing`] if the root directory does not
    /// exist.
    pub fn open(config: &'c Config) -> Result<Self, TedError> {
        if !config.vault_dir.is_dir() {
            return Err(TedError::VaultMissing(config.vault_dir.clone()));
        }
        Ok(Self { config })
    }

    /// Create the vault root and all subdirectories. Safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns [`TedError::Io`] if a directory cannot be created.
    pub fn init(config: &'c Config) -> Result<Self, TedError> {
        for dir in config.required_dirs() {
            if !dir.is_dir() {
                fs::create_dir_all(&dir).map_err(|e| TedError::io(&dir, e))?;
                info!(dir = %dir.display(), "created vault directory");
            }
        }
        Ok(Self { config })
    }

    /// Walk and decode the whole vault.
    pub fn load(&self) -> LoadReport {
        let mut failures = Vec::new();
        let data = VaultData {
            todos: load_dir(&self.config.todo_dir(), TodoData::read, &mut failures),
            dones: load_dir(&self.config.done_dir(), TodoData::read, &mut failures),
            projects: load_dir(&self.config.projects_dir(), ProjectData::read, &mut failures),
            references: load_dir(&self.config.ref_dir(), ReferenceData::read, &mut failures),
        };
        debug!(
            todos = data.todos.len(),
            dones = data.dones.len(),
            projects = data.projects.len(),
            references = data.references.len(),
            failures = failures.len(),
            "loaded vault"
        );
        LoadReport { data, failures }
    }

    /// Active todos of `data` grouped by their directory relative to
    /// `todos/` (`.` at the top), in walk order.
    pub fn todos_by_directory<'d>(&self, data: &'d VaultData) -> Vec<(String, Vec<&'d TodoData>)> {
        let root = self.config.todo_dir();
        let mut groups: Vec<(String, Vec<&TodoData>)> = Vec::new();
        for todo in &data.todos {
            let dir = relative_dir(&root, &todo.filepath);
            match groups.iter_mut().find(|(name, _)| *name == dir) {
                Some((_, todos)) => todos.push(todo),
                None => groups.push((dir, vec![todo])),
            }
        }
        groups
    }

    /// Decode every document in `inbox/`.
    pub fn load_inbox(&self) -> (Vec<InboxItem>, Vec<LoadFailure>) {
        let mut failures = Vec::new();
        let items = load_dir(&self.config.inbox_dir(), read_inbox_item, &mut failures);
        (items, failures)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Place a new todo in `todos/` and record its path.
    ///
    /// # Errors
    ///
    /// Fails if a file of the same name exists or cannot be written.
    pub fn create_todo(&self, todo: &mut TodoData) -> Result<PathBuf, TedError> {
        let path = self.config.todo_dir().join(&todo.filename);
        write_new(&path, &todo.encode()?)?;
        info!(id = todo.id(), path = %path.display(), "created todo");
        todo.filepath.clone_from(&path);
        Ok(path)
    }

    /// Rewrite a todo in place.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be encoded or written.
    pub fn save_todo(&self, todo: &TodoData) -> Result<(), TedError> {
        let path = if todo.filepath.as_os_str().is_empty() {
            self.config.todo_dir().join(&todo.filename)
        } else {
            todo.filepath.clone()
        };
        write_file(&path, &todo.encode()?)?;
        debug!(id = todo.id(), path = %path.display(), "saved todo");
        Ok(())
    }

    /// Stamp `completed`, write the todo to `done/`, then delete the source.
    ///
    /// # Errors
    ///
    /// Fails if the done copy cannot be written or the source removed. The
    /// done copy is written first, so a failed removal leaves both files.
    pub fn complete_todo(&self, todo: &mut TodoData) -> Result<PathBuf, TedError> {
        todo.mark_completed();
        let target = self.config.done_dir().join(&todo.filename);
        write_file(&target, &todo.encode()?)?;

        let source = std::mem::replace(&mut todo.filepath, target.clone());
        if !source.as_os_str().is_empty() && source != target && source.exists() {
            fs::remove_file(&source).map_err(|e| TedError::io(&source, e))?;
        }
        info!(id = todo.id(), path = %target.display(), "completed todo");
        Ok(target)
    }

    /// # Errors
    ///
    /// Fails if a file of the same name exists or cannot be written.
    pub fn create_project(&self, project: &mut ProjectData) -> Result<PathBuf, TedError> {
        let path = self.config.projects_dir().join(&project.filename);
        write_new(&path, &project.encode()?)?;
        info!(id = project.id(), path = %path.display(), "created project");
        project.filepath.clone_from(&path);
        Ok(path)
    }

    /// # Errors
    ///
    /// Fails if a file of the same name exists or cannot be written.
    pub fn create_reference(&self, reference: &mut ReferenceData) -> Result<PathBuf, TedError> {
        let path = self.config.ref_dir().join(&reference.filename);
        write_new(&path, &reference.encode()?)?;
        info!(id = reference.id(), path = %path.display(), "created reference");
        reference.filepath.clone_from(&path);
        Ok(path)
    }

    /// Copy a file into `files/` and return the stored filename. A name
    /// already taken gets a timestamp prefix.
    ///
    /// # Errors
    ///
    /// Fails if `source` has no file name or cannot be copied.
    pub fn store_file(&self, source: &Path) -> Result<String, TedError> {
        let name = attachment_name(&source.to_string_lossy())?;
        let target = self.free_attachment_path(&name);
        fs::copy(source, &target).map_err(|e| TedError::io(source, e))?;
        info!(source = %source.display(), target = %target.display(), "stored file");
        Ok(crate::model::todo::file_name(&target))
    }

    /// Stream an attachment into `files/` and return the stored filename.
    /// A name already taken gets a timestamp prefix; existing files are
    /// never replaced.
    ///
    /// # Errors
    ///
    /// Fails if `name` has no file component or the copy fails.
    pub fn write_attachment(&self, name: &str, mut reader: impl Read) -> Result<String, TedError> {
        let path = self.free_attachment_path(&attachment_name(name)?);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| TedError::io(&path, e))?;
        io::copy(&mut reader, &mut file).map_err(|e| TedError::io(&path, e))?;
        debug!(path = %path.display(), "wrote attachment");
        Ok(crate::model::todo::file_name(&path))
    }

    /// Write an inbox document into `inbox/`.
    ///
    /// # Errors
    ///
    /// Fails if the document cannot be encoded or written.
    pub fn write_inbox_item(&self, item: &InboxItem) -> Result<PathBuf, TedError> {
        let path = self.config.inbox_dir().join(item.filename());
        write_file(&path, &item.encode()?)?;
        info!(id = %item.id, path = %path.display(), "wrote inbox item");
        Ok(path)
    }

    fn free_attachment_path(&self, name: &str) -> PathBuf {
        let dir = self.config.files_dir();
        let stamp = new_timestamp().replace(':', "");
        std::iter::once(name.to_string())
            .chain(std::iter::once(format!("{stamp}_{name}")))
            .chain((2u32..).map(|n| format!("{stamp}_{n}_{name}")))
            .map(|candidate| dir.join(candidate))
            .find(|path| !path.exists())
            .unwrap_or_else(|| dir.join(name))
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

/// `.md` files under `root`, sorted. A missing `root` yields nothing.
fn markdown_files(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        warn!(dir = %root.display(), "vault directory missing; skipping");
        return Vec::new();
    }

    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(%err, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "md")
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Parent directory of `path` relative to `root`, `.` for `root` itself.
fn relative_dir(root: &Path, path: &Path) -> String {
    path.parent()
        .and_then(|parent| parent.strip_prefix(root).ok())
        .map(|rel| rel.to_string_lossy().into_owned())
        .filter(|rel| !rel.is_empty())
        .unwrap_or_else(|| ".".to_string())
}

fn load_dir<T>(
    root: &Path,
    read: impl Fn(&Path) -> Result<T, TedError>,
    failures: &mut Vec<LoadFailure>,
) -> Vec<T> {
    markdown_files(root)
        .into_iter()
        .filter_map(|path| record(read(&path), &path, failures))
        .collect()
}

fn record<T>(result: Result<T, TedError>, path: &Path, failures: &mut Vec<LoadFailure>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            debug!(path = %path.display(), %error, "skipping document");
            failures.push(LoadFailure {
                path: path.to_path_buf(),
                error,
            });
            None
        }
    }
}

fn read_inbox_item(path: &Path) -> Result<InboxItem, TedError> {
    let text = fs::read_to_string(path).map_err(|e| TedError::io(path, e))?;
    InboxItem::decode(&text).map_err(|source| TedError::Format {
        path: path.to_path_buf(),
        source,
    })
}

fn attachment_name(raw: &str) -> Result<String, TedError> {
    Path::new(raw)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            TedError::io(
                raw,
                io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })
}

fn write_file(path: &Path, text: &str) -> Result<(), TedError> {
    fs::write(path, text).map_err(|e| TedError::io(path, e))
}

fn write_new(path: &Path, text: &str) -> Result<(), TedError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| TedError::io(path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| TedError::io(path, e))
}
