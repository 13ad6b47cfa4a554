use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::codec::{self, DocumentWriter, capitalize};
use crate::error::{FormatError, TedError};

use super::{Properties, Status, Task, new_timestamp, slugify};

/// A todo document: name, pass/fail goal, task checklist and info log.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoData {
    pub name: String,
    pub goal: String,
    pub filename: String,
    pub filepath: PathBuf,
    pub tasks: Vec<Task>,
    pub properties: Properties,
    pub info: Vec<String>,
}

impl TodoData {
    /// A fresh todo with one pending task and an empty info log.
    ///
    /// `filepath` stays empty until the vault places the document.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        goal: impl Into<String>,
        first_task: impl Into<String>,
    ) -> Self {
        let id = id.into();
        let name = name.into();
        Self {
            filename: Self::filename_for(&id, &name),
            filepath: PathBuf::new(),
            goal: goal.into(),
            tasks: vec![Task::pending(first_task)],
            properties: Properties::new(id, new_timestamp()),
            info: Vec::new(),
            name,
        }
    }

    /// `<ID>_<slug>.md`
    pub fn filename_for(id: &str, name: &str) -> String {
        format!("{id}_{}.md", slugify(name))
    }

    pub fn id(&self) -> &str {
        &self.properties.id
    }

    pub fn tags(&self) -> &[String] {
        &self.properties.tags
    }

    /// True when every task is done; vacuously true with no tasks.
    pub fn is_completed(&self) -> bool {
        self.tasks.iter().all(|t| t.done)
    }

    pub fn add_info(&mut self, line: impl Into<String>) {
        self.info.push(line.into());
    }

    pub fn add_task(&mut self, description: impl Into<String>) {
        self.tasks.push(Task::pending(description));
    }

    /// Mark the task at `index` done and log it in `info`.
    ///
    /// # Errors
    ///
    /// Returns [`TedError::IndexOutOfRange`] without touching the todo when
    /// `index` is not a valid task position.
    pub fn mark_task_done(&mut self, index: usize) -> Result<(), TedError> {
        self.mark_task_done_at(index, &new_timestamp())
    }

    /// [`TodoData::mark_task_done`] with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Same as [`TodoData::mark_task_done`].
    pub fn mark_task_done_at(&mut self, index: usize, timestamp: &str) -> Result<(), TedError> {
        let len = self.tasks.len();
        let task = self
            .tasks
            .get_mut(index)
            .ok_or(TedError::IndexOutOfRange { index, len })?;
        task.mark_done();
        let line = format!("{timestamp} | Completed: {}", task.description);
        self.add_info(line);
        Ok(())
    }

    /// Mark every pending task done and log a single summary line.
    pub fn mark_all_done(&mut self) {
        for task in self.tasks.iter_mut().filter(|t| !t.done) {
            task.mark_done();
        }
        self.add_info(format!("{} | All tasks marked as done.", new_timestamp()));
    }

    /// Stamp the `completed` property.
    pub fn mark_completed(&mut self) {
        self.properties.completed = Some(new_timestamp());
    }

    /// `id: name <symbol>`; verbose adds one numbered line per task.
    pub fn status_line(&self, status: Status, verbose: bool) -> String {
        let mut out = format!("{}: {} {}", self.id(), self.name, status.symbol());
        if verbose {
            out.push_str("\nTasks:");
            for (i, task) in self.tasks.iter().enumerate() {
                let _ = write!(out, "\n {i}. {}", task.status());
            }
        }
        out
    }

    /// Render the document text.
    ///
    /// # Errors
    ///
    /// Fails only if the metadata cannot be serialized.
    pub fn encode(&self) -> Result<String, TedError> {
        Ok(DocumentWriter::new(&self.properties.to_metadata())?
            .text(&self.name, &self.goal)
            .checklist(&capitalize("tasks"), &self.tasks)
            .list(&capitalize("info"), &self.info)
            .finish())
    }

    /// Parse document text. `filepath` is recorded as the document's origin.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] if the metadata block or name section is
    /// missing, or required metadata fields are absent.
    pub fn decode(text: &str, filepath: &Path) -> Result<Self, FormatError> {
        let codec::Document { metadata, sections } = codec::decode(text)?;
        let properties = Properties::from_metadata(metadata)?;
        let head = sections.first().ok_or(FormatError::MissingSection("name"))?;

        Ok(Self {
            name: head.heading.clone(),
            goal: head.scalar(),
            filename: file_name(filepath),
            filepath: filepath.to_path_buf(),
            tasks: sections.get(1).map(codec::Section::tasks).unwrap_or_default(),
            properties,
            info: sections
                .get(2)
                .map(codec::Section::list_items)
                .unwrap_or_default(),
        })
    }

    /// Read and decode a todo file.
    ///
    /// # Errors
    ///
    /// [`TedError::Io`] if the file cannot be read, [`TedError::Format`] if
    /// it does not decode.
    pub fn read(path: &Path) -> Result<Self, TedError> {
        let text = std::fs::read_to_string(path).map_err(|e| TedError::io(path, e))?;
        Self::decode(&text, path).map_err(|source| TedError::Format {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
