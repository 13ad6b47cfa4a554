//! Typed vault entities built on the text-block codec.
//!
//! - [`todo`] — todos with a goal, a task checklist and an info log.
//! - [`project`] — projects, optionally carrying a shorthand id prefix.
//! - [`reference`] — links, notebook entries and stored files attached to a todo.
//! - [`inbox`] — captured items imported from the intake server.

pub mod inbox;
pub mod project;
pub mod properties;
pub mod reference;
pub mod task;
pub mod todo;

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TedError;

pub use inbox::InboxItem;
pub use project::ProjectData;
pub use properties::Properties;
pub use reference::{Reference, ReferenceData};
pub use task::Task;
pub use todo::TodoData;

/// Timestamp layout used in metadata and info lines.
pub const TIMESTAMP_FORMAT: &str = "%m-%d-%Y_%H:%M:%S";

/// Longest slug used in generated filenames.
pub const MAX_SLUG_LEN: usize = 20;

/// Current local time in [`TIMESTAMP_FORMAT`].
pub fn new_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// The document kinds stored in a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Todo,
    Project,
    Reference,
    Inbox,
}

impl EntityKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::Project => "project",
            Self::Reference => "reference",
            Self::Inbox => "inbox",
        }
    }

    /// Single-letter id prefix (`T00001`, `P00001`, ...).
    pub const fn id_prefix(self) -> char {
        match self {
            Self::Todo => 'T',
            Self::Project => 'P',
            Self::Reference => 'R',
            Self::Inbox => 'I',
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived todo status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotDone,
    Done,
    Blocked,
}

impl Status {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Done => "✅",
            Self::NotDone => "❌",
            Self::Blocked => "⛔",
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::NotDone => "not_done",
            Self::Done => "done",
            Self::Blocked => "blocked",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turn a display name into a filename-safe slug.
///
/// Whitespace runs become `_`, characters other than alphanumerics and `-`
/// are dropped, and whole words are kept while the slug fits in
/// [`MAX_SLUG_LEN`] characters. A single overlong word is truncated.
pub fn slugify(name: &str) -> String {
    let words: Vec<String> = name
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect();

    let mut slug = String::new();
    for word in &words {
        let needed = if slug.is_empty() {
            word.chars().count()
        } else {
            slug.chars().count() + 1 + word.chars().count()
        };
        if needed > MAX_SLUG_LEN {
            break;
        }
        if !slug.is_empty() {
            slug.push('_');
        }
        slug.push_str(word);
    }

    if slug.is_empty() {
        slug = words
            .first()
            .map(|word| word.chars().take(MAX_SLUG_LEN).collect())
            .unwrap_or_else(|| "untitled".to_string());
    }
    slug
}

/// A project shorthand is 3-8 uppercase ASCII letters. Digits would be read
/// back as part of the todo sequence number.
pub fn is_valid_shorthand(shorthand: &str) -> bool {
    (3..=8).contains(&shorthand.len()) && shorthand.chars().all(|c| c.is_ascii_uppercase())
}

/// Trim `text` and reject embedded line breaks.
///
/// Names, goals, tasks and info lines each occupy one line of a document; a
/// line break would start a new section or list item on the next read.
///
/// # Errors
///
/// Returns [`TedError::MultilineText`] naming `field`.
pub fn single_line(field: &'static str, text: &str) -> Result<String, TedError> {
    let text = text.trim();
    if text.contains(['\n', '\r']) {
        return Err(TedError::MultilineText(field));
    }
    Ok(text.to_string())
}
