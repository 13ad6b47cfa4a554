//! Text-block codec for vault documents.
//!
//! # Format
//!
//! Every document is a `---`-delimited YAML metadata block followed by a
//! sequence of sections. A section starts at a line beginning with `# ` and
//! runs until the next such line:
//!
//! ```text
//! ---
//! created: 10-19-2026_09:12:44
//! id: T00001
//! completed: null
//! project_id: '[[P00002]]'
//! tags: []
//! ---
//! # Ship release
//! CI green
//! # Tasks
//! - [ ] write changelog
//! # Info
//! - 10-19-2026_09:40:02 | Completed: tag build
//! ```
//!
//! Section bodies are one of three shapes: a single text line, a checklist
//! (`- [ ] ` / `- [x] ` lines) or a bullet list (`- ` lines). Lines that do
//! not match the expected shape are ignored on decode.
//!
//! There is no escaping. Free text containing `[[`, `]]`, a leading `# ` or a
//! leading `- ` will not survive a round trip.

pub mod frontmatter;

use serde_yaml::{Mapping, Value};

use crate::error::FormatError;
use crate::model::Task;

pub use frontmatter::{parse_metadata, split_metadata};

/// Marker that opens a section heading line.
pub const HEADING_MARKER: &str = "# ";

const TASK_PENDING: &str = "- [ ] ";
const TASK_DONE: &str = "- [x] ";
const LIST_MARKER: &str = "- ";

// ---------------------------------------------------------------------------
// Decoded document
// ---------------------------------------------------------------------------

/// A document split into its metadata mapping and raw sections.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub metadata: Mapping,
    pub sections: Vec<Section>,
}

/// One `# Heading` section and the raw lines under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub lines: Vec<String>,
}

impl Section {
    /// The first body line, trimmed. Empty when the section has no body.
    pub fn scalar(&self) -> String {
        self.lines
            .first()
            .map(|line| line.trim().to_string())
            .unwrap_or_default()
    }

    /// Checklist entries, in document order.
    pub fn tasks(&self) -> Vec<Task> {
        self.lines.iter().filter_map(|line| decode_task(line)).collect()
    }

    /// Bullet list entries, in document order. Text after the `- ` marker is
    /// kept verbatim.
    pub fn list_items(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter_map(|line| line.strip_prefix(LIST_MARKER))
            .map(str::to_string)
            .collect()
    }
}

impl Document {
    /// Section at a fixed position, if present.
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// The first section, which every entity kind uses for its name line.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::MissingSection`] if the document has no
    /// sections at all.
    pub fn head(&self) -> Result<&Section, FormatError> {
        self.sections
            .first()
            .ok_or(FormatError::MissingSection("name"))
    }
}

/// Decode raw document text into metadata and sections.
///
/// # Errors
///
/// Returns [`FormatError::MissingMetadata`] when the text does not open with
/// a closed `---` block, or [`FormatError::InvalidMetadata`] when the block
/// is not a YAML mapping.
pub fn decode(text: &str) -> Result<Document, FormatError> {
    let (yaml, body) = split_metadata(text).ok_or(FormatError::MissingMetadata)?;
    let metadata = parse_metadata(yaml)?;
    Ok(Document {
        metadata,
        sections: split_sections(body),
    })
}

/// Split a document body into sections. Lines before the first heading are
/// dropped.
pub fn split_sections(body: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    for line in body.lines() {
        if let Some(heading) = line.strip_prefix(HEADING_MARKER) {
            sections.push(Section {
                heading: heading.trim().to_string(),
                lines: Vec::new(),
            });
        } else if let Some(current) = sections.last_mut() {
            current.lines.push(line.to_string());
        }
    }
    sections
}

fn decode_task(line: &str) -> Option<Task> {
    if let Some(rest) = line.strip_prefix(TASK_DONE) {
        return Some(Task::new(rest.trim(), true));
    }
    line.strip_prefix(TASK_PENDING)
        .map(|rest| Task::new(rest.trim(), false))
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Incremental document builder. Sections are emitted in call order.
#[derive(Debug)]
pub struct DocumentWriter {
    out: String,
}

impl DocumentWriter {
    /// Start a document with the given metadata block.
    ///
    /// # Errors
    ///
    /// Fails if the mapping cannot be serialized as YAML.
    pub fn new(metadata: &Mapping) -> Result<Self, serde_yaml::Error> {
        let yaml = serde_yaml::to_string(metadata)?;
        let mut out = String::with_capacity(yaml.len() + 128);
        out.push_str("---\n");
        out.push_str(&yaml);
        if !yaml.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("---\n");
        Ok(Self { out })
    }

    /// A heading followed by one line of text.
    #[must_use]
    pub fn text(mut self, heading: &str, body: &str) -> Self {
        self.heading(heading);
        self.out.push_str(body);
        self.out.push('\n');
        self
    }

    /// A heading followed by one checklist line per task.
    #[must_use]
    pub fn checklist(mut self, heading: &str, tasks: &[Task]) -> Self {
        self.heading(heading);
        for task in tasks {
            self.out.push_str(if task.done { TASK_DONE } else { TASK_PENDING });
            self.out.push_str(&task.description);
            self.out.push('\n');
        }
        self
    }

    /// A heading followed by one bullet line per item.
    #[must_use]
    pub fn list(mut self, heading: &str, items: &[String]) -> Self {
        self.heading(heading);
        for item in items {
            self.out.push_str(LIST_MARKER);
            self.out.push_str(item);
            self.out.push('\n');
        }
        self
    }

    /// Free text with no heading, followed by a blank line.
    #[must_use]
    pub fn body(mut self, text: &str) -> Self {
        self.out.push_str(text);
        self.out.push_str("\n\n");
        self
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn heading(&mut self, heading: &str) {
        self.out.push_str(HEADING_MARKER);
        self.out.push_str(heading);
        self.out.push('\n');
    }
}

/// Capitalize a fixed section key the way headings are written
/// (`tasks` -> `Tasks`, `TLDR` -> `Tldr`).
pub fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    chars.next().map_or_else(String::new, |first| {
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect()
    })
}

// ---------------------------------------------------------------------------
// Link syntax and scalar helpers
// ---------------------------------------------------------------------------

/// Wrap a target in `[[...]]` link syntax.
pub fn wrap_link(target: &str) -> String {
    format!("[[{target}]]")
}

/// Strip `[[...]]` link syntax (and stray quotes) from a stored value.
pub fn unwrap_link(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('"');
    let inner = trimmed.strip_prefix("[[").unwrap_or(trimmed);
    let inner = inner.strip_suffix("]]").unwrap_or(inner);
    inner.trim().to_string()
}

/// Render a YAML scalar as a string. `null` and collections yield `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Read a list of strings from a YAML value. A bare scalar is treated as a
/// one-element list.
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(seq) => seq.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}
