use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::{self, DocumentWriter, capitalize, unwrap_link, wrap_link};
use crate::error::{FormatError, TedError};

use super::todo::file_name;
use super::{Properties, new_timestamp};

const LINK_PREFIX: &str = "[link](";
const NOTEBOOK_PREFIX: &str = "Notebook: ";
const FILE_PREFIX: &str = "File: ";

/// What a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum Reference {
    Link(String),
    Notebook(String),
    File(String),
}

impl Reference {
    /// A web link. Targets without an `http` scheme get `https://`.
    pub fn link(url: &str) -> Self {
        let url = url.trim();
        if url.starts_with("http") {
            Self::Link(url.to_string())
        } else {
            Self::Link(format!("https://{url}"))
        }
    }

    /// The single body line stored under the reference heading.
    pub fn encode(&self) -> String {
        match self {
            Self::Link(url) => format!("{LINK_PREFIX}{url})"),
            Self::Notebook(text) => format!("{NOTEBOOK_PREFIX}{text}"),
            Self::File(name) => format!("{FILE_PREFIX}{}", wrap_link(name)),
        }
    }

    /// # Errors
    ///
    /// Returns [`FormatError::UnknownReference`] if the line matches none of
    /// the three encodings.
    pub fn decode(line: &str) -> Result<Self, FormatError> {
        if let Some(rest) = line.strip_prefix(LINK_PREFIX) {
            let url = rest.strip_suffix(')').unwrap_or(rest);
            return Ok(Self::Link(url.to_string()));
        }
        if let Some(text) = line.strip_prefix(NOTEBOOK_PREFIX) {
            return Ok(Self::Notebook(text.to_string()));
        }
        if let Some(rest) = line.strip_prefix(FILE_PREFIX)
            && rest.starts_with("[[")
            && rest.ends_with("]]")
        {
            return Ok(Self::File(unwrap_link(rest)));
        }
        Err(FormatError::UnknownReference(line.to_string()))
    }
}

/// A captured reference attached to one todo.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceData {
    pub properties: Properties,
    pub reference: Reference,
    /// Filename of the todo this reference documents.
    pub task: String,
    pub name: String,
    pub tldr: String,
    pub filename: String,
    pub filepath: PathBuf,
}

impl ReferenceData {
    pub const DEFAULT_NAME: &'static str = "Reference";

    pub fn new(id: impl Into<String>, reference: Reference, task: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            filename: Self::filename_for(&id),
            filepath: PathBuf::new(),
            properties: Properties::new(id, new_timestamp()),
            reference,
            task: task.into(),
            name: Self::DEFAULT_NAME.to_string(),
            tldr: String::new(),
        }
    }

    /// `<ID>.md`
    pub fn filename_for(id: &str) -> String {
        format!("{id}.md")
    }

    pub fn id(&self) -> &str {
        &self.properties.id
    }

    /// # Errors
    ///
    /// Fails only if the metadata cannot be serialized.
    pub fn encode(&self) -> Result<String, TedError> {
        Ok(DocumentWriter::new(&self.properties.to_metadata())?
            .text(&self.name, &self.reference.encode())
            .text(&capitalize("task"), &wrap_link(&self.task))
            .text(&capitalize("tldr"), &self.tldr)
            .finish())
    }

    /// # Errors
    ///
    /// Returns a [`FormatError`] if the metadata block is missing, the
    /// reference line is unrecognized, or the task link is absent.
    pub fn decode(text: &str, filepath: &Path) -> Result<Self, FormatError> {
        let doc = codec::decode(text)?;
        let head = doc.head()?;
        let reference = Reference::decode(&head.scalar())?;
        let task = doc
            .section(1)
            .map(|s| unwrap_link(&s.scalar()))
            .filter(|t| !t.is_empty())
            .ok_or(FormatError::MissingSection("task"))?;
        let tldr = doc.section(2).map(codec::Section::scalar).unwrap_or_default();

        Ok(Self {
            name: head.heading.clone(),
            properties: Properties::from_metadata(doc.metadata)?,
            reference,
            task,
            tldr,
            filename: file_name(filepath),
            filepath: filepath.to_path_buf(),
        })
    }

    /// # Errors
    ///
    /// [`TedError::Io`] on read failure, [`TedError::Format`] on decode
    /// failure.
    pub fn read(path: &Path) -> Result<Self, TedError> {
        let text = std::fs::read_to_string(path).map_err(|e| TedError::io(path, e))?;
        Self::decode(&text, path).map_err(|source| TedError::Format {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_gains_https_scheme() {
        assert_eq!(Reference::link("example.com/a"), Reference::Link("https://example.com/a".into()));
        assert_eq!(Reference::link("http://x.io"), Reference::Link("http://x.io".into()));
    }

    #[test]
    fn reference_lines() {
        assert_eq!(Reference::link("x.io").encode(), "[link](https://x.io)");
        assert_eq!(Reference::Notebook("p. 12".into()).encode(), "Notebook: p. 12");
        assert_eq!(Reference::File("scan.pdf".into()).encode(), "File: [[scan.pdf]]");

        for r in [
            Reference::Link("https://x.io/a_(b)".into()),
            Reference::Notebook("10-19-2026 sketch".into()),
            Reference::File("scan.pdf".into()),
        ] {
            assert_eq!(Reference::decode(&r.encode()), Ok(r));
        }
    }

    #[test]
    fn unknown_reference_line() {
        assert_eq!(
            Reference::decode("Podcast: ep 4"),
            Err(FormatError::UnknownReference("Podcast: ep 4".into()))
        );
        assert!(Reference::decode("File: scan.pdf").is_err());
    }

    #[test]
    fn reference_json_shape() {
        let json = serde_json::to_value(Reference::File("a.png".into())).expect("json");
        assert_eq!(json, serde_json::json!({"type": "file", "content": "a.png"}));
    }

    #[test]
    fn document_layout_and_decode() {
        let mut r = ReferenceData::new("R00004", Reference::link("docs.rs"), "T00001_Ship_release.md");
        r.tldr = "api docs".into();
        let text = r.encode().expect("encode");
        assert!(text.ends_with(
            "# Reference\n[link](https://docs.rs)\n# Task\n[[T00001_Ship_release.md]]\n# Tldr\napi docs\n"
        ));

        let path = PathBuf::from("ref/R00004.md");
        let back = ReferenceData::decode(&text, &path).expect("decode");
        assert_eq!(back.filename, "R00004.md");
        assert_eq!(back.task, "T00001_Ship_release.md");
        assert_eq!(back.tldr, "api docs");
        assert_eq!(back.reference, r.reference);
    }

    #[test]
    fn missing_task_link_is_an_error() {
        let text = "---\ncreated: x\nid: R1\n---\n# Reference\nNotebook: hi\n";
        assert_eq!(
            ReferenceData::decode(text, Path::new("R1.md")),
            Err(FormatError::MissingSection("task"))
        );
    }
}
