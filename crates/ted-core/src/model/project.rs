use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::codec::{self, DocumentWriter, capitalize, scalar_to_string};
use crate::error::{FormatError, TedError};

use super::todo::file_name;
use super::{Properties, is_valid_shorthand, new_timestamp, slugify};

/// Metadata key holding the shorthand; `null` when the project has none.
const SHORTHAND_KEY: &str = "shorthand";

/// A project groups todos and may lend them a shorthand id prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectData {
    pub name: String,
    pub shorthand: Option<String>,
    pub description: String,
    pub properties: Properties,
    pub info: Vec<String>,
    pub filename: String,
    pub filepath: PathBuf,
}

impl ProjectData {
    /// # Errors
    ///
    /// Returns [`TedError::InvalidShorthand`] if `shorthand` is given but is
    /// not 3-8 uppercase letters.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        shorthand: Option<String>,
    ) -> Result<Self, TedError> {
        let shorthand = shorthand.filter(|s| !s.trim().is_empty());
        if let Some(sh) = &shorthand
            && !is_valid_shorthand(sh)
        {
            return Err(TedError::InvalidShorthand(sh.clone()));
        }

        let id = id.into();
        let name = name.into();
        Ok(Self {
            filename: Self::filename_for(&id, shorthand.as_deref(), &name),
            filepath: PathBuf::new(),
            description: description.into(),
            properties: Properties::new(id, new_timestamp()),
            info: Vec::new(),
            shorthand,
            name,
        })
    }

    /// `<ID>_<SHORTHAND>_<slug>.md`, or `<ID>_<slug>.md` without a shorthand.
    pub fn filename_for(id: &str, shorthand: Option<&str>, name: &str) -> String {
        shorthand.map_or_else(
            || format!("{id}_{}.md", slugify(name)),
            |sh| format!("{id}_{sh}_{}.md", slugify(name)),
        )
    }

    pub fn id(&self) -> &str {
        &self.properties.id
    }

    pub fn add_info(&mut self, line: impl Into<String>) {
        self.info.push(line.into());
    }

    /// Heading text: `SHORTHAND: name` or just `name`.
    pub fn heading(&self) -> String {
        self.shorthand
            .as_deref()
            .map_or_else(|| self.name.clone(), |sh| format!("{sh}: {}", self.name))
    }

    /// # Errors
    ///
    /// Fails only if the metadata cannot be serialized.
    pub fn encode(&self) -> Result<String, TedError> {
        let mut metadata = self.properties.to_metadata();
        metadata.insert(
            SHORTHAND_KEY.into(),
            self.shorthand.as_deref().map_or(Value::Null, Value::from),
        );
        Ok(DocumentWriter::new(&metadata)?
            .text(&self.heading(), &self.description)
            .list(&capitalize("info"), &self.info)
            .finish())
    }

    /// # Errors
    ///
    /// Returns a [`FormatError`] if the metadata block or the heading
    /// section is missing.
    ///
    /// The `shorthand` metadata key decides whether the heading carries a
    /// prefix. Documents without the key fall back to splitting the heading.
    pub fn decode(text: &str, filepath: &Path) -> Result<Self, FormatError> {
        let doc = codec::decode(text)?;
        let head = doc.head()?;
        let heading = head.heading.clone();
        let description = head.scalar();
        let info = doc
            .section(1)
            .map(codec::Section::list_items)
            .unwrap_or_default();

        let mut properties = Properties::from_metadata(doc.metadata)?;
        let (shorthand, name) = match properties.others.remove(SHORTHAND_KEY) {
            Some(value) => {
                let shorthand = scalar_to_string(&value).filter(|s| !s.is_empty());
                let name = strip_shorthand(&heading, shorthand.as_deref());
                (shorthand, name)
            }
            None => split_heading(&heading),
        };

        Ok(Self {
            properties,
            name,
            shorthand,
            description,
            info,
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

/// `name` from a `SHORTHAND: name` heading whose shorthand is already known.
fn strip_shorthand(heading: &str, shorthand: Option<&str>) -> String {
    shorthand
        .and_then(|sh| heading.strip_prefix(sh))
        .and_then(|rest| rest.strip_prefix(':'))
        .map_or_else(|| heading.to_string(), |rest| rest.trim().to_string())
}

/// Split `SHORTHAND: name`. Anything before the first `:` that is not a valid
/// shorthand stays part of the name.
fn split_heading(heading: &str) -> (Option<String>, String) {
    match heading.split_once(':') {
        Some((prefix, rest)) if is_valid_shorthand(prefix.trim()) => {
            (Some(prefix.trim().to_string()), rest.trim().to_string())
        }
        _ => (None, heading.to_string()),
    }
}
