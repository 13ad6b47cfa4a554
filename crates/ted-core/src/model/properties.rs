use serde_yaml::{Mapping, Value};

use crate::codec::{scalar_to_string, string_list, unwrap_link, wrap_link};
use crate::error::FormatError;

/// Metadata-block fields shared by todos, projects and references.
///
/// Keys the typed fields do not claim are kept in [`Properties::others`]
/// in their original order and written back after the typed keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Properties {
    pub created: String,
    pub id: String,
    pub completed: Option<String>,
    pub project_id: Option<String>,
    pub tags: Vec<String>,
    pub blocked_by: Vec<String>,
    pub others: Mapping,
}

impl Properties {
    pub fn new(id: impl Into<String>, created: impl Into<String>) -> Self {
        Self {
            created: created.into(),
            id: id.into(),
            ..Self::default()
        }
    }

    /// Add a tag unless it is already present. Returns `true` if added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Record a blocking todo by filename. Returns `true` if added.
    pub fn add_blocker(&mut self, filename: &str) -> bool {
        if self.blocked_by.iter().any(|f| f == filename) {
            return false;
        }
        self.blocked_by.push(filename.to_string());
        true
    }

    /// Build the metadata mapping in document order: typed keys, then
    /// `others`, then `blocked_by` when non-empty.
    pub fn to_metadata(&self) -> Mapping {
        let mut map = Mapping::new();
        map.insert("created".into(), self.created.as_str().into());
        map.insert("id".into(), self.id.as_str().into());
        map.insert(
            "completed".into(),
            self.completed
                .as_deref()
                .map_or(Value::Null, Value::from),
        );
        map.insert(
            "project_id".into(),
            self.project_id
                .as_deref()
                .map_or(Value::Null, |p| Value::String(wrap_link(p))),
        );
        map.insert(
            "tags".into(),
            Value::Sequence(self.tags.iter().map(|t| t.as_str().into()).collect()),
        );
        for (key, value) in &self.others {
            map.insert(key.clone(), value.clone());
        }
        if !self.blocked_by.is_empty() {
            map.insert(
                "blocked_by".into(),
                Value::Sequence(
                    self.blocked_by
                        .iter()
                        .map(|f| Value::String(wrap_link(f)))
                        .collect(),
                ),
            );
        }
        map
    }

    /// Read typed fields out of a decoded metadata mapping.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::MissingField`] when `created` or `id` is
    /// absent or null.
    pub fn from_metadata(metadata: Mapping) -> Result<Self, FormatError> {
        let mut created = None;
        let mut id = None;
        let mut props = Self::default();

        for (key, value) in metadata {
            match key.as_str() {
                Some("created") => created = scalar_to_string(&value),
                Some("id") => id = scalar_to_string(&value),
                Some("completed") => props.completed = scalar_to_string(&value),
                Some("project_id") => {
                    props.project_id = scalar_to_string(&value)
                        .map(|p| unwrap_link(&p))
                        .filter(|p| !p.is_empty());
                }
                Some("tags") => props.tags = string_list(&value),
                Some("blocked_by") => {
                    props.blocked_by = string_list(&value)
                        .iter()
                        .map(|f| unwrap_link(f))
                        .filter(|f| !f.is_empty())
                        .collect();
                }
                _ => {
                    props.others.insert(key, value);
                }
            }
        }

        props.created = created.ok_or(FormatError::MissingField("created"))?;
        props.id = id.ok_or(FormatError::MissingField("id"))?;
        Ok(props)
    }
}
