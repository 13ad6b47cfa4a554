use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::codec::{DocumentWriter, parse_metadata, scalar_to_string, split_metadata, unwrap_link, wrap_link};
use crate::error::{FormatError, TedError};

/// A note captured by the intake server, possibly with attachments.
///
/// The JSON shape matches what the intake server returns in its item list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxItem {
    pub content: String,
    pub timestamp: String,
    pub id: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
}

impl InboxItem {
    pub fn new(id: impl Into<String>, timestamp: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            timestamp: timestamp.into(),
            id: id.into(),
            photo: None,
            file: None,
        }
    }

    /// Attachment filenames carried by this item.
    pub fn attachments(&self) -> impl Iterator<Item = &str> {
        self.photo.iter().chain(self.file.iter()).map(String::as_str)
    }

    /// `<ID>_<timestamp without separators>.md`
    pub fn filename(&self) -> String {
        let compact: String = self
            .timestamp
            .chars()
            .filter(|c| !matches!(c, ':' | '-'))
            .map(|c| if c == ' ' { '_' } else { c })
            .collect();
        format!("{}_{compact}.md", self.id)
    }

    /// # Errors
    ///
    /// Fails only if the metadata cannot be serialized.
    pub fn encode(&self) -> Result<String, TedError> {
        let mut meta = Mapping::new();
        meta.insert("timestamp".into(), self.timestamp.as_str().into());
        meta.insert("id".into(), self.id.as_str().into());
        if let Some(photo) = &self.photo {
            meta.insert("photo".into(), Value::String(wrap_link(photo)));
        }
        if let Some(file) = &self.file {
            meta.insert("file".into(), Value::String(wrap_link(file)));
        }
        Ok(DocumentWriter::new(&meta)?.body(&self.content).finish())
    }

    /// Parse an inbox document. Missing `timestamp`/`id` decode as empty.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::MissingMetadata`] or
    /// [`FormatError::InvalidMetadata`] if the metadata block is absent or
    /// malformed.
    pub fn decode(text: &str) -> Result<Self, FormatError> {
        let (yaml, body) = split_metadata(text).ok_or(FormatError::MissingMetadata)?;
        let meta = parse_metadata(yaml)?;
        let field = |key: &str| meta.get(key).and_then(scalar_to_string);
        let link = |key: &str| {
            field(key)
                .map(|v| unwrap_link(&v))
                .filter(|v| !v.is_empty())
        };

        Ok(Self {
            content: body.trim().to_string(),
            timestamp: field("timestamp").unwrap_or_default(),
            id: field("id").unwrap_or_default(),
            photo: link("photo"),
            file: link("file"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_compacts_timestamp() {
        let item = InboxItem::new("I00007", "10-19-2026_09:12:44", "buy milk");
        assert_eq!(item.filename(), "I00007_10192026_091244.md");
    }

    #[test]
    fn encode_writes_attachments_as_links() {
        let mut item = InboxItem::new("I00001", "10-19-2026_09:12:44", "whiteboard");
        item.photo = Some("board.jpg".into());
        let text = item.encode().expect("encode");
        assert!(text.contains("[[board.jpg]]"));
        assert!(!text.contains("file:"));
        assert!(text.ends_with("---\nwhiteboard\n\n"));
    }

    #[test]
    fn decode_restores_item() {
        let mut item = InboxItem::new("I00001", "10-19-2026_09:12:44", "line one\nline two");
        item.file = Some("notes.pdf".into());
        let back = InboxItem::decode(&item.encode().expect("encode")).expect("decode");
        assert_eq!(back, item);
    }

    #[test]
    fn decode_handles_hand_written_quotes() {
        let text = "---\ntimestamp: t\nid: I2\nphoto: \"[[a.png]]\"\n---\nhello\n";
        let item = InboxItem::decode(text).expect("decode");
        assert_eq!(item.photo.as_deref(), Some("a.png"));
        assert_eq!(item.content, "hello");
    }

    #[test]
    fn json_from_intake_server() {
        let json = r#"{"content":"call bob","timestamp":"t","id":"I00003","photo":null}"#;
        let item: InboxItem = serde_json::from_str(json).expect("json");
        assert_eq!(item.id, "I00003");
        assert!(item.photo.is_none());
        assert!(item.file.is_none());
        assert_eq!(item.attachments().count(), 0);
    }
}
