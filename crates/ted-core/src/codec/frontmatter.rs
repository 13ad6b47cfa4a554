use serde_yaml::{Mapping, Value};

use crate::error::FormatError;

const DELIMITER: &str = "---";

/// Split text into (raw YAML, body after the closing delimiter).
///
/// The first line must be `---` (a leading BOM is tolerated) and the block
/// must be closed by another `---` line. Returns `None` otherwise.
pub fn split_metadata(text: &str) -> Option<(&str, &str)> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');

    let first = lines.next()?;
    if first.trim_end() != DELIMITER {
        return None;
    }

    let start = first.len();
    let mut offset = start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Some((&text[start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

/// Parse the raw YAML of a metadata block into a mapping.
///
/// An empty block yields an empty mapping; required-field checks are the
/// caller's business.
///
/// # Errors
///
/// Returns [`FormatError::InvalidMetadata`] on YAML syntax errors or when
/// the block is a scalar or sequence rather than a mapping.
pub fn parse_metadata(yaml: &str) -> Result<Mapping, FormatError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| FormatError::InvalidMetadata(e.to_string()))?;
    match value {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => Err(FormatError::InvalidMetadata(
            "expected `key: value` pairs".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_block() {
        let (yaml, body) = split_metadata("---\nid: T00001\n---\n# Title\nBody").expect("split");
        assert_eq!(yaml, "id: T00001\n");
        assert_eq!(body, "# Title\nBody");
    }

    #[test]
    fn block_with_bom_and_crlf() {
        let (yaml, body) = split_metadata("\u{feff}---\r\nid: T1\r\n---\r\nrest").expect("split");
        assert_eq!(yaml, "id: T1\r\n");
        assert_eq!(body, "rest");
    }

    #[test]
    fn closing_delimiter_at_end_of_text() {
        let (yaml, body) = split_metadata("---\nid: T1\n---").expect("split");
        assert_eq!(yaml, "id: T1\n");
        assert_eq!(body, "");
    }

    #[test]
    fn no_block() {
        assert!(split_metadata("# Title\nBody").is_none());
        assert!(split_metadata("").is_none());
        assert!(split_metadata("---\nid: T1\n").is_none());
    }

    #[test]
    fn empty_block_parses_to_empty_mapping() {
        let (yaml, _) = split_metadata("---\n---\n").expect("split");
        assert!(parse_metadata(yaml).expect("parse").is_empty());
    }

    #[test]
    fn sequence_block_is_rejected() {
        let err = parse_metadata("- a\n- b\n").unwrap_err();
        assert!(matches!(err, FormatError::InvalidMetadata(_)));
    }

    #[test]
    fn wikilinks_survive_yaml_quoting() {
        let map = parse_metadata("blocked_by:\n- '[[T00002_a.md]]'\n").expect("parse");
        let deps = map
            .get("blocked_by")
            .and_then(Value::as_sequence)
            .expect("sequence");
        assert_eq!(deps[0], Value::String("[[T00002_a.md]]".into()));
    }
}
