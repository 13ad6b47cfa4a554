//! Identifier normalisation and allocation.
//!
//! Ids are compared by their numeric part only: `T00012`, `T12` and `ENG012`
//! all normalise to 12. The next id for a kind is one past the largest
//! numeric part in use anywhere in the vault, including `done/`.

use tracing::warn;

use crate::model::EntityKind;

/// Strip every non-digit and parse what remains.
///
/// Returns `None` when the id has no digits (or the digits overflow).
pub fn id_to_int(id: &str) -> Option<u64> {
    let digits: String = id.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// One past the largest numeric id in `ids`; 1 for an empty population.
///
/// Ids without digits count as 0 and are logged.
pub fn next_id<'a>(ids: impl IntoIterator<Item = &'a str>) -> u64 {
    ids.into_iter()
        .map(|id| {
            id_to_int(id).unwrap_or_else(|| {
                warn!(id, "id has no numeric part; treating as 0");
                0
            })
        })
        .max()
        .unwrap_or(0)
        .saturating_add(1)
}

/// `T00001`, `P00001`, `R00001`, `I00001`.
pub fn format_id(kind: EntityKind, n: u64) -> String {
    format!("{}{n:05}", kind.id_prefix())
}

/// Todo id, prefixed by the project shorthand when there is one (`ENG003`).
pub fn format_todo_id(shorthand: Option<&str>, n: u64) -> String {
    match shorthand {
        Some(sh) => format!("{sh}{n:03}"),
        None => format_id(EntityKind::Todo, n),
    }
}
