//! Blocked-by status resolution over a vault snapshot.
//!
//! # Overview
//!
//! A todo's `blocked_by` list names other todos by filename. A todo is
//! **Blocked** while any blocker that exists in the vault resolves to
//! something other than Done. Otherwise it is **Done** when every task is
//! checked and **NotDone** when not.
//!
//! # Resolution
//!
//! Blockers are looked up among active and done todos. A filename that
//! matches nothing is skipped, so dangling links never block.
//!
//! Resolution recurses through blockers with memoisation and an explicit
//! in-progress set. Reaching a todo that is still being resolved means the
//! dependency chain loops back on itself; that todo counts as Blocked at the
//! point of re-entry, so every member of a cycle resolves to Blocked.
//!
//! # Usage
//!
//! ```rust,ignore
//! let resolver = StatusResolver::new(&data);
//! for todo in &data.todos {
//!     println!("{}", todo.status_line(resolver.status(todo), false));
//! }
//! ```

#![allow(clippy::must_use_candidate)]

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use crate::model::{Status, TodoData};
use crate::vault::VaultData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Resolved(Status),
}

// ---------------------------------------------------------------------------
// StatusResolver
// ---------------------------------------------------------------------------

/// Resolves [`Status`] for todos in one [`VaultData`] snapshot.
///
/// Results are cached for the resolver's lifetime; build a new resolver
/// after reloading the vault.
#[derive(Debug)]
pub struct StatusResolver<'a> {
    by_filename: HashMap<&'a str, &'a TodoData>,
    marks: RefCell<HashMap<&'a str, Mark>>,
}

impl<'a> StatusResolver<'a> {
    pub fn new(data: &'a VaultData) -> Self {
        let mut by_filename = HashMap::new();
        // Active todos win over a stale done copy with the same filename.
        for todo in data.dones.iter().chain(&data.todos) {
            by_filename.insert(todo.filename.as_str(), todo);
        }
        Self {
            by_filename,
            marks: RefCell::new(HashMap::new()),
        }
    }

    /// Status of `todo`. A todo that is not the snapshot's own copy (an
    /// edited clone, say) is evaluated fresh against the snapshot.
    pub fn status(&self, todo: &TodoData) -> Status {
        let mut marks = self.marks.borrow_mut();
        match self.by_filename.get(todo.filename.as_str()).copied() {
            Some(known) if std::ptr::eq(known, todo) => self.resolve(known, &mut marks),
            _ => self.evaluate(todo, &mut marks),
        }
    }

    /// Blockers currently holding `todo` back, by filename.
    pub fn blocked_on(&self, todo: &TodoData) -> Vec<&'a str> {
        todo.properties
            .blocked_by
            .iter()
            .filter_map(|name| self.by_filename.get(name.as_str()).copied())
            .filter(|blocker| self.status(blocker) != Status::Done)
            .map(|blocker| blocker.filename.as_str())
            .collect()
    }

    /// `id: name <symbol>` with the resolved status.
    pub fn status_line(&self, todo: &TodoData, verbose: bool) -> String {
        todo.status_line(self.status(todo), verbose)
    }

    fn resolve(&self, todo: &'a TodoData, marks: &mut HashMap<&'a str, Mark>) -> Status {
        match marks.get(todo.filename.as_str()) {
            Some(Mark::Resolved(status)) => return *status,
            Some(Mark::InProgress) => {
                debug!(todo = %todo.filename, "blocked_by cycle");
                return Status::Blocked;
            }
            None => {}
        }

        marks.insert(todo.filename.as_str(), Mark::InProgress);
        let status = self.evaluate(todo, marks);
        marks.insert(todo.filename.as_str(), Mark::Resolved(status));
        status
    }

    fn evaluate(&self, todo: &TodoData, marks: &mut HashMap<&'a str, Mark>) -> Status {
        for name in &todo.properties.blocked_by {
            let Some(blocker) = self.by_filename.get(name.as_str()).copied() else {
                debug!(todo = %todo.filename, blocker = %name, "blocker not in vault; ignoring");
                continue;
            };
            if self.resolve(blocker, marks) != Status::Done {
                return Status::Blocked;
            }
        }

        if todo.is_completed() {
            Status::Done
        } else {
            Status::NotDone
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
