use serde::{Deserialize, Serialize};

use super::Status;

/// One checklist entry owned by a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub done: bool,
    pub description: String,
}

impl Task {
    pub fn new(description: impl Into<String>, done: bool) -> Self {
        Self {
            done,
            description: description.into(),
        }
    }

    pub fn pending(description: impl Into<String>) -> Self {
        Self::new(description, false)
    }

    pub fn mark_done(&mut self) {
        self.done = true;
    }

    /// `✅ description` / `❌ description`.
    pub fn status(&self) -> String {
        let status = if self.done { Status::Done } else { Status::NotDone };
        format!("{} {}", status.symbol(), self.description)
    }
}
