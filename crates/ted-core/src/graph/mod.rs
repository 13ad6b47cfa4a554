//! Relationships between todos.

pub mod status;

pub use status::StatusResolver;
