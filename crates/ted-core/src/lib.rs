//! ted-core library: the plain-text todo vault.
//!
//! Todos, projects, references and inbox items are stored as text documents
//! (a `---` YAML metadata block followed by `# Heading` sections) under a
//! vault directory. This crate reads and writes those documents, indexes a
//! vault in memory and resolves blocked-by status.
//!
//! # Conventions
//!
//! - **Errors**: [`error::TedError`] for library operations; config loading
//!   returns `anyhow::Result` with file context.
//! - **Logging**: `tracing` macros (`debug!` for walk and parse progress,
//!   `warn!` for skipped documents, `info!` for writes).

pub mod codec;
pub mod config;
pub mod error;
pub mod graph;
pub mod id;
pub mod model;
pub mod vault;

pub use config::Config;
pub use error::{ErrorCode, FormatError, TedError};
pub use graph::StatusResolver;
pub use model::{EntityKind, InboxItem, ProjectData, Reference, ReferenceData, Status, Task, TodoData};
pub use vault::{LoadReport, Vault, VaultData};
