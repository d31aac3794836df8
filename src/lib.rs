//! notescore - client core for the notes manager.
//!
//! This library talks to the notes REST API and keeps a consistent local view:
//! - Data models (Note, Tag, Category)
//! - HTTP transport with failure classification and reachability checks
//! - Payload normalization for inconsistent server encodings
//! - Resource services for notes, tags and categories
//! - Local state synchronization after mutations
//! - Search with server endpoints and client-side fallback
//!
//! # Feature Flags
//!
//! - `desktop`: Locate the config directory from the platform (on by default).

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod search;
pub mod services;
pub mod sync;
pub mod transport;
pub mod validation;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::Config;
pub use error::{NotesError, NotesResult, TransportError, TransportErrorKind};
pub use models::{Category, NewCategory, Note, Tag};
pub use search::{execute_search, SearchCriteria, SearchPlan};
pub use services::{CategoryService, NoteService, NotesClient, TagService};
pub use sync::{HeldCollection, NoteStats};
pub use transport::{BackendStatus, HealthMonitor, HttpTransport};
