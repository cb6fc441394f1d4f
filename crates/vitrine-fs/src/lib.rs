//! Filesystem primitives for atomic theme installs.
//!
//! - `primitives/` - atomic file writes and directory renames
//! - `workflow/` - staging workspaces and lock-file transactions

pub use error::{Error, Result};
pub use workflow::{Transaction, Workspace};

mod error;
pub mod primitives;
pub mod workflow;
