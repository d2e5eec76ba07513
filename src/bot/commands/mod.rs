//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// General utility commands
pub mod general;

/// Maintenance management commands
pub mod maintenance;

// Export commands
pub use general::*;
pub use maintenance::*;
