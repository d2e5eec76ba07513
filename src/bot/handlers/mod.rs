//! Discord interaction handlers
//!
//! Checks that run before commands: the site-wide maintenance gate and the
//! admin-only guard for maintenance management.

/// Maintenance gate and admin checks
pub mod gate;
