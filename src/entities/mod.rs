//! Entity module - SeaORM entity definitions for the database.
//! The maintenance subsystem only needs one physical table: every logical
//! document (the global maintenance flag, the site settings aggregate) is a
//! row in `documents`.

pub mod document;

pub use document::{Column as DocumentColumn, Entity as Document, Model as DocumentModel};
