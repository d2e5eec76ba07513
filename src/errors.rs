//! Unified error type for `MaintenanceBuddy`.
//!
//! Every fallible operation in the crate returns [`Result`]. Store failures are
//! never swallowed below the caller that started the action; the bot layer is
//! the single place where errors are turned into user-facing messages.

use crate::core::flag::SyncSource;
use thiserror::Error;

/// All errors produced by the maintenance subsystem.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// The backing database rejected or could not execute an operation
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The document store could not be reached
    #[error("Document store unavailable: {message}")]
    StoreUnavailable {
        /// Reason reported by the store
        message: String,
    },

    /// A targeted update was issued against a document that does not exist
    #[error("Document not found: {collection}/{id}")]
    DocumentNotFound {
        /// Collection name
        collection: String,
        /// Document id
        id: String,
    },

    /// A stored document could not be decoded into the expected shape
    #[error("Malformed document {collection}/{id}: {message}")]
    MalformedDocument {
        /// Collection name
        collection: String,
        /// Document id
        id: String,
        /// Decoder message
        message: String,
    },

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A synchronize or force-set wrote one copy of the flag but not the other
    #[error("Maintenance sync partially applied: {succeeded} written, {failed} failed: {message}")]
    PartialSync {
        /// Copy that was written successfully
        succeeded: SyncSource,
        /// Copy whose write failed
        failed: SyncSource,
        /// Underlying failure
        message: String,
    },

    /// The maintenance state has not been loaded from the store yet
    #[error("Maintenance state is not known yet")]
    StateUnknown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required environment variable is missing
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Message formatting failed
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Serenity/Poise framework error
    #[error("Discord framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
