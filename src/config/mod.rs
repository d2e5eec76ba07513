/// Database configuration and connection management
pub mod database;

/// Application settings loading from config.toml
pub mod settings;

/// User role lookup from environment variables
pub mod users;
