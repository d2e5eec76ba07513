//! Core maintenance logic - framework-agnostic store, reconciliation and state.

/// Maintenance context - optimistic process-wide state
pub mod context;
/// Document store client trait and its SeaORM implementation
pub mod document_store;
/// Maintenance flag data model
pub mod flag;
/// Navigation gate
pub mod gate;
/// Raw reads and writes of both copies of the flag
pub mod maintenance_store;
/// Reconciliation between the two copies
pub mod reconciler;
/// Application-facing maintenance API
pub mod service;
/// Site settings aggregate document
pub mod site_settings;
