//! Document entity - Backing table for the generic document store.
//! Each row is one JSON document addressed by `(collection, doc_id)`, the
//! same addressing scheme the hosted document database uses.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stored document model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    /// Surrogate row id
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Collection the document belongs to (e.g., `"settings"`)
    pub collection: String,
    /// Document id, unique within its collection (e.g., `"maintenance"`)
    pub doc_id: String,
    /// Document body
    pub data: Json,
    /// Last time any part of the document was written
    pub updated_at: DateTimeUtc,
}

/// Documents have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
