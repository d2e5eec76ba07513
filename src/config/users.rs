//! User role configuration loaded from environment variables.
//!
//! Stands in for the auth provider's role lookup. `ADMIN_USER_IDS` and
//! `EDITOR_USER_IDS` hold comma-separated user ids; everyone else is a reader.

use crate::core::gate::{Role, Session};
use std::collections::HashSet;

/// Maps user ids to roles.
#[derive(Clone, Debug, Default)]
pub struct RoleDirectory {
    admins: HashSet<String>,
    editors: HashSet<String>,
}

impl RoleDirectory {
    /// Builds a directory from explicit id lists.
    pub fn new<I, J>(admins: I, editors: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        Self {
            admins: admins.into_iter().collect(),
            editors: editors.into_iter().collect(),
        }
    }

    /// Reads `ADMIN_USER_IDS` and `EDITOR_USER_IDS` from the environment.
    ///
    /// Missing variables yield empty lists.
    #[must_use]
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .map(|raw| parse_id_list(&raw))
                .unwrap_or_default()
        };
        Self::new(read("ADMIN_USER_IDS"), read("EDITOR_USER_IDS"))
    }

    /// Looks up the role for `user_id`. Admin wins if an id is listed twice.
    #[must_use]
    pub fn role_for(&self, user_id: &str) -> Role {
        if self.admins.contains(user_id) {
            Role::Admin
        } else if self.editors.contains(user_id) {
            Role::Editor
        } else {
            Role::Reader
        }
    }

    /// Builds the session for `user_id`.
    #[must_use]
    pub fn session_for(&self, user_id: &str) -> Session {
        Session {
            user_id: user_id.to_string(),
            role: self.role_for(user_id),
        }
    }
}

fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
