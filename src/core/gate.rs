//! Maintenance gate - decides whether a route is served or replaced by the
//! maintenance screen.
//!
//! The decision is re-evaluated on every navigation. While maintenance is
//! active only exempt routes (the login page) and admin sessions get through.

use crate::core::context::MaintenanceState;

/// Banner shown when the flag carries no message and none is configured.
pub const DEFAULT_MAINTENANCE_MESSAGE: &str =
    "The site is undergoing scheduled maintenance. Please check back soon.";

/// Role of an authenticated user, as reported by the auth provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Site administrator
    Admin,
    /// Fact-check editor
    Editor,
    /// Signed-in reader
    Reader,
}

/// The current user's session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Auth provider user id
    pub user_id: String,
    /// Role looked up for the user
    pub role: Role,
}

impl Session {
    /// Whether the session bypasses the maintenance screen.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Outcome of evaluating the gate for one navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Serve the requested route
    Allow,
    /// Replace the route with the maintenance screen
    MaintenanceScreen {
        /// Banner text to show
        message: String,
    },
}

/// Navigation gate configuration.
#[derive(Clone, Debug)]
pub struct MaintenanceGate {
    exempt_routes: Vec<String>,
    message: String,
}

impl Default for MaintenanceGate {
    fn default() -> Self {
        Self::new(vec!["login".to_string()], DEFAULT_MAINTENANCE_MESSAGE.to_string())
    }
}

impl MaintenanceGate {
    /// Creates a gate that always lets `exempt_routes` through.
    #[must_use]
    pub const fn new(exempt_routes: Vec<String>, message: String) -> Self {
        Self {
            exempt_routes,
            message,
        }
    }

    /// Decides what to show for `route`.
    ///
    /// Before the flag is loaded everything is allowed. The maintenance screen
    /// shows `stored_message` when the flag carries one, otherwise the
    /// configured banner.
    #[must_use]
    pub fn evaluate(
        &self,
        state: MaintenanceState,
        route: &str,
        session: Option<&Session>,
        stored_message: Option<&str>,
    ) -> GateDecision {
        if state != MaintenanceState::Known(true) {
            return GateDecision::Allow;
        }
        if self.exempt_routes.iter().any(|exempt| exempt == route) {
            return GateDecision::Allow;
        }
        if session.is_some_and(Session::is_admin) {
            return GateDecision::Allow;
        }
        let message = stored_message
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(&self.message);
        GateDecision::MaintenanceScreen {
            message: message.to_string(),
        }
    }
}
