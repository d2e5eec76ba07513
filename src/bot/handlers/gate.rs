//! Command checks backed by the maintenance gate.

use crate::{
    bot::Context,
    core::gate::GateDecision,
    errors::Result,
};
use tracing::debug;

/// Global check run before every command.
///
/// While maintenance is active, non-admins get the maintenance screen instead
/// of the command they asked for.
pub async fn maintenance_gate(ctx: Context<'_>) -> Result<bool> {
    let data = ctx.data();
    let state = data.context.state().await;
    let stored_message = data.context.message().await;
    let session = data.roles.session_for(&ctx.author().id.to_string());
    let route = ctx.command().name.as_str();

    let decision = data
        .gate
        .evaluate(state, route, Some(&session), stored_message.as_deref());
    match decision {
        GateDecision::Allow => Ok(true),
        GateDecision::MaintenanceScreen { message } => {
            debug!(route, user = %session.user_id, "Command blocked by maintenance gate");
            ctx.say(format!("🚧 **{}** is in maintenance.\n{message}", data.site_name))
                .await?;
            Ok(false)
        }
    }
}

/// Per-command check restricting maintenance management to admins.
pub async fn require_admin(ctx: Context<'_>) -> Result<bool> {
    let session = ctx.data().roles.session_for(&ctx.author().id.to_string());
    if session.is_admin() {
        return Ok(true);
    }
    ctx.say("🔒 Only administrators can manage maintenance mode.")
        .await?;
    Ok(false)
}
