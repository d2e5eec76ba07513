//! General Discord commands - ping, help and login.
//! These commands don't touch the document store; `login` stays reachable
//! while the site is in maintenance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::Context,
        core::gate::Role,
        errors::Result,
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let help_text = format!(
            "**{} Maintenance Help**\n\n\
            **Admin Commands**\n\
            • `/maintenance status` - Shows the local, global and site copies of the flag.\n\
            • `/maintenance on [message]` - Turns maintenance on (site copy).\n\
            • `/maintenance off` - Turns maintenance off (site copy).\n\
            • `/maintenance toggle` - Flips the current value.\n\
            • `/maintenance sync [source]` - Reconciles the global and site copies.\n\
            • `/maintenance force <active>` - Writes a value to both copies.\n\n\
            **Utility Commands**\n\
            • `/login` - Shows your role.\n\
            • `/ping` - Checks if the bot is responsive.\n\
            • `/help` - Shows this help message.",
            ctx.data().site_name
        );

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows the caller's role. Always available, even during maintenance.
    #[poise::command(slash_command, prefix_command)]
    pub async fn login(ctx: Context<'_>) -> Result<()> {
        let session = ctx.data().roles.session_for(&ctx.author().id.to_string());
        let role = match session.role {
            Role::Admin => "administrator",
            Role::Editor => "editor",
            Role::Reader => "reader",
        };
        ctx.say(format!("Signed in as {} ({role}).", ctx.author().name))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
