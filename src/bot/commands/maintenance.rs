//! Maintenance management commands.
//!
//! `on`, `off` and `toggle` go through the maintenance context (optimistic,
//! site copy only). `sync` and `force` are the only commands that touch both
//! copies of the flag.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, handlers::gate::require_admin},
        core::flag::SyncSource,
        errors::Result,
    };
    use std::fmt::Write;
    use tracing::info;

    /// Copy of the flag to treat as authoritative when synchronizing.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum SourceChoice {
        #[name = "global"]
        Global,
        #[name = "site"]
        Site,
    }

    impl From<SourceChoice> for SyncSource {
        fn from(choice: SourceChoice) -> Self {
            match choice {
                SourceChoice::Global => Self::Global,
                SourceChoice::Site => Self::Site,
            }
        }
    }

    fn describe(value: bool) -> &'static str {
        if value { "🚧 ON" } else { "✅ OFF" }
    }

    /// Manage site-wide maintenance mode.
    #[poise::command(
        slash_command,
        prefix_command,
        subcommands("status", "on", "off", "toggle", "sync", "force"),
        subcommand_required,
        check = "require_admin"
    )]
    pub async fn maintenance(_ctx: Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Shows every copy of the maintenance flag.
    #[poise::command(slash_command, prefix_command)]
    pub async fn status(ctx: Context<'_>) -> Result<()> {
        let data = ctx.data();
        let local = data.context.is_maintenance_mode().await;
        let global = data.service.refresh().await?;

        let mut reply = String::from("**Maintenance status**\n");
        match local {
            Some(value) => writeln!(reply, "Local: {}", describe(value))?,
            None => writeln!(reply, "Local: not loaded")?,
        }
        writeln!(
            reply,
            "Global: {} (by {}, {})",
            describe(global.is_active),
            global.updated_by.as_deref().unwrap_or("unknown"),
            global.updated_at.format("%Y-%m-%d %H:%M UTC")
        )?;
        if let Some(message) = data.context.message().await {
            writeln!(reply, "Banner: {message}")?;
        }
        if data.context.is_pending().await {
            writeln!(reply, "A toggle is still being saved...")?;
        }

        ctx.say(reply).await?;
        Ok(())
    }

    /// Turns maintenance on, optionally with a banner for blocked users.
    #[poise::command(slash_command, prefix_command)]
    pub async fn on(
        ctx: Context<'_>,
        #[description = "Banner text for the maintenance screen"] message: Option<String>,
    ) -> Result<()> {
        ctx.defer().await?;
        ctx.data()
            .context
            .set_maintenance_mode(true, message.as_deref())
            .await?;
        info!(user = %ctx.author().id, "Maintenance turned on");
        ctx.say(format!("Maintenance is now {}.", describe(true))).await?;
        Ok(())
    }

    /// Turns maintenance off.
    #[poise::command(slash_command, prefix_command)]
    pub async fn off(ctx: Context<'_>) -> Result<()> {
        ctx.defer().await?;
        ctx.data().context.set_maintenance_mode(false, None).await?;
        info!(user = %ctx.author().id, "Maintenance turned off");
        ctx.say(format!("Maintenance is now {}.", describe(false))).await?;
        Ok(())
    }

    /// Flips maintenance mode.
    #[poise::command(slash_command, prefix_command)]
    pub async fn toggle(ctx: Context<'_>) -> Result<()> {
        ctx.defer().await?;
        let value = ctx.data().context.toggle().await?;
        ctx.say(format!("Maintenance is now {}.", describe(value))).await?;
        Ok(())
    }

    /// Reconciles the global and site copies of the flag.
    #[poise::command(slash_command, prefix_command)]
    pub async fn sync(
        ctx: Context<'_>,
        #[description = "Copy to treat as authoritative (default: most recent)"]
        source: Option<SourceChoice>,
    ) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let forced = source.map(SyncSource::from);
        let value = data.context.synchronize(forced).await?;
        data.service.refresh().await?;
        let how = forced.map_or_else(|| "most recent copy".to_string(), |s| format!("{s} copy"));
        ctx.say(format!(
            "Synchronized from the {how}: maintenance is {}.",
            describe(value)
        ))
        .await?;
        Ok(())
    }

    /// Writes a value to both copies of the flag.
    #[poise::command(slash_command, prefix_command)]
    pub async fn force(
        ctx: Context<'_>,
        #[description = "Whether maintenance should be active"] active: bool,
    ) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let actor = ctx.author().id.to_string();
        data.context.force_set(active, Some(&actor)).await?;
        data.service.refresh().await?;
        ctx.say(format!("Forced maintenance {} on both copies.", describe(active)))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
