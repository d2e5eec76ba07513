//! Bot layer - Discord admin interface for the maintenance subsystem
//!
//! Commands are the bot's "routes": every invocation passes through the
//! maintenance gate before it runs, and admins manage the flag through the
//! `/maintenance` command group.

/// Discord command implementations (maintenance, general)
pub mod commands;
/// Discord interaction handlers (maintenance gate checks)
pub mod handlers;

use crate::{
    config::users::RoleDirectory,
    core::{context::MaintenanceContext, gate::MaintenanceGate, service::MaintenanceService},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
pub struct BotData {
    /// Process-wide maintenance state
    pub context: MaintenanceContext,
    /// Global maintenance status API
    pub service: MaintenanceService,
    /// Navigation gate evaluated before every command
    pub gate: MaintenanceGate,
    /// Auth provider stand-in for role lookups
    pub roles: RoleDirectory,
    /// Name used in replies
    pub site_name: String,
}

impl BotData {
    /// Bundles the shared state handed to every command.
    #[must_use]
    pub const fn new(
        context: MaintenanceContext,
        service: MaintenanceService,
        gate: MaintenanceGate,
        roles: RoleDirectory,
        site_name: String,
    ) -> Self {
        Self {
            context,
            service,
            gate,
            roles,
            site_name,
        }
    }
}

/// Poise context used by all commands.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("⚠️ {error}")).await {
                error!("Failed to send error message: {}", e);
            }
        }
        poise::FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            // The check itself already replied with the reason
            if let Some(error) = error {
                warn!("Check for `{}` failed: {}", ctx.command().name, error);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Runs the bot until the gateway connection ends.
#[instrument(skip(token, data))]
pub async fn run_bot(token: String, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::login(),
                commands::maintenance(),
            ],
            command_check: Some(|ctx| Box::pin(handlers::gate::maintenance_gate(ctx))),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Starting bot client...");
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;
    client.start().await?;
    Ok(())
}
