//! Setup for [poise::Framework]

use std::time::Duration;

use crate::commands;
use crate::lib::temp_voice;
use crate::serenity;
use crate::BotError;
use crate::Config;
use crate::Data;

/// Convenient type alias, only this [poise::Framework] type is used.
type Framework = poise::Framework<Data, BotError>;

/// Construct a [poise::Framework]
pub(super) fn framework(config: Config) -> Framework {
    poise::Framework::builder()
        .options(framework_options())
        .setup(|ctx, rdy, fw| framework_setup(ctx, rdy, fw, config))
        .build()
}

/// Configure options for the [Framework]
fn framework_options() -> poise::FrameworkOptions<Data, BotError> {
    poise::FrameworkOptions {
        // Add commands to the framework
        commands: crate::commands::list(),
        // Handle framework errors
        on_error: |e| crate::log::handle_framework_error(e),
        // Keep track of temporary voice channels
        event_handler: |ctx, event, _fw, data| event_handler(ctx, event, data),
        // Log when commands start
        pre_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().qualified_name;
                let user = &ctx.author();
                tracing::info!("Started '{cmd_name}' command from {user}.")
            })
        },
        // Log when finishing commands
        post_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().qualified_name;
                let user = &ctx.author();
                tracing::info!("Finished '{cmd_name}' command from {user}.")
            })
        },
        ..Default::default()
    }
}

/// Construct future that runs on startup
fn framework_setup<'a>(
    ctx: &'a serenity::Context,
    rdy: &'a serenity::Ready,
    fw: &'a Framework,
    config: Config,
) -> poise::BoxFuture<'a, Result<Data, BotError>> {
    Box::pin(async move {
        // Register the commands
        let commands = &commands::list();
        let app_commands = poise::builtins::create_application_commands(commands);

        serenity::Command::set_global_commands(&ctx, app_commands.clone()).await?;
        if let Some(dev_guild) = config.dev_guild() {
            // This is faster than global registers, useful for development.
            tracing::info!("Registering commands on dev guild.");
            dev_guild.set_commands(ctx, app_commands).await?;
        }

        // Simple message that logs when the bot has initialized
        let bot_name = &rdy.user.name;
        tracing::info!("{bot_name} is ready!");

        let data = Data {
            notify_list: config.notify_list(fw),
            settings: config.settings(),
            ..Default::default()
        };

        // Delete temporary voice channels once they have been empty for long enough.
        let settings = &data.settings;
        temp_voice::spawn_sweeper(
            ctx.http.clone(),
            data.temp_voice.clone(),
            Duration::from_secs(settings.sweep_interval_secs),
            settings.idle_timeout(),
        );

        Ok(data)
    })
}

/// Handles gateway events that aren't commands.
fn event_handler<'a>(
    ctx: &'a serenity::Context,
    event: &'a serenity::FullEvent,
    data: &'a Data,
) -> poise::BoxFuture<'a, Result<(), BotError>> {
    Box::pin(async move {
        if let serenity::FullEvent::VoiceStateUpdate { old, new } = event {
            temp_voice::on_voice_state_update(ctx, data, old.as_ref(), new).await;
        }
        Ok(())
    })
}
