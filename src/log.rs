//! Logging functionality and error reporting.
//! The logging library of choice is [tracing].

use itertools::Itertools;
use poise::BoxFuture;
use poise::CreateReply;
use poise::FrameworkError;
use serenity::CreateEmbed;
use serenity::CreateMessage;
use tracing::debug;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::error::UserError;
use crate::lib::embeds;
use crate::serenity;
use crate::BotError;
use crate::Config;
use crate::Context;
use crate::Data;

/// The name of this crate, used to set filter target.
const THIS_CRATE: &str = env!("CARGO_CRATE_NAME");

/// Setup format layers, tracing subscribers, and installs tracing.
///
/// The returned guard flushes the log file when dropped, keep it alive until shutdown.
pub(super) fn install_tracing(config: &Config) -> Option<WorkerGuard> {
    // Uses local time.
    let timer = fmt::time::ChronoLocal::rfc_3339();
    let debug = config.console_debug();

    // Set which traces are tracked.
    // By default, all INFO traces and above are shown.
    let target = if debug {
        Targets::new()
            .with_default(LevelFilter::INFO)
            .with_target(THIS_CRATE, LevelFilter::DEBUG)
    } else {
        Targets::new().with_default(LevelFilter::INFO)
    };

    // Source locations are only shown in debug mode.
    let console_layer = fmt::layer()
        .with_ansi(true)
        .with_file(debug)
        .with_level(true)
        .with_line_number(debug)
        .with_target(true)
        .with_timer(timer.clone())
        .pretty()
        .with_filter(target.clone());

    // Same as the console, without colors and on one line per event.
    let (log_layer, guard) = if config.logs_enabled() {
        // Put file logs in `log_dir` as "{THIS_CRATE}.log.{TIMESTAMP}", a new file every hour.
        let prefix = format!("{THIS_CRATE}.log");
        let appender = tracing_appender::rolling::hourly(config.log_dir(), prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_ansi(false)
            .with_file(debug)
            .with_level(true)
            .with_line_number(debug)
            .with_target(true)
            .with_timer(timer)
            .with_writer(writer)
            .compact()
            .with_filter(target);

        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(log_layer)
        .init();

    guard
}

/// Defines various behaviors for how to handle errors.
///
/// [UserError]s and misuse of commands get a warning reply and are logged at debug level.
/// Everything else is a bug: it's logged as an error and the notify list gets a message.
pub fn handle_framework_error(err: FrameworkError<Data, BotError>) -> BoxFuture<()> {
    let handler = async move {
        match err {
            // Invisible to users.
            FrameworkError::Setup { error, .. } => error!("Error during startup: {error}"),
            FrameworkError::EventHandler { error, event, .. } => {
                error!("Error while handling {} event. {error}", event.snake_case_name())
            }

            // Expected, the user only gets told what went wrong.
            FrameworkError::SubcommandRequired { ctx } => {
                let subcmds = ctx
                    .command()
                    .subcommands
                    .iter()
                    .map(|s| format!("`{}`", s.name))
                    .join(", ");
                warn_user(&ctx, UserError::MissingSubcommand { subcmds }, None).await;
            }
            FrameworkError::Command {
                error: BotError::UserError(user_error),
                ctx,
                ..
            } => warn_user(&ctx, user_error, None).await,
            FrameworkError::ArgumentParse {
                error, input, ctx, ..
            } => warn_user(&ctx, UserError::BadArgs { input }, Some(error.to_string())).await,
            FrameworkError::CooldownHit {
                remaining_cooldown,
                ctx,
                ..
            } => warn_user(&ctx, UserError::OnCooldown { remaining_cooldown }, None).await,
            FrameworkError::MissingBotPermissions {
                missing_permissions,
                ctx,
                ..
            } => {
                let user_error = UserError::MissingBotPermissions {
                    missing_permissions,
                };
                warn_user(&ctx, user_error, None).await;
            }
            FrameworkError::MissingUserPermissions {
                missing_permissions,
                ctx,
                ..
            } => {
                let user_error = UserError::MissingUserPermissions {
                    missing_permissions,
                };
                warn_user(&ctx, user_error, None).await;
            }
            FrameworkError::NotAnOwner { ctx, .. } => {
                warn_user(&ctx, UserError::NotOwner, None).await
            }
            FrameworkError::GuildOnly { ctx, .. } => {
                warn_user(&ctx, UserError::GuildOnly, None).await
            }
            FrameworkError::DmOnly { ctx, .. } => warn_user(&ctx, UserError::DmOnly, None).await,
            FrameworkError::NsfwOnly { ctx, .. } => {
                warn_user(&ctx, UserError::NsfwOnly, None).await
            }
            FrameworkError::CommandCheckFailed { error, ctx, .. } => {
                let error = BotError::CheckFailed {
                    reason: error.map(|e| e.to_string()),
                };

                Response::builder()
                    .ctx(&ctx)
                    .reply(error.to_string())
                    .source(error)
                    .build()
                    .send()
                    .await;
            }

            // Bugs. The user is told something broke and the notify list gets a report.
            FrameworkError::Command { error, ctx, .. } => {
                Response::builder()
                    .ctx(&ctx)
                    .reply("Something went wrong... A bug report has been sent.")
                    .source(error)
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CommandPanic { payload, ctx, .. } => {
                Response::builder()
                    .ctx(&ctx)
                    .reply("Something went horribly wrong... A bug report has been sent.")
                    .source(BotError::Panic { payload })
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CommandStructureMismatch {
                description, ctx, ..
            } => {
                let error = BotError::CommandStructureMismatch {
                    description: description.to_string(),
                };

                Response::builder()
                    .ctx(&ctx.into())
                    .reply("Commands are out of date. Please wait until discord catches up to a bot update.")
                    .source(error)
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }

            // Unreachable with slash commands only.
            FrameworkError::UnknownCommand { .. } => {
                error!("Prefix commands are not supported.")
            }
            FrameworkError::UnknownInteraction { interaction, .. } => {
                let name = &interaction.data.name;
                error!("Received unknown interaction: {name}")
            }
            FrameworkError::DynamicPrefix { .. } => {
                error!("Dynamic prefixes are not supported.")
            }
            other => error!("Unhandled framework error: {other}"),
        }
    };

    Box::pin(handler)
}

/// Reply with a warning describing `user_error`, logging it at debug level.
async fn warn_user(ctx: &Context<'_>, user_error: UserError, add_info: Option<String>) {
    Response::builder()
        .ctx(ctx)
        .reply(user_error.to_string())
        .source(user_error)
        .maybe_add_info(add_info)
        .build()
        .send()
        .await;
}

/// Sends an ephemeral embed to the [Context] author.
async fn ephemeral_reply(ctx: &Context<'_>, embed: CreateEmbed) {
    let reply = CreateReply::default().ephemeral(true).embed(embed);
    if let Err(e) = ctx.send(reply).await {
        error!("Failed to send ephemeral reply. {e}")
    };
}

/// Sends a private message to everyone in [Data::notify_list].
/// If a message fails, only log and don't retry.
async fn notify_bug(ctx: &Context<'_>, content: impl Into<String>) {
    let message = CreateMessage::new().content(content);

    for user in &ctx.data().notify_list {
        if let Err(e) = user.direct_message(ctx, message.clone()).await {
            error!("Failed to send bug notification. {e}");
        }
    }
}

/// Who used which command, and how.
fn debug_info(ctx: &Context) -> String {
    let user = &ctx.author().name;
    let cmd = &ctx.command().qualified_name;
    let user_input = ctx.invocation_string();
    let guild = ctx
        .guild_id()
        .map_or("a DM".to_string(), |g| format!("guild {g}"));
    format!("{user} tried to use {cmd} with {user_input} in {guild}.")
}

/// Structured response to errors.
/// Always logs as at least [debug level](tracing::debug), but is upgraded to
/// [error level](tracing::error) if `is_error` is set.
/// Additionally, notify messages are accompanied by [debug info](debug_info).
#[derive(bon::Builder)]
#[builder(on(String, into))]
struct Response<'a> {
    ctx: &'a Context<'a>,
    /// The reason for this reply, usually the error causing the response.
    #[builder(into)]
    source: BotError,
    /// Optional ephemeral reply to user, a warning or a fatal embed depending on `is_error`.
    reply: Option<String>,
    /// Additional information to log
    add_info: Option<String>,
    #[builder(default = false)]
    is_error: bool,
    /// Set to `true` to send notifications of the error.
    /// Does nothing if `is_error` is false.
    #[builder(default = false)]
    notify: bool,
}

impl Response<'_> {
    /// Execute the response
    async fn send(&self) {
        let ctx = self.ctx;

        let log_message = match &self.add_info {
            Some(info) => format!("{} | {info}", self.source),
            None => self.source.to_string(),
        };

        if self.is_error {
            error!("{log_message}");
            if self.notify {
                let content = format!("Debug Info: {}\n{log_message}", debug_info(ctx));
                notify_bug(ctx, content).await;
            }
        } else {
            debug!("{log_message}");
        }

        if let Some(ref reply) = self.reply {
            let embed = if self.is_error {
                embeds::error_fatal(reply)
            } else {
                embeds::error_warning(reply)
            };
            ephemeral_reply(ctx, embed).await;
        }
    }
}
