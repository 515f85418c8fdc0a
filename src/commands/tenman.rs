//! Implements the `/tenman` commands.
//!
//! A 10-man lobby gathers players, then its host picks two captains who
//! draft the teams and move them into their own voice channels.

use tracing::instrument;

use crate::lib::lobby::LobbyKind;
use crate::lib::lobby_view;
use crate::BotError;
use crate::Context;

/// 10 man lobbies with a captain draft
#[poise::command(slash_command, guild_only, subcommands("create"), subcommand_required)]
pub async fn tenman(_ctx: Context<'_>) -> Result<(), BotError> {
    Ok(())
}

/// Open a 10 man lobby
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only, user_cooldown = 5)]
pub async fn create(ctx: Context<'_>) -> Result<(), BotError> {
    lobby_view::open(ctx, LobbyKind::TenMan).await
}
