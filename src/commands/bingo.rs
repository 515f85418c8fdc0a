//! Implements the `/bingo` commands.

use tracing::instrument;

use crate::lib::lobby::LobbyKind;
use crate::lib::lobby_view;
use crate::BotError;
use crate::Context;

/// Bingo lobbies
#[poise::command(slash_command, guild_only, subcommands("create"), subcommand_required)]
pub async fn bingo(_ctx: Context<'_>) -> Result<(), BotError> {
    Ok(())
}

/// Open a bingo lobby
#[instrument(skip(ctx))]
#[poise::command(slash_command, guild_only, user_cooldown = 5)]
pub async fn create(ctx: Context<'_>) -> Result<(), BotError> {
    lobby_view::open(ctx, LobbyKind::Bingo).await
}
