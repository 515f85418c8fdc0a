//! Implements the `/tempvoice` command.
//!
//! The bot creates a voice channel that is deleted once it has been empty for a while.

use poise::CreateReply;
use serenity::ChannelId;
use serenity::CreateEmbed;
use serenity::Mentionable;
use tracing::instrument;

use crate::error::UserError;
use crate::lib::embeds;
use crate::lib::temp_voice;
use crate::serenity;
use crate::BotError;
use crate::Context;

/// Create a voice channel that is deleted when left empty
#[instrument(skip(ctx))]
#[poise::command(
    slash_command,
    guild_only,
    user_cooldown = 10,
    required_bot_permissions = "MANAGE_CHANNELS | MOVE_MEMBERS"
)]
pub async fn tempvoice(
    ctx: Context<'_>,
    #[description = "Name of the channel"]
    #[max_length = 100]
    name: String,
    #[description = "Maximum number of members, no limit if empty"]
    #[min = 1]
    #[max = 99]
    limit: Option<u32>,
) -> Result<(), BotError> {
    let guild = ctx.guild_id().ok_or(UserError::GuildOnly)?;
    let data = ctx.data();
    let http = &ctx.serenity_context().http;

    let created = temp_voice::create(
        http,
        &data.temp_voice,
        guild,
        &name,
        limit.unwrap_or(0),
        data.settings.temp_voice_category,
        &format!("Temporary channel for {}", ctx.author().name),
    )
    .await;
    let channel = match created {
        Ok(channel) => channel,
        Err(e) => {
            tracing::error!("Failed to create temporary voice channel {name}. {e}");
            ctx.send(CreateReply::default().embed(creation_failed()))
                .await?;
            return Ok(());
        }
    };

    // Only works if the author is already connected to voice.
    let author = ctx.author().id;
    let failed = temp_voice::move_members(http, guild, channel.id, &[author]).await;

    let text = created_text(channel.id, failed.is_empty());
    ctx.send(CreateReply::default().embed(embeds::success(text)))
        .await?;

    Ok(())
}

/// Reply when Discord refused to create the channel.
fn creation_failed() -> CreateEmbed {
    embeds::error_fatal(temp_voice::CREATE_FAILED)
}

fn created_text(channel: ChannelId, moved_in: bool) -> String {
    let mut text = format!("Created {}.", channel.mention());
    if moved_in {
        text.push_str(" You have been moved in.");
    }
    text.push_str(" It is deleted once it has been empty for a while.");
    text
}
