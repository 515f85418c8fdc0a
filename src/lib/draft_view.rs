//! Discord side of the 10-man [Draft]: captain selection, player picks and
//! moving teams into temporary voice channels.

use std::pin::pin;
use std::time::Duration;

use serenity::ButtonStyle;
use serenity::ComponentInteraction;
use serenity::CreateActionRow;
use serenity::CreateButton;
use serenity::CreateEmbed;
use serenity::CreateInteractionResponse;
use serenity::CreateInteractionResponseMessage;
use serenity::CreateSelectMenu;
use serenity::CreateSelectMenuKind;
use serenity::CreateSelectMenuOption;
use serenity::EditMessage;
use serenity::Mentionable;
use serenity::UserId;
use tracing::instrument;

use super::draft::Draft;
use super::draft::DraftError;
use super::embeds;
use super::lobby::HostAction;
use super::lobby::Lobby;
use super::lobby::Player;
use super::lobby_view::player_list;
use super::lobby_view::selected_users;
use super::presses;
use super::temp_voice;
use crate::error::UserError;
use crate::serenity;
use crate::Context;
use crate::BotError;

/// Title of every draft message.
const TITLE: &str = "10 Man Lobby";

/// Let the host of `lobby` pick two captains, then run the draft.
///
/// The captain menu is sent as the response to `start_press`.
#[instrument(skip_all, fields(host = %lobby.host().name))]
pub async fn run(
    ctx: Context<'_>,
    start_press: &ComponentInteraction,
    lobby: Lobby,
) -> Result<(), BotError> {
    if lobby.players().len() < 2 {
        let warning = embeds::error_warning("At least two players are needed to pick captains.");
        embeds::respond_public(ctx, start_press, warning).await?;
        return Ok(());
    }

    let prefix = format!("{}captain", ctx.id());
    let timeout = Duration::from_secs(ctx.data().settings.draft_timeout_secs);
    let embed = CreateEmbed::new().title(format!("{TITLE} - Pick captains"));

    let message = CreateInteractionResponseMessage::new()
        .embed(embed.clone())
        .components(vec![captain_menu(&prefix, lobby.players(), false)]);
    start_press
        .create_response(ctx, CreateInteractionResponse::Message(message))
        .await?;
    // Edited with the bot token from here on, the press token expires.
    let mut menu_message = start_press.get_response(ctx).await?;

    let stream = presses::stream(ctx, &prefix);
    let mut stream = pin!(stream);

    let draft = loop {
        let Some(press) = presses::next_within(&mut stream, timeout).await else {
            tracing::info!("Captain selection timed out.");
            let expired = EditMessage::new()
                .embed(embed)
                .components(vec![captain_menu(&prefix, lobby.players(), true)]);
            menu_message.edit(ctx, expired).await?;
            return Ok(());
        };

        if let Err(rejection) = lobby.require_host(press.user.id, HostAction::PickCaptains) {
            embeds::respond_ephemeral(ctx, &press, embeds::error_warning(rejection)).await?;
            continue;
        }

        let result = match selected_users(&press).as_slice() {
            &[first, second] => Draft::new(lobby.players(), [first, second], &mut rand::thread_rng()),
            _ => Err(DraftError::InvalidCaptains),
        };
        match result {
            Ok(draft) => {
                let chosen = embed
                    .clone()
                    .description("Captains have been chosen.")
                    .field("Team 1", draft.captain(0).id.mention().to_string(), true)
                    .field("Team 2", draft.captain(1).id.mention().to_string(), true);
                let done = EditMessage::new()
                    .embed(chosen)
                    .components(vec![captain_menu(&prefix, lobby.players(), true)]);
                menu_message.edit(ctx, done).await?;
                break (draft, press);
            }
            Err(rejection) => {
                embeds::respond_ephemeral(ctx, &press, embeds::error_warning(rejection)).await?;
            }
        }
    };

    let (draft, captain_press) = draft;
    pick_players(ctx, &captain_press, draft).await
}

/// Alternate picks between captains, then offer to move the teams to voice.
async fn pick_players(
    ctx: Context<'_>,
    captain_press: &ComponentInteraction,
    mut draft: Draft,
) -> Result<(), BotError> {
    let prefix = format!("{}draft", ctx.id());
    let timeout = Duration::from_secs(ctx.data().settings.draft_timeout_secs);

    tracing::info!(
        "Captains {} and {} are picking, {} goes first.",
        draft.captain(0).name,
        draft.captain(1).name,
        draft.captain(draft.turn()).name
    );

    let message = CreateInteractionResponseMessage::new()
        .embed(draft_embed(&draft))
        .components(draft_components(&prefix, &draft, false));
    captain_press
        .create_response(ctx, CreateInteractionResponse::Message(message))
        .await?;
    let mut draft_message = captain_press.get_response(ctx).await?;

    let pick_id = format!("{prefix}pick");
    let stream = presses::stream(ctx, &prefix);
    let mut stream = pin!(stream);

    while let Some(press) = presses::next_within(&mut stream, timeout).await {
        if press.data.custom_id == pick_id {
            let target = selected_users(&press).into_iter().next();
            let result = match target {
                Some(target) => draft.pick(press.user.id, target),
                None => Err(DraftError::Unavailable),
            };
            match result {
                Err(rejection) => {
                    embeds::respond_ephemeral(ctx, &press, embeds::error_warning(rejection))
                        .await?;
                }
                Ok(team) => {
                    tracing::debug!("{} picked for team {}.", press.user.name, team + 1);
                    if draft.is_complete() {
                        tracing::info!("Teams are ready!");
                    }
                    let update = CreateInteractionResponseMessage::new()
                        .embed(draft_embed(&draft))
                        .components(draft_components(&prefix, &draft, false));
                    press
                        .create_response(ctx, CreateInteractionResponse::UpdateMessage(update))
                        .await?;
                }
            }
        } else {
            move_team(ctx, &press, &mut draft).await?;
        }
    }

    tracing::info!("Draft view timed out.");
    let expired = EditMessage::new()
        .embed(draft_embed(&draft))
        .components(draft_components(&prefix, &draft, true));
    draft_message.edit(ctx, expired).await?;
    Ok(())
}

/// Create a voice channel for the pressing captain's team and move the team in.
async fn move_team(
    ctx: Context<'_>,
    press: &ComponentInteraction,
    draft: &mut Draft,
) -> Result<(), BotError> {
    let team = match draft.claim_move(press.user.id) {
        Ok(team) => team,
        Err(rejection) => {
            embeds::respond_ephemeral(ctx, press, embeds::error_warning(rejection)).await?;
            return Ok(());
        }
    };
    let number = team + 1;
    let guild = ctx.guild_id().ok_or(UserError::GuildOnly)?;
    let data = ctx.data();

    let channel = temp_voice::create(
        &ctx.serenity_context().http,
        &data.temp_voice,
        guild,
        &format!("10 man - Team {number}"),
        0,
        data.settings.temp_voice_category,
        &format!("10 man draft by {}", press.user.name),
    )
    .await;
    let channel = match channel {
        Ok(channel) => channel,
        Err(e) => {
            tracing::error!("Failed to create a voice channel for team {number}. {e}");
            let fatal = embeds::error_fatal(temp_voice::CREATE_FAILED);
            embeds::respond_public(ctx, press, fatal).await?;
            return Ok(());
        }
    };

    let members: Vec<UserId> = draft.teams()[team].iter().map(|p| p.id).collect();
    let http = &ctx.serenity_context().http;
    let failed = temp_voice::move_members(http, guild, channel.id, &members).await;

    let embed = if failed.is_empty() {
        embeds::success(format!("Moved team {number} to {}!", channel.id.mention()))
    } else {
        let failed = failed
            .iter()
            .map(|id| format!("* {}", id.mention()))
            .collect::<Vec<_>>()
            .join("\n");
        embeds::error_warning(format!(
            "Couldn't move these users to {}:\n{failed}\n\n\
             They might not be connected to voice, or I lack permission to move them.",
            channel.id.mention()
        ))
    };
    embeds::respond_public(ctx, press, embed).await?;
    Ok(())
}

/// Select menu listing the lobby players, pick exactly two.
fn captain_menu(custom_id: &str, players: &[Player], disabled: bool) -> CreateActionRow {
    let options = players
        .iter()
        .map(|p| CreateSelectMenuOption::new(&p.name, p.id.to_string()).emoji('🧑'))
        .collect();
    let menu = CreateSelectMenu::new(custom_id, CreateSelectMenuKind::String { options })
        .placeholder("Pick 2 captains")
        .min_values(2)
        .max_values(2)
        .disabled(disabled);
    CreateActionRow::SelectMenu(menu)
}

/// Teams so far and whose turn it is.
fn draft_embed(draft: &Draft) -> CreateEmbed {
    let [first, second] = draft.teams();
    let embed = if draft.is_complete() {
        CreateEmbed::new()
            .title(TITLE)
            .description("The teams are ready!")
    } else {
        let captain = draft.captain(draft.turn()).id.mention();
        CreateEmbed::new()
            .title(format!("{TITLE} - Pick players"))
            .description(format!("It's {captain}'s turn."))
    };
    embed
        .field("Team 1", player_list(first), false)
        .field("Team 2", player_list(second), false)
}

/// The pick menu while players remain, the move button afterwards.
fn draft_components(prefix: &str, draft: &Draft, disabled: bool) -> Vec<CreateActionRow> {
    if draft.is_complete() {
        let button = CreateButton::new(format!("{prefix}move"))
            .label("Create channel and move team")
            .emoji('🔊')
            .style(ButtonStyle::Primary)
            .disabled(disabled);
        return vec![CreateActionRow::Buttons(vec![button])];
    }

    let options = draft
        .available()
        .iter()
        .map(|p| CreateSelectMenuOption::new(&p.name, p.id.to_string()).emoji('🤼'))
        .collect();
    let menu = CreateSelectMenu::new(
        format!("{prefix}pick"),
        CreateSelectMenuKind::String { options },
    )
    .placeholder("Pick a player for your team")
    .min_values(1)
    .max_values(1)
    .disabled(disabled);
    vec![CreateActionRow::SelectMenu(menu)]
}
