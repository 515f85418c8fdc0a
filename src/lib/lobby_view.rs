//! Discord side of a [Lobby]: the message, its buttons and the kick menu.
//!
//! The lobby itself lives in the [LobbyRegistry](super::registry::LobbyRegistry)
//! of its kind. Every press locks the registry, applies one transition and
//! releases the lock before talking to Discord.

use std::pin::pin;

use chrono::Utc;
use poise::CreateReply;
use poise::ReplyHandle;
use serenity::ButtonStyle;
use serenity::Colour;
use serenity::ComponentInteraction;
use serenity::ComponentInteractionDataKind;
use serenity::CreateActionRow;
use serenity::CreateButton;
use serenity::CreateEmbed;
use serenity::CreateEmbedAuthor;
use serenity::CreateInteractionResponse;
use serenity::CreateInteractionResponseFollowup;
use serenity::CreateInteractionResponseMessage;
use serenity::CreateSelectMenu;
use serenity::CreateSelectMenuKind;
use serenity::CreateSelectMenuOption;
use serenity::EditMessage;
use serenity::Mentionable;
use serenity::Message;
use serenity::UserId;
use tracing::instrument;

use super::draft_view;
use super::embeds;
use super::lobby::Lobby;
use super::lobby::LobbyError;
use super::lobby::LobbyKind;
use super::lobby::Player;
use super::presses;
use crate::error::UserError;
use crate::serenity;
use crate::Context;
use crate::BotError;

/// The controls of a lobby message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LobbyControl {
    Join,
    Start,
    Leave,
    Delete,
    Kick,
}

impl LobbyControl {
    /// All controls, buttons first.
    const ALL: [LobbyControl; 5] = [
        Self::Join,
        Self::Start,
        Self::Leave,
        Self::Delete,
        Self::Kick,
    ];

    fn suffix(self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Start => "start",
            Self::Leave => "leave",
            Self::Delete => "delete",
            Self::Kick => "kick",
        }
    }

    fn custom_id(self, prefix: &str) -> String {
        format!("{prefix}{}", self.suffix())
    }

    fn from_custom_id(prefix: &str, custom_id: &str) -> Option<Self> {
        let suffix = custom_id.strip_prefix(prefix)?;
        Self::ALL.into_iter().find(|c| c.suffix() == suffix)
    }
}

/// What a successful press did to the lobby.
enum Outcome {
    /// Membership changed, show the new player list and confirm to the presser.
    Changed(&'static str),
    Started,
    Deleted,
}

/// How far along a lobby is. Only an open lobby has working controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Started,
    Closed,
}

/// The host's look on the lobby embed.
#[derive(Debug, Clone)]
struct Banner {
    colour: Colour,
    icon_url: String,
}

/// Embed colour for hosts without a coloured role.
const DEFAULT_COLOUR: Colour = Colour::BLURPLE;

/// Open a lobby of `kind` hosted by the command author and run it until it
/// starts, is deleted or times out.
#[instrument(skip(ctx), fields(host = %ctx.author()))]
pub async fn open(ctx: Context<'_>, kind: LobbyKind) -> Result<(), BotError> {
    let host = ctx.author().id;
    let window = ctx.data().settings.lobby_window(kind);

    let lobby = {
        let mut registry = ctx.data().lobbies(kind).lock().await;
        let lobby = registry
            .create(Player::from(ctx.author()), Utc::now(), window)
            .map_err(UserError::from)?;
        lobby.clone()
    };
    tracing::info!("{} opened a {} lobby.", lobby.host().name, kind.title());

    let banner = banner(ctx).await;
    let prefix = ctx.id().to_string();
    let reply = CreateReply::default()
        .embed(lobby_embed(kind, &lobby, &banner, Phase::Open))
        .components(components(&prefix, &lobby, Phase::Open));

    let started = match ctx.send(reply).await {
        Ok(handle) => run(ctx, kind, &prefix, &banner, &handle).await,
        Err(e) => Err(e.into()),
    };

    match started {
        Ok(Some((press, lobby))) => on_start(ctx, kind, &press, lobby).await,
        Ok(None) => Ok(()),
        Err(e) => {
            // Nobody is listening to this lobby anymore.
            ctx.data().lobbies(kind).lock().await.remove(&host);
            Err(e)
        }
    }
}

/// Handle presses until the lobby starts, is deleted or times out.
///
/// Returns the start press and the lobby if it was started.
async fn run(
    ctx: Context<'_>,
    kind: LobbyKind,
    prefix: &str,
    banner: &Banner,
    handle: &ReplyHandle<'_>,
) -> Result<Option<(ComponentInteraction, Lobby)>, BotError> {
    let host = ctx.author().id;
    // Lobbies outlive the command's token, so the message is edited with the bot token.
    let mut message = handle.message().await?.into_owned();

    let stream = presses::stream(ctx, prefix);
    let mut stream = pin!(stream);

    loop {
        let remaining = {
            let registry = ctx.data().lobbies(kind).lock().await;
            registry.get(&host).and_then(|lobby| lobby.remaining(Utc::now()))
        };
        let press = match remaining {
            Some(remaining) => presses::next_within(&mut stream, remaining).await,
            None => None,
        };
        let Some(press) = press else {
            time_out(ctx, kind, prefix, banner, &mut message).await?;
            return Ok(None);
        };
        let Some(control) = LobbyControl::from_custom_id(prefix, &press.data.custom_id) else {
            continue;
        };

        let (result, lobby) = {
            let mut registry = ctx.data().lobbies(kind).lock().await;
            let Some(lobby) = registry.get_mut(&host) else {
                return Ok(None);
            };
            let result = apply(lobby, control, &press);
            let snapshot = lobby.clone();
            if matches!(result, Ok(Outcome::Started | Outcome::Deleted)) {
                registry.remove(&host);
            }
            (result, snapshot)
        };

        match result {
            Err(rejection) => {
                tracing::debug!("{} was rejected: {rejection}", press.user.name);
                embeds::respond_ephemeral(ctx, &press, embeds::error_warning(rejection)).await?;
            }
            Ok(Outcome::Changed(confirmation)) => {
                let update = CreateInteractionResponseMessage::new()
                    .embed(lobby_embed(kind, &lobby, banner, Phase::Open))
                    .components(components(prefix, &lobby, Phase::Open));
                press
                    .create_response(ctx, CreateInteractionResponse::UpdateMessage(update))
                    .await?;
                let confirm = CreateInteractionResponseFollowup::new()
                    .embed(embeds::success(confirmation))
                    .ephemeral(true);
                press.create_followup(ctx, confirm).await?;
            }
            Ok(Outcome::Started) => {
                tracing::info!("{} started their {} lobby.", press.user.name, kind.title());
                let started = EditMessage::new()
                    .embed(lobby_embed(kind, &lobby, banner, Phase::Started))
                    .components(components(prefix, &lobby, Phase::Started));
                message.edit(ctx, started).await?;
                return Ok(Some((press, lobby)));
            }
            Ok(Outcome::Deleted) => {
                tracing::info!("{} deleted their {} lobby.", press.user.name, kind.title());
                message.delete(ctx).await?;
                let done = embeds::success("The lobby has been deleted.");
                embeds::respond_public(ctx, &press, done).await?;
                return Ok(None);
            }
        }
    }
}

/// Apply the transition behind `control` for the user pressing it.
fn apply(
    lobby: &mut Lobby,
    control: LobbyControl,
    press: &ComponentInteraction,
) -> Result<Outcome, LobbyError> {
    let actor = Player::from(&press.user);
    let now = Utc::now();

    match control {
        LobbyControl::Join => {
            lobby.join(actor, now)?;
            Ok(Outcome::Changed("You have joined the lobby."))
        }
        LobbyControl::Leave => {
            lobby.leave(actor.id)?;
            Ok(Outcome::Changed("You have left the lobby."))
        }
        LobbyControl::Kick => {
            let Some(target) = selected_users(press).into_iter().next() else {
                return Err(LobbyError::NotInLobby);
            };
            lobby.kick(actor.id, target)?;
            Ok(Outcome::Changed("The player has been kicked from the lobby."))
        }
        LobbyControl::Start => {
            lobby.start(actor.id, now)?;
            Ok(Outcome::Started)
        }
        LobbyControl::Delete => {
            lobby.delete(actor.id, now)?;
            Ok(Outcome::Deleted)
        }
    }
}

/// Close the lobby after its deadline and disable its controls.
async fn time_out(
    ctx: Context<'_>,
    kind: LobbyKind,
    prefix: &str,
    banner: &Banner,
    message: &mut Message,
) -> Result<(), BotError> {
    let lobby = {
        let mut registry = ctx.data().lobbies(kind).lock().await;
        registry.remove(&ctx.author().id).map(|mut lobby| {
            lobby.close(Utc::now());
            lobby
        })
    };
    let Some(lobby) = lobby else {
        return Ok(());
    };

    tracing::info!("{} lobby of {} timed out.", kind.title(), lobby.host().name);
    let closed = EditMessage::new()
        .embed(lobby_embed(kind, &lobby, banner, Phase::Closed))
        .components(components(prefix, &lobby, Phase::Closed));
    message.edit(ctx, closed).await?;
    Ok(())
}

/// The follow-up of a started lobby. Intentionally different per kind.
async fn on_start(
    ctx: Context<'_>,
    kind: LobbyKind,
    press: &ComponentInteraction,
    lobby: Lobby,
) -> Result<(), BotError> {
    match kind {
        LobbyKind::TenMan => draft_view::run(ctx, press, lobby).await,
        LobbyKind::Bingo => {
            let mentions = lobby
                .players()
                .iter()
                .map(|p| p.id.mention().to_string())
                .collect::<Vec<_>>()
                .join(" ");
            let message = CreateInteractionResponseMessage::new()
                .content(mentions)
                .embed(embeds::success("The bingo has started. Good luck!"));
            press
                .create_response(ctx, CreateInteractionResponse::Message(message))
                .await?;
            Ok(())
        }
    }
}

/// Colour of the host's top coloured role and their avatar.
async fn banner(ctx: Context<'_>) -> Banner {
    let role_colour = match ctx.author_member().await {
        Some(member) => member.colour(ctx.cache()),
        None => None,
    };
    Banner {
        colour: role_colour.unwrap_or(DEFAULT_COLOUR),
        icon_url: ctx.author().face(),
    }
}

/// Users picked in a select menu.
pub fn selected_users(press: &ComponentInteraction) -> Vec<UserId> {
    match &press.data.kind {
        ComponentInteractionDataKind::StringSelect { values } => values
            .iter()
            .filter_map(|v| v.parse::<u64>().ok())
            .filter(|&id| id != 0)
            .map(UserId::new)
            .collect(),
        _ => Vec::new(),
    }
}

/// `* <mention>` per player.
pub fn player_list<'a>(players: impl IntoIterator<Item = &'a Player>) -> String {
    players
        .into_iter()
        .map(|p| format!("* {}", p.id.mention()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Description of a lobby accepting players.
fn open_description(lobby: &Lobby) -> String {
    let closes = lobby.ends().timestamp();
    format!("The lobby closes <t:{closes}:R>. Join before then!")
}

/// The lobby message embed.
fn lobby_embed(kind: LobbyKind, lobby: &Lobby, banner: &Banner, phase: Phase) -> CreateEmbed {
    let description = match phase {
        Phase::Open => open_description(lobby),
        Phase::Started => kind.started_description().to_string(),
        Phase::Closed => "The lobby has closed.".to_string(),
    };
    let author = CreateEmbedAuthor::new(&lobby.host().name).icon_url(&banner.icon_url);

    CreateEmbed::new()
        .title(kind.title())
        .description(description)
        .colour(banner.colour)
        .author(author)
        .field("Players", player_list(lobby.players()), false)
}

/// Buttons and kick menu, all disabled unless the lobby is open.
fn components(prefix: &str, lobby: &Lobby, phase: Phase) -> Vec<CreateActionRow> {
    let closed = phase != Phase::Open;
    let button = |control: LobbyControl, label: &str, style: ButtonStyle| {
        CreateButton::new(control.custom_id(prefix))
            .label(label)
            .style(style)
            .disabled(closed)
    };
    let buttons = vec![
        button(LobbyControl::Join, "Join", ButtonStyle::Primary),
        button(LobbyControl::Start, "Start", ButtonStyle::Success),
        button(LobbyControl::Leave, "Leave", ButtonStyle::Secondary),
        button(LobbyControl::Delete, "Delete", ButtonStyle::Danger),
    ];

    let options = lobby
        .players()
        .iter()
        .map(|p| {
            CreateSelectMenuOption::new(&p.name, p.id.to_string())
                .emoji('🔨')
                .description(format!("Kick {}", p.name))
        })
        .collect();
    let kick_menu = CreateSelectMenu::new(
        LobbyControl::Kick.custom_id(prefix),
        CreateSelectMenuKind::String { options },
    )
    .placeholder("Kick a player")
    .min_values(1)
    .max_values(1)
    .disabled(closed);

    vec![
        CreateActionRow::Buttons(buttons),
        CreateActionRow::SelectMenu(kick_menu),
    ]
}
