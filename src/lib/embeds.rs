//! Embed templates shared by commands and component views.

use std::fmt::Display;

use serenity::CacheHttp;
use serenity::Colour;
use serenity::ComponentInteraction;
use serenity::CreateEmbed;
use serenity::CreateInteractionResponse;
use serenity::CreateInteractionResponseMessage;

use crate::serenity;

/// Green used by [success].
const SUCCESS_COLOUR: Colour = Colour::new(0x2E_CC_71);

/// A warning, used for expected failures (bad input, failed preconditions).
pub fn error_warning(text: impl Display) -> CreateEmbed {
    CreateEmbed::new()
        .colour(Colour::GOLD)
        .description(format!("⚠️ {text}"))
}

/// A fatal error, used when the bot itself failed to do something.
pub fn error_fatal(text: impl Display) -> CreateEmbed {
    CreateEmbed::new()
        .colour(Colour::RED)
        .description(format!("❌ {text}"))
}

/// Something went as planned.
pub fn success(text: impl Display) -> CreateEmbed {
    CreateEmbed::new()
        .colour(SUCCESS_COLOUR)
        .description(format!("✅ {text}"))
}

/// Answer a component interaction with an embed only the presser can see.
pub async fn respond_ephemeral(
    cache_http: impl CacheHttp,
    press: &ComponentInteraction,
    embed: CreateEmbed,
) -> Result<(), serenity::Error> {
    let message = CreateInteractionResponseMessage::new()
        .embed(embed)
        .ephemeral(true);
    press
        .create_response(cache_http, CreateInteractionResponse::Message(message))
        .await
}

/// Answer a component interaction with an embed visible to the whole channel.
pub async fn respond_public(
    cache_http: impl CacheHttp,
    press: &ComponentInteraction,
    embed: CreateEmbed,
) -> Result<(), serenity::Error> {
    let message = CreateInteractionResponseMessage::new().embed(embed);
    press
        .create_response(cache_http, CreateInteractionResponse::Message(message))
        .await
}
