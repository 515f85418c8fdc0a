//! Defines and implements custom bot functionality.

mod config;
mod framework;

use crate::serenity;
use crate::BotError;

pub use config::Config;

/// Constructs a [serenity::Client] running the bot's [poise::Framework].
pub(super) async fn client(config: Config) -> Result<serenity::Client, BotError> {
    // Get discord token from config file
    let token = config.token()?.clone();

    // Intents we wish to use
    // See https://discord.com/developers/docs/topics/gateway#gateway-intents
    // Members are needed for member lists, voice states for temporary channels.
    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let client = serenity::ClientBuilder::new(token, intents)
        .framework(framework::framework(config))
        .await?;

    Ok(client)
}
