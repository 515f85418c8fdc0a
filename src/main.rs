mod commands;
mod data;
mod error;
mod lib;
mod log;
mod setup;

pub use data::Data;
pub use error::BotError;
pub use poise::serenity_prelude as serenity;
pub use setup::Config;

/// The context every command gets.
pub type Context<'a> = poise::Context<'a, Data, BotError>;

#[tokio::main]
async fn main() {
    let config = match Config::read() {
        Ok(config) => config,
        Err(e) => {
            // Tracing isn't installed without a config.
            eprintln!("{e}");
            return;
        }
    };

    // Dropping the guard stops file logging, so it lives as long as main.
    let _guard = log::install_tracing(&config);

    let client = setup::client(config).await;
    match client {
        Ok(mut client) => {
            if let Err(e) = client.start().await {
                tracing::error!("Client stopped. {e}");
            }
        }
        Err(e) => tracing::error!("Failed to build client. {e}"),
    }
}
