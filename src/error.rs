//! Error types.
//!
//! [BotError] is the error type of the framework. Expected failures are
//! [UserError]s and get shown to the user; everything else is a bug.

use std::time::Duration;

use serenity::Permissions;
use thiserror::Error;

use crate::lib::lobby::LobbyError;
use crate::serenity;

/// Every error a command can return.
#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    UserError(#[from] UserError),
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    #[error("Discord error: {0}")]
    Serenity(#[from] serenity::Error),
    #[error("Command panicked: {}", payload.as_deref().unwrap_or("<no payload>"))]
    Panic { payload: Option<String> },
    #[error("Command structure mismatch: {description}")]
    CommandStructureMismatch { description: String },
    #[error("Check failed: {}", reason.as_deref().unwrap_or("<no reason>"))]
    CheckFailed { reason: Option<String> },
}

/// Expected errors caused by how the bot was used.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("This command can only be used in servers.")]
    GuildOnly,
    #[error("This command can only be used in DMs.")]
    DmOnly,
    #[error("This command can only be used in NSFW channels.")]
    NsfwOnly,
    #[error("Only the bot owner can do this.")]
    NotOwner,
    #[error("Pick one of these subcommands: {subcmds}")]
    MissingSubcommand { subcmds: String },
    #[error("Couldn't understand the arguments{}.", input.as_deref().map(|i| format!(" `{i}`")).unwrap_or_default())]
    BadArgs { input: Option<String> },
    #[error("The command was just used. Try again in {:.1} seconds.", remaining_cooldown.as_secs_f32())]
    OnCooldown { remaining_cooldown: Duration },
    #[error("I'm missing these permissions: {missing_permissions}")]
    MissingBotPermissions { missing_permissions: Permissions },
    #[error("You are missing these permissions: {}", missing_permissions.map(|p| p.to_string()).unwrap_or_default())]
    MissingUserPermissions {
        missing_permissions: Option<Permissions>,
    },
    #[error("Nothing found: {what}")]
    NothingFound { what: String },
    #[error(transparent)]
    Lobby(#[from] LobbyError),
}

/// Problems with `config.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing config file. {action_msg}")]
    MissingConfig { action_msg: String },
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },
    #[error("Couldn't access config file: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_read_well() {
        let cooldown = UserError::OnCooldown {
            remaining_cooldown: Duration::from_millis(2500),
        };
        assert_eq!(
            cooldown.to_string(),
            "The command was just used. Try again in 2.5 seconds."
        );

        let bad = UserError::BadArgs {
            input: Some("abc".to_string()),
        };
        assert_eq!(bad.to_string(), "Couldn't understand the arguments `abc`.");
        assert_eq!(
            UserError::BadArgs { input: None }.to_string(),
            "Couldn't understand the arguments."
        );
    }

    #[test]
    fn lobby_errors_pass_through() {
        let error: BotError = UserError::from(LobbyError::AlreadyHosting).into();
        assert_eq!(error.to_string(), "You are already hosting a lobby.");
    }
}
