//! Bot commands.

mod bingo;
mod members;
mod tempvoice;
mod tenman;

use crate::BotError;
use crate::Data;

/// Convenient type alias for [poise::Command].
pub type Command = poise::Command<Data, BotError>;

/// Lists all the implemented commands
pub fn list() -> Vec<Command> {
    vec![
        tenman::tenman(),
        bingo::bingo(),
        tempvoice::tempvoice(),
        members::members(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree() {
        let commands = list();
        let names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["tenman", "bingo", "tempvoice", "members"]);

        let members = &commands[3];
        let subcommands: Vec<&str> = members.subcommands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(subcommands, ["created", "joined"]);
        assert!(commands.iter().all(|c| c.guild_only));
    }
}
