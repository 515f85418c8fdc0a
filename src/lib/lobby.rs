//! The lobby state machine: join, leave, kick, start, delete and timeout.
//!
//! A lobby is `open` until its deadline (`ends`) and `closed` afterwards.
//! Starting, deleting or timing out all close it by moving `ends` to now.
//! Every rejected transition leaves the lobby untouched.

use std::collections::HashSet;
use std::fmt::Display;

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;
use serenity::User;
use serenity::UserId;
use thiserror::Error;

use crate::serenity;

/// A lobby never holds more players than this.
pub const MAX_PLAYERS: usize = 10;

/// A lobby member, with the name shown in menus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: UserId,
    pub name: String,
}

impl Player {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl From<&User> for Player {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.display_name())
    }
}

/// Transitions reserved for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    Start,
    Delete,
    Kick,
    PickCaptains,
}

impl Display for HostAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let action = match self {
            HostAction::Start => "start the lobby",
            HostAction::Delete => "delete the lobby",
            HostAction::Kick => "kick players",
            HostAction::PickCaptains => "pick captains",
        };
        f.write_str(action)
    }
}

/// Why a lobby transition was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LobbyError {
    #[error("The lobby has already started.")]
    Closed,
    #[error("You have been kicked from the lobby.")]
    Kicked,
    #[error("You are already in the lobby.")]
    AlreadyJoined,
    #[error("The lobby is full.")]
    Full,
    #[error("You can't leave a lobby you host. Delete the lobby instead if you want to!")]
    HostCannotLeave,
    #[error("You are not in the lobby.")]
    NotInLobby,
    #[error("Only the host can {0}.")]
    HostOnly(HostAction),
    #[error("You can't kick yourself.")]
    SelfKick,
    #[error("You are already hosting a lobby.")]
    AlreadyHosting,
    #[error("You are already in a lobby.")]
    AlreadyInAnotherLobby,
}

/// Which command created the lobby. Decides the title, the join window and
/// what happens on start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LobbyKind {
    TenMan,
    Bingo,
}

impl LobbyKind {
    pub fn title(self) -> &'static str {
        match self {
            LobbyKind::TenMan => "10 Man Lobby",
            LobbyKind::Bingo => "Bingo Lobby",
        }
    }

    /// Description shown on the lobby message once it has started.
    pub fn started_description(self) -> &'static str {
        match self {
            LobbyKind::TenMan => "The lobby has started! Time to pick captains.",
            LobbyKind::Bingo => "The bingo has started!",
        }
    }
}

/// Players gathering before a game.
#[derive(Debug, Clone)]
pub struct Lobby {
    /// Never changes and is always in `players`.
    host: Player,
    /// Unique, in join order.
    players: Vec<Player>,
    /// Joins are rejected from this point on.
    ends: DateTime<Utc>,
    /// Users who may never join again.
    kicked: HashSet<UserId>,
}

impl Lobby {
    /// Open a lobby for `window` with `host` as its only player.
    pub fn new(host: Player, now: DateTime<Utc>, window: TimeDelta) -> Self {
        Self {
            players: vec![host.clone()],
            host,
            ends: now + window,
            kicked: HashSet::new(),
        }
    }

    pub fn host(&self) -> &Player {
        &self.host
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn ends(&self) -> DateTime<Utc> {
        self.ends
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now < self.ends
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.players.iter().any(|p| p.id == user)
    }

    pub fn is_kicked(&self, user: UserId) -> bool {
        self.kicked.contains(&user)
    }

    /// Time left before the lobby closes, `None` if already closed.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        (self.ends - now).to_std().ok().filter(|d| !d.is_zero())
    }

    /// Add `player` to the lobby.
    pub fn join(&mut self, player: Player, now: DateTime<Utc>) -> Result<(), LobbyError> {
        if !self.is_open(now) {
            return Err(LobbyError::Closed);
        }
        if self.is_kicked(player.id) {
            return Err(LobbyError::Kicked);
        }
        if self.contains(player.id) {
            return Err(LobbyError::AlreadyJoined);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(LobbyError::Full);
        }

        self.players.push(player);
        Ok(())
    }

    /// Remove `user` from the lobby. The host has to delete it instead.
    pub fn leave(&mut self, user: UserId) -> Result<Player, LobbyError> {
        if user == self.host.id {
            return Err(LobbyError::HostCannotLeave);
        }
        let index = self
            .players
            .iter()
            .position(|p| p.id == user)
            .ok_or(LobbyError::NotInLobby)?;

        Ok(self.players.remove(index))
    }

    /// Bar `target` from the lobby. Returns the removed player, if they were in it.
    pub fn kick(&mut self, actor: UserId, target: UserId) -> Result<Option<Player>, LobbyError> {
        self.require_host(actor, HostAction::Kick)?;
        if target == actor {
            return Err(LobbyError::SelfKick);
        }

        self.kicked.insert(target);
        let index = self.players.iter().position(|p| p.id == target);
        Ok(index.map(|i| self.players.remove(i)))
    }

    /// Close the lobby so the caller can run its follow-up.
    pub fn start(&mut self, actor: UserId, now: DateTime<Utc>) -> Result<(), LobbyError> {
        self.require_host(actor, HostAction::Start)?;
        if !self.is_open(now) {
            return Err(LobbyError::Closed);
        }

        self.close(now);
        Ok(())
    }

    /// Close the lobby for good, the caller removes its message.
    pub fn delete(&mut self, actor: UserId, now: DateTime<Utc>) -> Result<(), LobbyError> {
        self.require_host(actor, HostAction::Delete)?;
        self.close(now);
        Ok(())
    }

    /// Close the lobby without any checks, used on timeout.
    pub fn close(&mut self, now: DateTime<Utc>) {
        self.ends = self.ends.min(now);
    }

    /// Reject `actor` unless they host this lobby.
    pub fn require_host(&self, actor: UserId, action: HostAction) -> Result<(), LobbyError> {
        if actor == self.host.id {
            Ok(())
        } else {
            Err(LobbyError::HostOnly(action))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: u64) -> Player {
        Player::new(UserId::new(id), format!("player{id}"))
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn lobby() -> Lobby {
        Lobby::new(player(1), now(), TimeDelta::minutes(30))
    }

    fn ids(lobby: &Lobby) -> Vec<u64> {
        lobby.players().iter().map(|p| p.id.get()).collect()
    }

    #[test]
    fn host_is_the_first_player() {
        let lobby = lobby();
        assert_eq!(ids(&lobby), vec![1]);
        assert_eq!(lobby.ends(), now() + TimeDelta::minutes(30));
        assert!(lobby.is_open(now()));
    }

    #[test]
    fn join_kick_leave_scenario() {
        let mut lobby = lobby();
        lobby.join(player(2), now()).unwrap();
        assert_eq!(ids(&lobby), vec![1, 2]);

        let kicked = lobby.kick(UserId::new(1), UserId::new(2)).unwrap();
        assert_eq!(kicked, Some(player(2)));
        assert_eq!(lobby.join(player(2), now()), Err(LobbyError::Kicked));

        assert_eq!(lobby.leave(UserId::new(1)), Err(LobbyError::HostCannotLeave));
        assert_eq!(ids(&lobby), vec![1]);
    }

    #[test]
    fn kicked_users_are_denied_every_time() {
        let mut lobby = lobby();
        lobby.kick(UserId::new(1), UserId::new(7)).unwrap();
        for _ in 0..3 {
            assert!(lobby.is_kicked(UserId::new(7)));
            assert_eq!(lobby.join(player(7), now()), Err(LobbyError::Kicked));
        }
        assert_eq!(ids(&lobby), vec![1]);
    }

    #[test]
    fn full_lobby_rejects_anyone() {
        let mut lobby = lobby();
        for id in 2..=10 {
            lobby.join(player(id), now()).unwrap();
        }
        assert_eq!(lobby.players().len(), MAX_PLAYERS);

        for id in 11..15 {
            assert_eq!(lobby.join(player(id), now()), Err(LobbyError::Full));
        }
        assert_eq!(lobby.players().len(), MAX_PLAYERS);
    }

    #[test]
    fn duplicate_join_is_rejected() {
        let mut lobby = lobby();
        lobby.join(player(2), now()).unwrap();
        assert_eq!(lobby.join(player(2), now()), Err(LobbyError::AlreadyJoined));
        assert_eq!(lobby.join(player(1), now()), Err(LobbyError::AlreadyJoined));
        assert_eq!(ids(&lobby), vec![1, 2]);
    }

    #[test]
    fn join_after_deadline_is_rejected() {
        let mut lobby = lobby();
        let later = now() + TimeDelta::minutes(31);
        assert!(!lobby.is_open(later));
        assert_eq!(lobby.remaining(later), None);
        assert_eq!(lobby.join(player(2), later), Err(LobbyError::Closed));
    }

    #[test]
    fn closed_check_comes_before_kicked() {
        let mut lobby = lobby();
        lobby.kick(UserId::new(1), UserId::new(2)).unwrap();
        lobby.start(UserId::new(1), now()).unwrap();
        assert_eq!(lobby.join(player(2), now()), Err(LobbyError::Closed));
    }

    #[test]
    fn leave_rules() {
        let mut lobby = lobby();
        assert_eq!(lobby.leave(UserId::new(3)), Err(LobbyError::NotInLobby));

        lobby.join(player(2), now()).unwrap();
        lobby.join(player(3), now()).unwrap();
        assert_eq!(lobby.leave(UserId::new(2)), Ok(player(2)));
        assert_eq!(ids(&lobby), vec![1, 3]);
    }

    #[test]
    fn only_host_can_kick_and_not_themselves() {
        let mut lobby = lobby();
        lobby.join(player(2), now()).unwrap();

        assert_eq!(
            lobby.kick(UserId::new(2), UserId::new(1)),
            Err(LobbyError::HostOnly(HostAction::Kick))
        );
        assert_eq!(
            lobby.kick(UserId::new(1), UserId::new(1)),
            Err(LobbyError::SelfKick)
        );
        assert_eq!(ids(&lobby), vec![1, 2]);
        assert!(!lobby.is_kicked(UserId::new(1)));
    }

    #[test]
    fn start_is_host_only_and_closes() {
        let mut lobby = lobby();
        lobby.join(player(2), now()).unwrap();

        assert_eq!(
            lobby.start(UserId::new(2), now()),
            Err(LobbyError::HostOnly(HostAction::Start))
        );
        assert!(lobby.is_open(now()));

        let start = now() + TimeDelta::minutes(5);
        lobby.start(UserId::new(1), start).unwrap();
        assert_eq!(lobby.ends(), start);
        assert!(!lobby.is_open(start));
        assert_eq!(lobby.start(UserId::new(1), start), Err(LobbyError::Closed));
    }

    #[test]
    fn delete_is_host_only() {
        let mut lobby = lobby();
        assert_eq!(
            lobby.delete(UserId::new(2), now()),
            Err(LobbyError::HostOnly(HostAction::Delete))
        );
        lobby.delete(UserId::new(1), now()).unwrap();
        assert!(!lobby.is_open(now()));
    }

    #[test]
    fn timeout_close_never_extends_the_deadline() {
        let mut lobby = lobby();
        let late = now() + TimeDelta::hours(1);
        lobby.close(late);
        assert_eq!(lobby.ends(), now() + TimeDelta::minutes(30));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            LobbyError::HostOnly(HostAction::PickCaptains).to_string(),
            "Only the host can pick captains."
        );
    }
}
