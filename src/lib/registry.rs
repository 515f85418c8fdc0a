//! Active lobbies of one kind, keyed by host.

use std::collections::HashMap;

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;
use delegate::delegate;
use serenity::UserId;

use super::lobby::Lobby;
use super::lobby::LobbyError;
use super::lobby::Player;
use crate::serenity;

/// Lobbies are inserted on creation and removed when they start, are deleted
/// or time out.
#[derive(Debug, Default)]
pub struct LobbyRegistry {
    #[allow(clippy::missing_docs_in_private_items)]
    lobbies: HashMap<UserId, Lobby>,
}

impl LobbyRegistry {
    /// Register a new lobby hosted by `host`.
    ///
    /// An expired lobby left behind by the same host is replaced.
    pub fn create(
        &mut self,
        host: Player,
        now: DateTime<Utc>,
        window: TimeDelta,
    ) -> Result<&Lobby, LobbyError> {
        if let Some(existing) = self.lobbies.get(&host.id) {
            if existing.is_open(now) {
                return Err(LobbyError::AlreadyHosting);
            }
            tracing::debug!("Pruning expired lobby of {}.", host.name);
            self.lobbies.remove(&host.id);
        }

        let in_other_lobby = self
            .lobbies
            .values()
            .any(|lobby| lobby.is_open(now) && lobby.contains(host.id));
        if in_other_lobby {
            return Err(LobbyError::AlreadyInAnotherLobby);
        }

        let id = host.id;
        let lobby = self
            .lobbies
            .entry(id)
            .or_insert(Lobby::new(host, now, window));
        Ok(lobby)
    }

    delegate! {
        to self.lobbies {
            /// The lobby hosted by `host`.
            pub fn get(&self, host: &UserId) -> Option<&Lobby>;
            /// The lobby hosted by `host`, mutably.
            pub fn get_mut(&mut self, host: &UserId) -> Option<&mut Lobby>;
            /// Forget the lobby hosted by `host`.
            pub fn remove(&mut self, host: &UserId) -> Option<Lobby>;
            /// Number of tracked lobbies.
            pub fn len(&self) -> usize;
            /// No lobbies tracked?
            pub fn is_empty(&self) -> bool;
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

    fn window() -> TimeDelta {
        TimeDelta::minutes(10)
    }

    #[test]
    fn one_open_lobby_per_host() {
        let mut registry = LobbyRegistry::default();
        registry.create(player(1), now(), window()).unwrap();

        let again = registry.create(player(1), now(), window());
        assert_eq!(again.err(), Some(LobbyError::AlreadyHosting));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn expired_lobby_is_replaced() {
        let mut registry = LobbyRegistry::default();
        registry.create(player(1), now(), window()).unwrap();

        let later = now() + TimeDelta::minutes(11);
        let lobby = registry.create(player(1), later, window()).unwrap();
        assert_eq!(lobby.ends(), later + window());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn players_of_open_lobbies_cannot_host() {
        let mut registry = LobbyRegistry::default();
        registry.create(player(1), now(), window()).unwrap();
        registry
            .get_mut(&UserId::new(1))
            .unwrap()
            .join(player(2), now())
            .unwrap();

        let attempt = registry.create(player(2), now(), window());
        assert_eq!(attempt.err(), Some(LobbyError::AlreadyInAnotherLobby));

        // Once the other lobby has closed, hosting is fine again.
        let later = now() + TimeDelta::minutes(11);
        assert!(registry.create(player(2), later, window()).is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn removal_on_terminal_transition() {
        let mut registry = LobbyRegistry::default();
        registry.create(player(1), now(), window()).unwrap();
        let removed = registry.remove(&UserId::new(1)).unwrap();
        assert_eq!(removed.host(), &player(1));
        assert!(registry.is_empty());
        assert!(registry.get(&UserId::new(1)).is_none());
    }
}
