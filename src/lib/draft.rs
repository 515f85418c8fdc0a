//! Captain draft run after a 10-man lobby starts.
//!
//! Two captains alternate picking players until nobody is left. Then each
//! captain may, once, move their team into a fresh voice channel.

use rand::Rng;
use serenity::UserId;
use thiserror::Error;

use super::lobby::Player;
use crate::serenity;

/// Why a draft action was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    #[error("Pick two different captains from the lobby.")]
    InvalidCaptains,
    #[error("Only captains can pick players.")]
    NotCaptain,
    #[error("It's not your turn yet.")]
    NotYourTurn,
    #[error("That player has already been picked.")]
    Unavailable,
    #[error("Only captains can move their team.")]
    NotCaptainMove,
    #[error("The channel for team {0} has already been created and its players moved!")]
    AlreadyMoved(usize),
}

/// Teams being picked from the players of a lobby.
#[derive(Debug, Clone)]
pub struct Draft {
    /// Players nobody has picked yet, in lobby order.
    available: Vec<Player>,
    /// The captain is the first member of each team.
    teams: [Vec<Player>; 2],
    /// Index of the team picking next.
    turn: usize,
    /// Which teams have already been moved to voice.
    moved: [bool; 2],
}

impl Draft {
    /// Start a draft with `captains` chosen from `players`. The first pick goes
    /// to a random captain.
    pub fn new(
        players: &[Player],
        captains: [UserId; 2],
        rng: &mut impl Rng,
    ) -> Result<Self, DraftError> {
        if captains[0] == captains[1] {
            return Err(DraftError::InvalidCaptains);
        }

        let find = |id: UserId| players.iter().find(|p| p.id == id).cloned();
        let (Some(first), Some(second)) = (find(captains[0]), find(captains[1])) else {
            return Err(DraftError::InvalidCaptains);
        };

        let available = players
            .iter()
            .filter(|p| !captains.contains(&p.id))
            .cloned()
            .collect();

        Ok(Self {
            available,
            teams: [vec![first], vec![second]],
            turn: rng.gen_range(0..2),
            moved: [false, false],
        })
    }

    pub fn available(&self) -> &[Player] {
        &self.available
    }

    pub fn teams(&self) -> &[Vec<Player>; 2] {
        &self.teams
    }

    /// Index of the team whose captain picks next.
    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn captain(&self, team: usize) -> &Player {
        &self.teams[team][0]
    }

    /// The team captained by `user`, if any.
    pub fn team_of_captain(&self, user: UserId) -> Option<usize> {
        (0..2).find(|&team| self.captain(team).id == user)
    }

    /// Every player has been picked.
    pub fn is_complete(&self) -> bool {
        self.available.is_empty()
    }

    /// `actor` picks `target` for their team. Returns the index of that team.
    pub fn pick(&mut self, actor: UserId, target: UserId) -> Result<usize, DraftError> {
        let team = self.team_of_captain(actor).ok_or(DraftError::NotCaptain)?;
        if team != self.turn {
            return Err(DraftError::NotYourTurn);
        }
        let index = self
            .available
            .iter()
            .position(|p| p.id == target)
            .ok_or(DraftError::Unavailable)?;

        let player = self.available.remove(index);
        self.teams[team].push(player);
        self.turn = 1 - team;
        Ok(team)
    }

    /// `actor` claims the voice move for their team. Only works once per team.
    pub fn claim_move(&mut self, actor: UserId) -> Result<usize, DraftError> {
        let team = self
            .team_of_captain(actor)
            .ok_or(DraftError::NotCaptainMove)?;
        if self.moved[team] {
            return Err(DraftError::AlreadyMoved(team + 1));
        }
        self.moved[team] = true;
        Ok(team)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn players(count: u64) -> Vec<Player> {
        (1..=count)
            .map(|id| Player::new(UserId::new(id), format!("player{id}")))
            .collect()
    }

    fn id(id: u64) -> UserId {
        UserId::new(id)
    }

    fn draft(count: u64) -> Draft {
        let mut rng = StdRng::seed_from_u64(7);
        Draft::new(&players(count), [id(1), id(2)], &mut rng).unwrap()
    }

    #[test]
    fn captains_lead_their_teams() {
        let draft = draft(10);
        assert_eq!(draft.captain(0).id, id(1));
        assert_eq!(draft.captain(1).id, id(2));
        assert_eq!(draft.available().len(), 8);
        assert!(draft.turn() < 2);
    }

    #[test]
    fn captains_must_be_distinct_lobby_members() {
        let mut rng = StdRng::seed_from_u64(0);
        let lobby = players(4);
        assert_eq!(
            Draft::new(&lobby, [id(1), id(1)], &mut rng).err(),
            Some(DraftError::InvalidCaptains)
        );
        assert_eq!(
            Draft::new(&lobby, [id(1), id(9)], &mut rng).err(),
            Some(DraftError::InvalidCaptains)
        );
    }

    #[test]
    fn turns_alternate() {
        let mut draft = draft(6);
        let first = draft.turn();
        let first_captain = draft.captain(first).id;
        let second_captain = draft.captain(1 - first).id;

        assert_eq!(draft.pick(second_captain, id(3)), Err(DraftError::NotYourTurn));
        assert_eq!(draft.pick(first_captain, id(3)), Ok(first));
        assert_eq!(draft.turn(), 1 - first);
        assert_eq!(draft.pick(first_captain, id(4)), Err(DraftError::NotYourTurn));
        assert_eq!(draft.pick(second_captain, id(4)), Ok(1 - first));
        assert_eq!(draft.turn(), first);
    }

    #[test]
    fn only_captains_pick_available_players() {
        let mut draft = draft(5);
        let captain = draft.captain(draft.turn()).id;

        assert_eq!(draft.pick(id(3), id(4)), Err(DraftError::NotCaptain));
        assert_eq!(draft.pick(captain, id(2)), Err(DraftError::Unavailable));
        assert_eq!(draft.pick(captain, id(42)), Err(DraftError::Unavailable));
        assert_eq!(draft.available().len(), 3);
    }

    #[test]
    fn draft_completes_when_everyone_is_picked() {
        let mut draft = draft(10);
        while !draft.is_complete() {
            let captain = draft.captain(draft.turn()).id;
            let target = draft.available()[0].id;
            draft.pick(captain, target).unwrap();
        }
        let [first, second] = draft.teams();
        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 5);
    }

    #[test]
    fn two_players_are_complete_immediately() {
        assert!(draft(2).is_complete());
    }

    #[test]
    fn each_team_moves_once() {
        let mut draft = draft(4);
        assert_eq!(draft.claim_move(id(3)), Err(DraftError::NotCaptainMove));
        assert_eq!(draft.claim_move(id(2)), Ok(1));
        assert_eq!(draft.claim_move(id(2)), Err(DraftError::AlreadyMoved(2)));
        assert_eq!(draft.claim_move(id(1)), Ok(0));
    }
}
