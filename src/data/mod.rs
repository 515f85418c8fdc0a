//! This module contains everything relating to [Data].

use std::collections::HashSet;

use chrono::TimeDelta;
use serenity::ChannelId;
use serenity::UserId;
use tokio::sync::Mutex;

use crate::lib::lobby::LobbyKind;
use crate::lib::registry::LobbyRegistry;
use crate::lib::temp_voice::TempVoiceRef;
use crate::serenity;

/// The data kept between shards
#[derive(Debug, Default)]
pub struct Data {
    /// List of users to send bug notifications
    pub notify_list: HashSet<UserId>,
    /// Tunables read from the config file.
    pub settings: Settings,
    /// Open 10-man lobbies by host.
    pub ten_man_lobbies: Mutex<LobbyRegistry>,
    /// Open bingo lobbies by host.
    pub bingo_lobbies: Mutex<LobbyRegistry>,
    /// Temporary voice channels, shared with the sweep task.
    pub temp_voice: TempVoiceRef,
}

impl Data {
    /// The registry holding lobbies of `kind`.
    pub fn lobbies(&self, kind: LobbyKind) -> &Mutex<LobbyRegistry> {
        match kind {
            LobbyKind::TenMan => &self.ten_man_lobbies,
            LobbyKind::Bingo => &self.bingo_lobbies,
        }
    }
}

/// Runtime tunables, copied out of [Config](crate::Config) on startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ten_man_minutes: i64,
    pub bingo_minutes: i64,
    pub draft_timeout_secs: u64,
    pub scroller_timeout_secs: u64,
    /// Category new temporary channels are put in.
    pub temp_voice_category: Option<ChannelId>,
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Settings {
    /// How long a lobby of `kind` accepts players.
    pub fn lobby_window(&self, kind: LobbyKind) -> TimeDelta {
        let minutes = match kind {
            LobbyKind::TenMan => self.ten_man_minutes,
            LobbyKind::Bingo => self.bingo_minutes,
        };
        TimeDelta::try_minutes(minutes).unwrap_or(TimeDelta::MAX)
    }

    /// How long a temporary channel may stay empty.
    pub fn idle_timeout(&self) -> TimeDelta {
        i64::try_from(self.idle_timeout_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ten_man_minutes: 30,
            bingo_minutes: 10,
            draft_timeout_secs: 60,
            scroller_timeout_secs: 180,
            temp_voice_category: None,
            idle_timeout_secs: 300,
            sweep_interval_secs: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lobby_windows_per_kind() {
        let settings = Settings::default();
        assert_eq!(
            settings.lobby_window(LobbyKind::TenMan),
            TimeDelta::minutes(30)
        );
        assert_eq!(
            settings.lobby_window(LobbyKind::Bingo),
            TimeDelta::minutes(10)
        );
        assert_eq!(settings.idle_timeout(), TimeDelta::minutes(5));
    }

    #[tokio::test]
    async fn registries_are_separate_per_kind() {
        let data = Data::default();
        assert!(std::ptr::eq(
            data.lobbies(LobbyKind::TenMan),
            &data.ten_man_lobbies
        ));
        assert!(std::ptr::eq(
            data.lobbies(LobbyKind::Bingo),
            &data.bingo_lobbies
        ));
        assert!(data.lobbies(LobbyKind::Bingo).lock().await.is_empty());
    }

    #[test]
    fn out_of_range_durations_saturate() {
        let settings = Settings {
            ten_man_minutes: i64::MAX,
            idle_timeout_secs: u64::MAX,
            ..Settings::default()
        };
        assert_eq!(settings.lobby_window(LobbyKind::TenMan), TimeDelta::MAX);
        assert_eq!(settings.idle_timeout(), TimeDelta::MAX);
    }
}
