//! Temporary voice channels.
//!
//! Channels created by the bot are tracked from creation until a background
//! sweep deletes them after they have stayed empty for a while.
//! - When the last member leaves, the channel is marked empty.
//! - When someone joins again, the mark is cleared.
//! - Channels marked empty for longer than the idle timeout are deleted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use chrono::TimeDelta;
use chrono::Utc;
use delegate::delegate;
use serenity::ChannelId;
use serenity::ChannelType;
use serenity::CreateChannel;
use serenity::GuildChannel;
use serenity::GuildId;
use serenity::Http;
use serenity::UserId;
use serenity::VoiceState;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::serenity;
use crate::Data;

/// Shown when Discord refuses to create a channel.
pub const CREATE_FAILED: &str = "I don't have access to create a voice channel.";

/// Convenience type alias, the registry is shared with the sweep task.
pub type TempVoiceRef = Arc<Mutex<TempVoiceRegistry>>;

/// Bookkeeping for one temporary channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempChannel {
    /// When the bot created the channel.
    pub created: DateTime<Utc>,
    /// When the channel was last seen empty, `None` while occupied.
    pub empty_since: Option<DateTime<Utc>>,
}

/// All temporary channels the bot is responsible for.
#[derive(Debug, Default)]
pub struct TempVoiceRegistry {
    #[allow(clippy::missing_docs_in_private_items)]
    channels: HashMap<ChannelId, TempChannel>,
}

impl TempVoiceRegistry {
    /// Start tracking a freshly created channel.
    ///
    /// New channels count as empty, so one nobody ever joins is still swept.
    pub fn insert(&mut self, channel: ChannelId, now: DateTime<Utc>) {
        self.channels.insert(
            channel,
            TempChannel {
                created: now,
                empty_since: Some(now),
            },
        );
    }

    /// Record how many members `channel` has after a voice state change.
    /// Returns `false` for channels that aren't tracked.
    pub fn occupancy_changed(
        &mut self,
        channel: ChannelId,
        members: usize,
        now: DateTime<Utc>,
    ) -> bool {
        let Some(entry) = self.channels.get_mut(&channel) else {
            return false;
        };

        if members == 0 {
            // Keep the first time it went empty.
            entry.empty_since.get_or_insert(now);
        } else {
            entry.empty_since = None;
        }
        true
    }

    /// Channels that have been empty for at least `idle`.
    pub fn expired(&self, now: DateTime<Utc>, idle: TimeDelta) -> Vec<ChannelId> {
        self.channels
            .iter()
            .filter(|(_, entry)| entry.empty_since.is_some_and(|since| now - since >= idle))
            .map(|(channel, _)| *channel)
            .collect()
    }

    delegate! {
        to self.channels {
            /// Is `channel` a temporary channel?
            pub fn contains_key(&self, channel: &ChannelId) -> bool;
            /// Bookkeeping of `channel`.
            pub fn get(&self, channel: &ChannelId) -> Option<&TempChannel>;
            /// Stop tracking `channel`.
            pub fn remove(&mut self, channel: &ChannelId) -> Option<TempChannel>;
            /// Number of tracked channels.
            pub fn len(&self) -> usize;
            /// Nothing tracked?
            pub fn is_empty(&self) -> bool;
        }
    }
}

/// Create a voice channel in `guild` and register it as temporary.
#[instrument(skip(http, registry))]
pub async fn create(
    http: &Http,
    registry: &TempVoiceRef,
    guild: GuildId,
    name: &str,
    user_limit: u32,
    category: Option<ChannelId>,
    reason: &str,
) -> Result<GuildChannel, serenity::Error> {
    let mut builder = CreateChannel::new(name)
        .kind(ChannelType::Voice)
        .user_limit(user_limit)
        .audit_log_reason(reason);
    if let Some(category) = category {
        builder = builder.category(category);
    }

    let channel = guild.create_channel(http, builder).await?;
    registry.lock().await.insert(channel.id, Utc::now());
    tracing::info!("Created temporary voice channel {} in {guild}.", channel.name);

    Ok(channel)
}

/// Move `members` into `channel`, returning the ones that couldn't be moved.
///
/// Members not connected to voice, or that the bot lacks permission to move,
/// fail. Failures are logged and not retried.
pub async fn move_members(
    http: &Http,
    guild: GuildId,
    channel: ChannelId,
    members: &[UserId],
) -> Vec<UserId> {
    let mut failed = Vec::new();
    for &member in members {
        if let Err(e) = guild.move_member(http, member, channel).await {
            tracing::warn!("Failed to move {member} to temporary voice channel {channel}. {e}");
            failed.push(member);
        }
    }
    failed
}

/// Update the registry for the channels touched by a voice state change.
pub async fn on_voice_state_update(
    ctx: &serenity::Context,
    data: &Data,
    old: Option<&VoiceState>,
    new: &VoiceState,
) {
    let Some(guild_id) = new.guild_id else {
        return;
    };

    let channels = [old.and_then(|vs| vs.channel_id), new.channel_id];

    // Count members first, the cache reference can't be held across an await.
    let counts: Vec<(ChannelId, usize)> = {
        let Some(guild) = ctx.cache.guild(guild_id) else {
            return;
        };
        channels
            .into_iter()
            .flatten()
            .map(|channel| {
                let members = guild
                    .voice_states
                    .values()
                    .filter(|vs| vs.channel_id == Some(channel))
                    .count();
                (channel, members)
            })
            .collect()
    };

    let now = Utc::now();
    let mut registry = data.temp_voice.lock().await;
    for (channel, members) in counts {
        if registry.occupancy_changed(channel, members, now) && members == 0 {
            tracing::info!("Temporary voice channel {channel} has no members, it will be deleted once idle.");
        }
    }
}

/// Spawn the task that deletes idle temporary channels every `interval`.
pub fn spawn_sweeper(
    http: Arc<Http>,
    registry: TempVoiceRef,
    interval: Duration,
    idle: TimeDelta,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            sweep(&http, &registry, idle).await;
        }
    })
}

/// Delete every channel idle for at least `idle`.
///
/// Channels are forgotten whether or not deleting them succeeded.
#[instrument(level = "debug", skip_all)]
pub async fn sweep(http: &Http, registry: &TempVoiceRef, idle: TimeDelta) {
    let expired = {
        let registry = registry.lock().await;
        registry.expired(Utc::now(), idle)
    };

    for channel in expired {
        match channel.delete(http).await {
            Ok(_) => tracing::info!("Deleted temporary voice channel {channel}."),
            Err(e) if is_not_found(&e) => {
                tracing::info!("Temporary voice channel {channel} was already deleted.")
            }
            Err(e) => tracing::error!("Failed to delete temporary voice channel {channel}. {e}"),
        }
        registry.lock().await.remove(&channel);
    }
}

/// Did Discord answer with 404?
fn is_not_found(error: &serenity::Error) -> bool {
    matches!(
        error,
        serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn idle() -> TimeDelta {
        TimeDelta::minutes(5)
    }

    const CHANNEL: ChannelId = ChannelId::new(10);

    #[test]
    fn untracked_channels_are_ignored() {
        let mut registry = TempVoiceRegistry::default();
        assert!(!registry.occupancy_changed(CHANNEL, 0, now()));
        assert!(registry.is_empty());
        assert!(registry.expired(now(), idle()).is_empty());
    }

    #[test]
    fn unjoined_channels_expire() {
        let mut registry = TempVoiceRegistry::default();
        registry.insert(CHANNEL, now());
        assert!(registry.contains_key(&CHANNEL));
        assert!(registry.expired(now(), idle()).is_empty());
        assert_eq!(
            registry.expired(now() + TimeDelta::hours(1), idle()),
            vec![CHANNEL]
        );
    }

    #[test]
    fn occupied_channels_are_kept() {
        let mut registry = TempVoiceRegistry::default();
        registry.insert(CHANNEL, now());
        assert!(registry.occupancy_changed(CHANNEL, 1, now()));
        assert!(registry
            .expired(now() + TimeDelta::hours(1), idle())
            .is_empty());
    }

    #[test]
    fn empty_channel_expires_after_idle_timeout() {
        let mut registry = TempVoiceRegistry::default();
        registry.insert(CHANNEL, now());
        registry.occupancy_changed(CHANNEL, 3, now());
        assert!(registry.occupancy_changed(CHANNEL, 0, now()));

        assert!(registry
            .expired(now() + TimeDelta::minutes(4), idle())
            .is_empty());
        assert_eq!(
            registry.expired(now() + TimeDelta::minutes(5), idle()),
            vec![CHANNEL]
        );
    }

    #[test]
    fn rejoining_clears_the_empty_mark() {
        let mut registry = TempVoiceRegistry::default();
        registry.insert(CHANNEL, now());
        registry.occupancy_changed(CHANNEL, 0, now());
        registry.occupancy_changed(CHANNEL, 2, now() + TimeDelta::minutes(1));

        assert_eq!(registry.get(&CHANNEL).unwrap().empty_since, None);
        assert!(registry
            .expired(now() + TimeDelta::minutes(10), idle())
            .is_empty());
    }

    #[test]
    fn repeated_empty_updates_keep_the_first_timestamp() {
        let mut registry = TempVoiceRegistry::default();
        registry.insert(CHANNEL, now() - TimeDelta::minutes(1));
        registry.occupancy_changed(CHANNEL, 1, now() - TimeDelta::minutes(1));
        registry.occupancy_changed(CHANNEL, 0, now());
        registry.occupancy_changed(CHANNEL, 0, now() + TimeDelta::minutes(3));

        assert_eq!(registry.get(&CHANNEL).unwrap().empty_since, Some(now()));
    }

    #[test]
    fn removed_channels_are_forgotten() {
        let mut registry = TempVoiceRegistry::default();
        registry.insert(CHANNEL, now());
        assert!(registry.remove(&CHANNEL).is_some());
        assert!(registry.remove(&CHANNEL).is_none());
        assert_eq!(registry.len(), 0);
    }
}
