//! Configuration for running this bot.

use std::collections::HashSet;
use std::fmt::Display;
use std::ops::RangeInclusive;

use poise::Framework;
use serde::Deserialize;
use serde::Serialize;
use serenity::ChannelId;
use serenity::GuildId;
use serenity::UserId;

use crate::data::Settings;
use crate::error::ConfigError;
use crate::serenity;

/// The path to the config file
const CONFIG_PATH: &str = "config.toml";

/// Settings read from [CONFIG_PATH] that modify bot behavior.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Token needed to use a bot account.
    discord_token: String,

    /// See [LoggingConfig]
    logging: LoggingConfig,

    /// Useful developer specific configs.
    dev_utils: DevConfig,

    /// See [LobbyConfig]
    lobbies: LobbyConfig,

    /// See [ScrollerConfig]
    scroller: ScrollerConfig,

    /// See [TempVoiceConfig]
    temp_voice: TempVoiceConfig,
}

impl Config {
    /// Tries to read [CONFIG_PATH] to extract a [Config].
    /// If a file doesn't exists, create the default config file and returns error.
    /// If a file exists but is empty, re-write the default values and return error.
    /// If a file exists but is incomplete, show error and don't change files.
    /// If a file exists and is complete, read file to create a config.
    /// If file existance is indeterminent (e.g. missing permissions), return error.
    pub fn read() -> Result<Config, ConfigError> {
        let file = std::fs::read_to_string(CONFIG_PATH);

        match file {
            // Config file found
            Ok(content) => {
                // Write default values to file if it's empty.
                if content.trim().is_empty() {
                    write_file(Config::default())?;
                    Err(ConfigError::InvalidConfig {
                        reason: format!("Empty config file! Rewriting {CONFIG_PATH} ..."),
                    })
                } else {
                    Config::parse(&content)
                }
            }
            // File not found or other filesystem error
            Err(file_error) => match file_error.kind() {
                // If file doesn't exist, create default config file.
                std::io::ErrorKind::NotFound => {
                    let action = format!("Creating {CONFIG_PATH}...");
                    write_file(Config::default())?;
                    Err(ConfigError::MissingConfig { action_msg: action })
                }
                _ => Err(ConfigError::IoError(file_error)),
            },
        }
    }

    /// Deserialize a config, describing exactly which key is wrong on failure.
    fn parse(content: &str) -> Result<Config, ConfigError> {
        let to_toml = toml::Deserializer::new(content);
        let result: Result<Config, _> = serde_path_to_error::deserialize(to_toml);

        let config = result.map_err(|error| ConfigError::InvalidConfig {
            reason: error.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject durations the bot can't schedule.
    fn validate(&self) -> Result<(), ConfigError> {
        const DAY_MINUTES: i64 = 24 * 60;
        const HOUR_SECS: u64 = 60 * 60;
        const DAY_SECS: u64 = 24 * HOUR_SECS;

        let lobbies = &self.lobbies;
        check("lobbies.ten_man_minutes", lobbies.ten_man_minutes, 1..=DAY_MINUTES)?;
        check("lobbies.bingo_minutes", lobbies.bingo_minutes, 1..=DAY_MINUTES)?;
        check("lobbies.draft_timeout_secs", lobbies.draft_timeout_secs, 1..=HOUR_SECS)?;
        check("scroller.timeout_secs", self.scroller.timeout_secs, 1..=HOUR_SECS)?;

        let voice = &self.temp_voice;
        check("temp_voice.idle_timeout_secs", voice.idle_timeout_secs, 1..=DAY_SECS)?;
        check("temp_voice.sweep_interval_secs", voice.sweep_interval_secs, 1..=HOUR_SECS)
    }

    /// Basic sanity check for if a token was given.
    pub fn token(&self) -> Result<&String, ConfigError> {
        let default_token = Config::default().discord_token;
        let given_token = &self.discord_token;

        let is_empty = given_token.is_empty();
        let contains_default = given_token.contains(&default_token);

        let sanity_check: bool = !is_empty && !contains_default;

        if sanity_check {
            Ok(&self.discord_token)
        } else {
            Err(ConfigError::InvalidConfig {
                reason: "Missing discord token".to_string(),
            })
        }
    }

    /// Construct a bug notification notify list based on the config.
    /// Wrapper for [NotifyConfig::notify_list]
    pub fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        self.dev_utils.notifications.notify_list(&fw.options().owners)
    }

    /// Getter for log_dir.
    pub fn log_dir(&self) -> &str {
        &self.logging.log_dir
    }

    /// Is debug mode enabled for console logs
    pub fn console_debug(&self) -> bool {
        self.logging.console_debug
    }

    /// Is file logging enabled.
    pub fn logs_enabled(&self) -> bool {
        self.logging.logs_enabled
    }

    pub fn dev_guild(&self) -> Option<GuildId> {
        self.dev_utils.dev_guild
    }

    /// The runtime tunables kept in [Data](crate::Data).
    pub fn settings(&self) -> Settings {
        Settings {
            ten_man_minutes: self.lobbies.ten_man_minutes,
            bingo_minutes: self.lobbies.bingo_minutes,
            draft_timeout_secs: self.lobbies.draft_timeout_secs,
            scroller_timeout_secs: self.scroller.timeout_secs,
            temp_voice_category: self.temp_voice.category,
            idle_timeout_secs: self.temp_voice.idle_timeout_secs,
            sweep_interval_secs: self.temp_voice.sweep_interval_secs,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let settings = Settings::default();

        Self {
            discord_token: "put_token_here".to_string(),

            logging: LoggingConfig {
                console_debug: false,
                logs_enabled: true,
                log_dir: "logs".to_string(),
            },

            dev_utils: DevConfig {
                dev_guild: None,
                notifications: NotifyConfig {
                    enabled: false,
                    add_owners: true,
                    userids: vec![],
                },
            },

            lobbies: LobbyConfig {
                ten_man_minutes: settings.ten_man_minutes,
                bingo_minutes: settings.bingo_minutes,
                draft_timeout_secs: settings.draft_timeout_secs,
            },

            scroller: ScrollerConfig {
                timeout_secs: settings.scroller_timeout_secs,
            },

            temp_voice: TempVoiceConfig {
                category: None,
                idle_timeout_secs: settings.idle_timeout_secs,
                sweep_interval_secs: settings.sweep_interval_secs,
            },
        }
    }
}

/// Configs for
#[derive(Debug, Serialize, Deserialize)]
struct LoggingConfig {
    /// Print debug traces to console?
    console_debug: bool,
    /// Enable writing to log file?
    logs_enabled: bool,
    /// Directory to store log files
    log_dir: String,
}

/// Optional configs to enable developer-specific behavior.
#[derive(Debug, Serialize, Deserialize)]
struct DevConfig {
    /// Optional guild to automatically update commands quickly.
    #[serde(serialize_with = "serialize_opt", deserialize_with = "deserialize_opt")]
    dev_guild: Option<GuildId>,
    /// See [NotifyConfig]
    notifications: NotifyConfig,
}

/// Configs for notification behavior when encountering unexpected errors.
#[derive(Debug, Serialize, Deserialize)]
struct NotifyConfig {
    /// Enable this behavior or not. (bot sends a private message)
    enabled: bool,
    /// Whether to automatically add owners to the notify list.
    add_owners: bool,
    /// Additional users to add to the notify list.
    userids: Vec<UserId>,
}

impl NotifyConfig {
    /// Construct a bug notification notify list from the bot `owners` and the config.
    fn notify_list(&self, owners: &HashSet<UserId>) -> HashSet<UserId> {
        let mut notify_list = HashSet::new();

        // If disabled, don't add anyone to the list.
        if !self.enabled {
            return notify_list;
        }

        if self.add_owners {
            notify_list.extend(owners);
        }

        notify_list.extend(&self.userids);

        notify_list
    }
}

/// How long lobbies and drafts stay interactive.
#[derive(Debug, Serialize, Deserialize)]
struct LobbyConfig {
    /// Join window of a 10-man lobby, in minutes.
    ten_man_minutes: i64,
    /// Join window of a bingo lobby, in minutes.
    bingo_minutes: i64,
    /// Inactivity before captain and player pick menus are disabled.
    draft_timeout_secs: u64,
}

/// Paginated list settings.
#[derive(Debug, Serialize, Deserialize)]
struct ScrollerConfig {
    /// Inactivity before the scroll buttons are disabled.
    timeout_secs: u64,
}

/// Temporary voice channel settings.
#[derive(Debug, Serialize, Deserialize)]
struct TempVoiceConfig {
    /// Optional category to create channels in.
    #[serde(serialize_with = "serialize_opt", deserialize_with = "deserialize_opt")]
    category: Option<ChannelId>,
    /// How long a channel may stay empty before it's deleted.
    idle_timeout_secs: u64,
    /// How often to look for idle channels.
    sweep_interval_secs: u64,
}

/// Write the given config to [CONFIG_PATH].
fn write_file(config: Config) -> Result<(), ConfigError> {
    use std::fs::write;

    let content = toml::to_string_pretty(&config).map_err(|e| ConfigError::InvalidConfig {
        reason: format!("Couldn't write the default config. {e}"),
    })?;
    write(CONFIG_PATH, content).map_err(ConfigError::IoError)
}

/// Fails with the offending `key` when `value` is outside `range`.
fn check<T>(key: &str, value: T, range: RangeInclusive<T>) -> Result<(), ConfigError>
where
    T: PartialOrd + Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidConfig {
            reason: format!(
                "{key} = {value} is out of range, expected {} to {}",
                range.start(),
                range.end()
            ),
        })
    }
}

/// Deserialize an optional id, where `""` means `None`.
fn deserialize_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: From<u64>,
{
    deserializer.deserialize_str(OptVisitor(std::marker::PhantomData))
}

fn serialize_opt<T, S>(val: &Option<T>, ser: S) -> Result<S::Ok, S::Error>
where
    T: serde::Serialize,
    S: serde::Serializer,
{
    match val {
        Some(v) => v.serialize(ser),
        None => ser.serialize_str(""),
    }
}

struct OptVisitor<T>(std::marker::PhantomData<T>);

impl<'de, T: From<u64>> serde::de::Visitor<'de> for OptVisitor<T> {
    type Value = Option<T>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a valid discord id")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match v {
            "" => Ok(None),
            _ => {
                let num: u64 = v.parse().map_err(|_| E::custom("not u64"))?;
                if num == 0 {
                    return Err(E::custom("ids can't be 0"));
                }
                Ok(Some(T::from(num)))
            }
        }
    }
}
