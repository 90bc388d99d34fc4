/*
 * siak_track, keeping an eye on SIAK NG scores
 * Copyright (C) 2023 Rendy Arya Kemal
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use failure::Fail;
use log::info;
use reqwest::Url;
use serde_derive::{Serialize, Deserialize};

use crate::scores::summary::TokenStyle;

pub type ConfigResult<T> = Result<T, ConfigError>;

// A week, longer periods are almost surely a unit mistake
const MAX_POLL_INTERVAL: u64 = 7 * 24 * 60 * 60;
const MAX_REFRESH_INTERVAL: i64 = 7 * 24 * 60;

#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub username: String,
    pub password: String,

    pub base_url: String,
    pub semester: u32, // 1-based position of the semester in the history listing

    pub poll_interval: u64, // In seconds
    pub refresh_interval: i64, // In minutes, forced re-login period
    pub retry_delay: u64, // In seconds, wait after a failed cycle
    pub max_attempts: u32,

    pub ca_certificate: Option<String>, // PEM trust anchor for the portal
    pub state_file: Option<String>, // Last-run summaries, kept in memory only when unset

    pub notify_new_courses: bool,
    pub token_style: TokenStyle,

    pub notifier: NotifierConfig
}

#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NotifierConfig {
    pub kind: NotifierKind,
    pub webhook_url: Option<String>,
    pub mention: Option<String> // User ID pinged by the webhook
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    Webhook,
    Desktop,
    None
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            username: "".to_string(),
            password: "".to_string(),

            base_url: "https://academic.ui.ac.id".to_string(),
            semester: 1,

            poll_interval: 300,
            refresh_interval: 30,
            retry_delay: 5,
            max_attempts: 5,

            ca_certificate: Some("ui-ac-id.pem".to_string()),
            state_file: Some("last.json".to_string()),

            notify_new_courses: true,
            token_style: TokenStyle::Title,

            notifier: NotifierConfig::default()
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        NotifierConfig {
            kind: NotifierKind::Webhook,
            webhook_url: Some("https://discord.com/api/webhooks/your_webhook".to_string()),
            mention: Some("your_discord_user_id".to_string())
        }
    }
}

impl TrackerConfig {
    /// `siak_track <username> <password>` overrides the configured credentials
    pub fn apply_args(&mut self, args: &[String]) -> ConfigResult<()> {
        match args {
            [] => Ok(()),
            [username, password] => {
                self.username = username.clone();
                self.password = password.clone();

                Ok(())
            },
            _ => Err(ConfigError::InvalidArguments { count: args.len() })
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(ConfigError::InvalidValue { field: "username/password", reason: "credentials are required".into() });
        }

        if self.semester == 0 {
            return Err(ConfigError::InvalidValue { field: "semester", reason: "semesters are counted from 1".into() });
        }

        match Url::parse(&self.base_url) {
            Ok(url) if url.path() == "/" && url.query().is_none() => {},
            Ok(_) => return Err(ConfigError::InvalidValue {
                field: "base_url", reason: "must be the portal origin only, without a path".into()
            }),
            Err(e) => return Err(ConfigError::InvalidValue { field: "base_url", reason: e.to_string() })
        }

        if self.poll_interval == 0 || self.poll_interval > MAX_POLL_INTERVAL {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval", reason: format!("must be between 1 and {} seconds", MAX_POLL_INTERVAL)
            });
        }

        if self.refresh_interval <= 0 || self.refresh_interval > MAX_REFRESH_INTERVAL {
            return Err(ConfigError::InvalidValue {
                field: "refresh_interval", reason: format!("must be between 1 and {} minutes", MAX_REFRESH_INTERVAL)
            });
        }

        Ok(())
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::minutes(self.refresh_interval)
    }
}

pub fn config_path() -> PathBuf {
    match std::env::var("SIAK_TRACK_CONFIG") {
        Ok(c) => PathBuf::from(c),
        Err(_) => PathBuf::from("./siak_track.toml")
    }
}

/// Reads the config, or writes a default one and reports it with `ConfigError::Created`
pub fn load(path: &Path) -> ConfigResult<TrackerConfig> {
    let display = path.display().to_string();

    if !path.exists() {
        let content = toml::to_string(&TrackerConfig::default())
            .map_err(|e| ConfigError::SerializeError { error: e })?;

        fs::write(path, content)
            .map_err(|e| ConfigError::IOError { path: display.clone(), error: e })?;

        return Err(ConfigError::Created { path: display });
    }

    info!("Reading config from '{}'", display);

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::IOError { path: display.clone(), error: e })?;

    toml::from_str(&content)
        .map_err(|e| ConfigError::SyntaxError { path: display, error: e })
}

#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "Configuration file at '{}' did not exist, a default one was created : fill it before restarting", path)]
    Created {
        path: String
    },

    #[fail(display = "Can't access the config file '{}', check the permissions of its folder : {}", path, error)]
    IOError {
        path: String,
        error: std::io::Error
    },

    #[fail(display = "Error while deserializing '{}', there is probably a syntax error in it : {}", path, error)]
    SyntaxError {
        path: String,
        error: toml::de::Error
    },

    #[fail(display = "Failed serializing the default config : {}", error)]
    SerializeError {
        error: toml::ser::Error
    },

    #[fail(display = "Invalid '{}' in config : {}", field, reason)]
    InvalidValue {
        field: &'static str,
        reason: String
    },

    #[fail(display = "Expected no arguments or '<username> <password>', got {} arguments", count)]
    InvalidArguments {
        count: usize
    }
}
