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
use failure::Fail;
use log::info;

use crate::config::{NotifierConfig, NotifierKind};
use crate::scores::summary::CourseSummary;

mod desktop;
mod webhook;

pub type NotifyResult<T> = Result<T, NotifyError>;

pub const TITLE: &str = "SIAK Score Modified";

pub enum Notifier {
    Webhook {
        http: reqwest::Client,
        url: String,
        mention: Option<String>
    },
    Desktop,
    Silent
}

impl Notifier {
    pub fn from_config(config: &NotifierConfig) -> NotifyResult<Self> {
        Ok(match config.kind {
            NotifierKind::Webhook => {
                let url = config.webhook_url.clone()
                    .filter(|u| !u.trim().is_empty())
                    .ok_or(NotifyError::MissingWebhook)?;

                Notifier::Webhook {
                    http: reqwest::Client::new(),
                    url,
                    mention: config.mention.clone().filter(|m| !m.trim().is_empty())
                }
            },
            NotifierKind::Desktop => Notifier::Desktop,
            NotifierKind::None => Notifier::Silent
        })
    }

    /// Sends one notification for the whole cycle
    pub async fn notify(&self, modified: &[String], summaries: &[CourseSummary]) -> NotifyResult<()> {
        match self {
            Notifier::Webhook { http, url, mention } => {
                let payload = webhook::payload(mention.as_deref(), modified, summaries);
                webhook::send(http, url, &payload).await?;
            },
            Notifier::Desktop => desktop::show(TITLE, &desktop::body(modified))?,
            Notifier::Silent => {}
        }

        info!("Notified score changes of : {}", modified.join(", "));

        Ok(())
    }
}

#[derive(Debug, Fail)]
pub enum NotifyError {
    #[fail(display = "Webhook notifier needs a 'webhook_url'")]
    MissingWebhook,

    #[fail(display = "HTTP error while calling the webhook : {}", error)]
    HttpError {
        error: reqwest::Error
    },

    #[fail(display = "Webhook answered with status {}", status)]
    RemoteError {
        status: reqwest::StatusCode
    },

    #[fail(display = "Can't run '{}' : {}", command, error)]
    CommandError {
        command: String,
        error: std::io::Error
    },

    #[fail(display = "'{}' exited with {}", command, status)]
    CommandFailed {
        command: String,
        status: String
    }
}

from_error!(reqwest::Error, NotifyError, NotifyError::HttpError);

#[cfg(test)]
mod tests {
    use crate::config::{NotifierConfig, NotifierKind};
    use super::{Notifier, NotifyError};

    fn config(kind: NotifierKind, url: Option<&str>) -> NotifierConfig {
        NotifierConfig {
            kind,
            webhook_url: url.map(String::from),
            mention: Some("1234".into())
        }
    }

    #[test]
    fn webhook_needs_an_url() {
        match Notifier::from_config(&config(NotifierKind::Webhook, Some("  "))) {
            Err(NotifyError::MissingWebhook) => {},
            _ => panic!("expected a missing webhook error")
        }
    }

    #[test]
    fn kinds_map_to_notifiers() {
        match Notifier::from_config(&config(NotifierKind::Webhook, Some("https://discord.test/hook"))).unwrap() {
            Notifier::Webhook { url, mention, .. } => {
                assert_eq!(url, "https://discord.test/hook");
                assert_eq!(mention.as_deref(), Some("1234"));
            },
            _ => panic!("expected a webhook notifier")
        }

        assert!(matches!(Notifier::from_config(&config(NotifierKind::Desktop, None)).unwrap(), Notifier::Desktop));
        assert!(matches!(Notifier::from_config(&config(NotifierKind::None, None)).unwrap(), Notifier::Silent));
    }

    #[actix_rt::test]
    async fn silent_notifier_always_succeeds() {
        let notifier = Notifier::from_config(&config(NotifierKind::None, None)).unwrap();

        assert!(notifier.notify(&["Kalkulus 1".to_string()], &[]).await.is_ok());
    }
}
