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
use std::time::Duration as StdDuration;

use chrono::{DateTime, Local};
use failure::Fail;
use log::{info, warn, error};

use crate::config::TrackerConfig;
use crate::display;
use crate::notify::Notifier;
use crate::portal::{PortalSession, SessionError, Transport};
use crate::scores::{self, ExtractError};
use crate::scores::summary::{self, CourseSummary};
use crate::store::{LastRun, StoreError};

pub type CycleResult<T> = Result<T, CycleError>;

pub struct CycleReport {
    pub summaries: Vec<CourseSummary>,
    pub modified: Vec<String>,
    pub fetched_at: DateTime<Local>
}

/// Drives the polling: one cycle at a time, sleeping in between
pub struct Tracker<'a, T: Transport> {
    config: &'a TrackerConfig,
    session: PortalSession<T>,
    notifier: Notifier,
    last_run: LastRun
}

impl<'a, T: Transport> Tracker<'a, T> {
    pub fn new(config: &'a TrackerConfig, session: PortalSession<T>, notifier: Notifier, last_run: LastRun) -> Self {
        Tracker {
            config,
            session,
            notifier,
            last_run
        }
    }

    /// Never returns, a failed cycle is retried after `retry_delay`
    pub async fn run(&mut self) {
        info!(
            "Tracking semester {} every {} seconds (forced re-login every {} minutes)",
            self.config.semester,
            self.config.poll_interval,
            self.config.refresh_interval
        );

        loop {
            match self.cycle().await {
                Ok(report) => {
                    display::show(&report.summaries, &report.modified, report.fetched_at, self.config.poll_interval);
                    actix_rt::time::sleep(StdDuration::from_secs(self.config.poll_interval)).await;
                },
                Err(e) => {
                    error!("Failed to fetch scores : {}", e);

                    if e.is_protocol() {
                        error!("SIAK answered with something unexpected, its pages may have changed");
                    }

                    self.session.invalidate();

                    warn!("Retrying in {}s", self.config.retry_delay);
                    actix_rt::time::sleep(StdDuration::from_secs(self.config.retry_delay)).await;
                }
            }
        }
    }

    pub async fn cycle(&mut self) -> CycleResult<CycleReport> {
        if self.session.refresh_if_stale(self.config.refresh_period()).await? {
            info!("Session refreshed ({} logins so far)", self.session.login_count());
        }

        let snapshot = scores::fetch_snapshot(&mut self.session, self.config.semester).await?;
        let summaries = summary::render(&snapshot, self.config.token_style);
        let modified = summary::detect_changes(&summaries, &mut self.last_run, self.config.notify_new_courses);

        if !modified.is_empty() {
            info!("{} courses changed : {}", modified.len(), modified.join(", "));

            if let Err(e) = self.notifier.notify(&modified, &summaries).await {
                error!("Failed to send the notification : {}", e);
            }
        }

        self.last_run.save()?;

        Ok(CycleReport {
            summaries,
            modified,
            fetched_at: Local::now()
        })
    }
}

#[derive(Debug, Fail)]
pub enum CycleError {
    #[fail(display = "{}", error)]
    SessionError {
        error: SessionError
    },

    #[fail(display = "{}", error)]
    ExtractError {
        error: ExtractError
    },

    #[fail(display = "{}", error)]
    StoreError {
        error: StoreError
    }
}

impl CycleError {
    pub fn is_protocol(&self) -> bool {
        match self {
            CycleError::SessionError { error: SessionError::ProtocolError { .. } } => true,
            CycleError::ExtractError { error } => error.is_protocol(),
            _ => false
        }
    }
}

from_error!(SessionError, CycleError, CycleError::SessionError);
from_error!(ExtractError, CycleError, CycleError::ExtractError);
from_error!(StoreError, CycleError, CycleError::StoreError);

#[cfg(test)]
mod tests {
    use crate::config::{NotifierConfig, NotifierKind, TrackerConfig};
    use crate::notify::Notifier;
    use crate::portal::testing::FakePortal;
    use crate::portal::{Credentials, PortalSession, HISTORY_PATH};
    use crate::store::LastRun;
    use super::Tracker;

    fn listing(index: &str) -> String {
        format!(r#"
            <table class="box">
                <tr><th colspan="8">Term 1</th></tr>
                <tr><td>1</td><td>CS1</td><td>2020</td><td><a href="ScoreDetail/1">Kalkulus 1</a></td><td>3</td><td>Lulus</td><td>85.00</td><td>{}</td></tr>
                <tr><td>2</td><td>CS2</td><td>2020</td><td><a href="ScoreDetail/2">Fisika Dasar</a></td><td>3</td><td>-</td><td>-</td><td>belum ada</td></tr>
            </table>
        "#, index)
    }

    const DETAIL: &str = r#"<table class="box"><tr><th>Component</th><th>Weight</th><th>Score</th></tr></table>"#;

    fn config(notify_new_courses: bool) -> TrackerConfig {
        TrackerConfig {
            username: "student".into(),
            password: "secret".into(),
            notify_new_courses,
            state_file: None,
            notifier: NotifierConfig { kind: NotifierKind::None, webhook_url: None, mention: None },
            ..TrackerConfig::default()
        }
    }

    fn portal() -> FakePortal {
        let portal = FakePortal::new("student", "secret");
        portal.page(HISTORY_PATH, &listing("A"));
        portal.page("/main/Academic/ScoreDetail/1", DETAIL);
        portal.page("/main/Academic/ScoreDetail/2", DETAIL);
        portal
    }

    fn tracker<'a>(config: &'a TrackerConfig, portal: &FakePortal) -> Tracker<'a, FakePortal> {
        let session = PortalSession::new(portal.clone(), &config.base_url, Credentials::new("student", "secret"), 5);
        let notifier = Notifier::from_config(&config.notifier).unwrap();

        Tracker::new(config, session, notifier, LastRun::in_memory())
    }

    #[actix_rt::test]
    async fn changes_are_reported_once() {
        let config = config(true);
        let portal = portal();
        let mut tracker = tracker(&config, &portal);

        let first = tracker.cycle().await.unwrap();
        assert_eq!(first.modified, vec!["Kalkulus 1".to_string(), "Fisika Dasar".to_string()]);

        let second = tracker.cycle().await.unwrap();
        assert!(second.modified.is_empty());

        portal.page(HISTORY_PATH, &listing("A-"));
        let third = tracker.cycle().await.unwrap();
        assert_eq!(third.modified, vec!["Kalkulus 1".to_string()]);
        assert_eq!(third.summaries[0].summary, "A-");
    }

    #[actix_rt::test]
    async fn first_cycle_can_seed_silently() {
        let config = config(false);
        let portal = portal();
        let mut tracker = tracker(&config, &portal);

        assert!(tracker.cycle().await.unwrap().modified.is_empty());
    }

    #[actix_rt::test]
    async fn session_is_reused_between_cycles() {
        let config = config(true);
        let portal = portal();
        let mut tracker = tracker(&config, &portal);

        tracker.cycle().await.unwrap();
        tracker.cycle().await.unwrap();

        assert_eq!(portal.login_posts(), 1);
    }

    #[actix_rt::test]
    async fn layout_change_is_a_protocol_error() {
        let config = config(true);
        let portal = portal();
        portal.page(HISTORY_PATH, "<p>Under maintenance</p>");
        let mut tracker = tracker(&config, &portal);

        let error = tracker.cycle().await.err().unwrap();

        assert!(error.is_protocol());
    }

    #[actix_rt::test]
    async fn rejected_login_fails_the_cycle() {
        let config = config(true);
        let portal = FakePortal::new("student", "another-secret");
        let mut tracker = tracker(&config, &portal);

        let error = tracker.cycle().await.err().unwrap();

        assert!(!error.is_protocol());
        assert!(error.to_string().contains("rejected"));
    }
}
