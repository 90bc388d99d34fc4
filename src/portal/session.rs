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
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use log::{info, warn, debug};
use reqwest::{Method, Url};
use scraper::Html;

use super::cookies::CookieJar;
use super::transport::Transport;
use super::{PortalRequest, PortalResponse, SessionError, SessionResult};

const AUTH_PATH: &str = "/main/Authentication/Index";
const CHANGE_ROLE_PATH: &str = "/main/Authentication/ChangeRole";

// Any redirect whose target contains this is the portal asking us to log in again
const AUTH_MARKER: &str = "Authentication";
const LOGIN_FAILED_MARKER: &str = "Login Failed";
const SESSION_COOKIE: &str = "siakng_cc";

// Expiry signals tolerated during a single request before giving up
const MAX_RELOGINS: usize = 2;

pub struct Credentials {
    username: String,
    password: String
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Credentials {
            username: username.to_string(),
            password: password.to_string()
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<hidden>")
            .finish()
    }
}

enum Reply {
    Page,
    Expired,
    Redirect(String)
}

/// The single authenticated session against SIAK. Owns the credentials and the cookie jar,
/// nothing else reads or writes them.
pub struct PortalSession<T: Transport> {
    transport: T,
    base_url: String,
    credentials: Credentials,
    cookies: CookieJar,
    logged_at: Option<DateTime<Utc>>,
    logins: usize,
    max_attempts: u32
}

impl<T: Transport> PortalSession<T> {
    pub fn new(transport: T, base_url: &str, credentials: Credentials, max_attempts: u32) -> Self {
        PortalSession {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
            cookies: CookieJar::new(),
            logged_at: None,
            logins: 0,
            max_attempts: max_attempts.max(1)
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.logged_at.is_some()
    }

    /// Successful logins since creation
    pub fn login_count(&self) -> usize {
        self.logins
    }

    /// Absolute portal URL of `path`
    pub fn url(&self, path: &str) -> SessionResult<Url> {
        Url::parse(&format!("{}{}", self.base_url, path)).map_err(|e| SessionError::ProtocolError {
            detail: format!("'{}' is not a valid portal path ({})", path, e)
        })
    }

    /// Sends a request through the session, logging in first if needed.
    ///
    /// An expiry redirect never reaches the caller: the session logs in again and replays
    /// the request. Transport errors and unexpected statuses are retried until the attempt
    /// budget runs out, re-logins don't count against it.
    pub async fn request(
        &mut self,
        method: Method,
        path: &str,
        form: Option<&[(&str, &str)]>
    ) -> SessionResult<(PortalResponse, Html)> {
        if !self.is_authenticated() {
            self.login().await?;
        }

        let request = PortalRequest::new(method, path, form);
        let mut remaining = self.max_attempts;
        let mut relogins = 0;

        loop {
            let response = self.exchange(&request, &mut remaining).await?;

            match classify(&response) {
                Reply::Page => {
                    let document = Html::parse_document(&response.body);
                    return Ok((response, document));
                },
                Reply::Expired => {
                    if relogins == MAX_RELOGINS {
                        return Err(SessionError::ProtocolError {
                            detail: format!("'{}' still asks for a login after {} fresh logins", path, relogins)
                        });
                    }

                    relogins += 1;
                    info!("Session expired while requesting '{}', logging in again", path);

                    self.invalidate();
                    self.login().await?;
                },
                Reply::Redirect(target) => {
                    return Err(SessionError::ProtocolError {
                        detail: format!("'{}' redirected to unknown target '{}'", path, target)
                    });
                }
            }
        }
    }

    /// Posts the credentials then selects the student role, both must succeed
    pub async fn login(&mut self) -> SessionResult<()> {
        info!("Logging in to SIAK as '{}'", self.credentials.username);

        self.logged_at = None;

        let form = [
            ("u", self.credentials.username.as_str()),
            ("p", self.credentials.password.as_str())
        ];
        let request = PortalRequest::new(Method::POST, AUTH_PATH, Some(&form[..]));
        let auth_url = self.url(AUTH_PATH)?;
        let mut remaining = self.max_attempts;

        let response = self.exchange(&request, &mut remaining).await?;

        if let Reply::Expired = classify(&response) {
            return Err(SessionError::AuthenticationFailed {
                reason: "the portal sent the login form back".into()
            });
        }

        if response.body.contains(LOGIN_FAILED_MARKER) {
            return Err(SessionError::AuthenticationFailed {
                reason: "credentials were rejected".into()
            });
        }

        if !self.cookies.contains(SESSION_COOKIE, &auth_url) {
            return Err(SessionError::AuthenticationFailed {
                reason: format!("no '{}' cookie was set", SESSION_COOKIE)
            });
        }

        let role = self.exchange(&PortalRequest::get(CHANGE_ROLE_PATH), &mut remaining).await?;

        if let Reply::Expired = classify(&role) {
            return Err(SessionError::AuthenticationFailed {
                reason: "role selection refused the new session".into()
            });
        }

        self.logged_at = Some(Utc::now());
        self.logins += 1;

        info!("Logged in to SIAK as '{}'", self.credentials.username);

        Ok(())
    }

    /// Starts over with a fresh login when the current one is older than `max_age`, even if
    /// SIAK would still accept it. Returns whether a login happened.
    pub async fn refresh_if_stale(&mut self, max_age: Duration) -> SessionResult<bool> {
        let stale = match self.logged_at {
            Some(at) => Utc::now() - at > max_age,
            None => true
        };

        if !stale {
            return Ok(false);
        }

        debug!("Session is stale, refreshing it");

        self.invalidate();
        self.login().await?;

        Ok(true)
    }

    pub fn invalidate(&mut self) {
        self.cookies.clear();
        self.logged_at = None;
    }

    // Returns the first 2xx or 3xx response, consuming one attempt per failure
    async fn exchange(&mut self, request: &PortalRequest, remaining: &mut u32) -> SessionResult<PortalResponse> {
        let url = self.url(&request.path)?;

        loop {
            let cookie = self.cookies.header(&url);
            let result = self.transport.send(url.as_str(), request, cookie.as_deref()).await;

            let failure = match result {
                Ok(response) => {
                    self.cookies.absorb(&url, &response.set_cookies);

                    if response.status.is_success() || response.status.is_redirection() {
                        return Ok(response);
                    }

                    format!("unexpected status {}", response.status)
                },
                Err(e) => e.to_string()
            };

            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                return Err(SessionError::RequestFailed {
                    attempts: self.max_attempts,
                    last: failure
                });
            }

            warn!("{} '{}' failed ({}), {} attempts left", request.method, request.path, failure, remaining);
        }
    }
}

fn classify(response: &PortalResponse) -> Reply {
    if !response.status.is_redirection() {
        return Reply::Page;
    }

    match &response.location {
        Some(target) if target.contains(AUTH_MARKER) => Reply::Expired,
        Some(target) => Reply::Redirect(target.clone()),
        None => Reply::Redirect(String::new())
    }
}
