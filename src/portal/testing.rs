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
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use super::transport::TransportError;
use super::{PortalRequest, PortalResponse, Transport};

const AUTH_PATH: &str = "/main/Authentication/Index";
const CHANGE_ROLE_PATH: &str = "/main/Authentication/ChangeRole";
const WELCOME_URL: &str = "/main/Welcome/Index";
const LOGIN_URL: &str = "https://academic.ui.ac.id/main/Authentication/";

/// A scripted SIAK: accepts one account, hands out a new session token on each login and
/// only honours the latest one.
#[derive(Clone)]
pub struct FakePortal {
    state: Rc<RefCell<FakeState>>
}

struct FakeState {
    username: String,
    password: String,
    pages: HashMap<String, PortalResponse>,
    failures: HashMap<String, usize>,
    expire: usize,
    token: Option<String>,
    issued: usize,
    withhold_cookie: bool,
    expire_cookie: bool,
    refuse_role: bool,
    sent: Vec<String>,
    login_cookies: Vec<Option<String>>
}

impl FakePortal {
    pub fn new(username: &str, password: &str) -> Self {
        FakePortal {
            state: Rc::new(RefCell::new(FakeState {
                username: username.to_string(),
                password: password.to_string(),
                pages: HashMap::new(),
                failures: HashMap::new(),
                expire: 0,
                token: None,
                issued: 0,
                withhold_cookie: false,
                expire_cookie: false,
                refuse_role: false,
                sent: Vec::new(),
                login_cookies: Vec::new()
            }))
        }
    }

    pub fn page(&self, path: &str, body: &str) {
        self.respond(path, StatusCode::OK, None, body);
    }

    pub fn status(&self, path: &str, status: StatusCode) {
        self.respond(path, status, None, "");
    }

    pub fn redirect(&self, path: &str, target: &str) {
        self.respond(path, StatusCode::FOUND, Some(target), "");
    }

    /// Next `count` requests to `path` fail at the network level
    pub fn fail(&self, path: &str, count: usize) {
        self.state.borrow_mut().failures.insert(path.to_string(), count);
    }

    /// Next `count` data requests find their session expired
    pub fn expire_next(&self, count: usize) {
        self.state.borrow_mut().expire = count;
    }

    pub fn withhold_cookie(&self) {
        self.state.borrow_mut().withhold_cookie = true;
    }

    /// Logins answer with a session cookie that is already expired
    pub fn expire_cookie(&self) {
        self.state.borrow_mut().expire_cookie = true;
    }

    /// Role selection sends every new session back to the login form
    pub fn refuse_role(&self) {
        self.state.borrow_mut().refuse_role = true;
    }

    pub fn sent(&self) -> Vec<String> {
        self.state.borrow().sent.clone()
    }

    pub fn count(&self, line: &str) -> usize {
        self.state.borrow().sent.iter().filter(|s| *s == line).count()
    }

    pub fn login_posts(&self) -> usize {
        self.count(&format!("POST {}", AUTH_PATH))
    }

    /// Cookie header sent along each login attempt
    pub fn login_cookies(&self) -> Vec<Option<String>> {
        self.state.borrow().login_cookies.clone()
    }

    fn respond(&self, path: &str, status: StatusCode, location: Option<&str>, body: &str) {
        self.state.borrow_mut().pages.insert(path.to_string(), response(status, location, Vec::new(), body));
    }
}

fn response(status: StatusCode, location: Option<&str>, set_cookies: Vec<String>, body: &str) -> PortalResponse {
    PortalResponse {
        status,
        location: location.map(String::from),
        set_cookies,
        body: body.to_string()
    }
}

fn login_redirect() -> PortalResponse {
    response(StatusCode::FOUND, Some(LOGIN_URL), Vec::new(), "")
}

fn path_of(url: &str) -> String {
    let url = Url::parse(url).unwrap();

    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string()
    }
}

impl FakeState {
    fn authorized(&self, cookie: Option<&str>) -> bool {
        match (&self.token, cookie) {
            (Some(token), Some(cookie)) => cookie.split("; ").any(|c| c == format!("siakng_cc={}", token)),
            _ => false
        }
    }

    fn login(&mut self, request: &PortalRequest, cookie: Option<&str>) -> PortalResponse {
        self.login_cookies.push(cookie.map(String::from));

        let form = request.form.clone().unwrap_or_default();
        let field = |name: &str| form.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_default();

        if field("u") != self.username || field("p") != self.password {
            return response(StatusCode::OK, None, Vec::new(), "<div class=\"error\">Login Failed</div>");
        }

        self.issued += 1;
        let token = format!("token-{}", self.issued);

        let mut cookies = vec![format!("Mojavi=m-{}; Path=/", self.issued)];
        if self.expire_cookie {
            cookies.push("siakng_cc=deleted; expires=Thu, 01 Jan 1970 00:00:01 GMT; path=/".to_string());
        } else if !self.withhold_cookie {
            cookies.push(format!("siakng_cc={}; Path=/; HttpOnly", token));
        }

        self.token = Some(token);

        response(StatusCode::FOUND, Some(WELCOME_URL), cookies, "")
    }
}

#[async_trait(?Send)]
impl Transport for FakePortal {
    async fn send(&self, url: &str, request: &PortalRequest, cookie: Option<&str>) -> Result<PortalResponse, TransportError> {
        let path = path_of(url);
        let mut state = self.state.borrow_mut();

        state.sent.push(format!("{} {}", request.method, path));

        if let Some(left) = state.failures.get_mut(&path) {
            if *left > 0 {
                if *left != usize::MAX {
                    *left -= 1;
                }

                return Err(TransportError::TimedOut { seconds: 30 });
            }
        }

        if path == AUTH_PATH {
            return Ok(state.login(request, cookie));
        }

        if !state.authorized(cookie) {
            return Ok(login_redirect());
        }

        if path == CHANGE_ROLE_PATH {
            if state.refuse_role {
                return Ok(login_redirect());
            }

            return Ok(response(StatusCode::FOUND, Some(WELCOME_URL), Vec::new(), ""));
        }

        if state.expire > 0 {
            state.expire -= 1;
            state.token = None;

            return Ok(login_redirect());
        }

        Ok(match state.pages.get(&path) {
            Some(page) => page.clone(),
            None => response(StatusCode::NOT_FOUND, None, Vec::new(), "Not found")
        })
    }
}
