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
use reqwest::{Method, StatusCode};

mod cookies;
mod session;
mod transport;

#[cfg(test)]
pub mod testing;

pub use session::{Credentials, PortalSession};
pub use transport::{HttpTransport, Transport};

pub type SessionResult<T> = Result<T, SessionError>;

pub const HISTORY_PATH: &str = "/main/Academic/HistoryByTerm";

#[derive(Clone, Debug)]
pub struct PortalRequest {
    pub method: Method,
    pub path: String,
    pub form: Option<Vec<(String, String)>>
}

impl PortalRequest {
    pub fn new(method: Method, path: &str, form: Option<&[(&str, &str)]>) -> Self {
        PortalRequest {
            method,
            path: path.to_string(),
            form: form.map(|pairs| pairs.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect())
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path, None)
    }
}

#[derive(Clone, Debug)]
pub struct PortalResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookies: Vec<String>,
    pub body: String
}

#[derive(Debug, Fail)]
pub enum SessionError {
    #[fail(display = "SIAK rejected the login attempt : {}", reason)]
    AuthenticationFailed {
        reason: String
    },

    #[fail(display = "SIAK request failed after {} attempts, last error : {}", attempts, last)]
    RequestFailed {
        attempts: u32,
        last: String
    },

    #[fail(display = "SIAK answered in an unexpected way : {}", detail)]
    ProtocolError {
        detail: String
    }
}
