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
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::Url;

/// Session cookies set by the portal, replayed on every following request.
///
/// Expiry, `Path` and `Domain` rules are the ones of reqwest's cookie store, so a cookie the
/// portal deletes with a past `Expires` is gone from the next `Cookie` header.
#[derive(Default, Debug)]
pub struct CookieJar {
    store: Jar
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes in the `Set-Cookie` values of a response to `url`
    pub fn absorb(&self, url: &Url, set_cookies: &[String]) {
        let headers: Vec<HeaderValue> = set_cookies.iter()
            .filter_map(|c| HeaderValue::from_str(c).ok())
            .collect();

        self.store.set_cookies(&mut headers.iter(), url);
    }

    pub fn contains(&self, name: &str, url: &Url) -> bool {
        match self.header(url) {
            Some(header) => header.split("; ").any(|pair| pair.split('=').next() == Some(name)),
            None => false
        }
    }

    /// `Cookie` header to send with a request to `url`
    pub fn header(&self, url: &Url) -> Option<String> {
        self.store.cookies(url)
            .and_then(|value| value.to_str().ok().map(String::from))
    }

    pub fn clear(&mut self) {
        self.store = Jar::default();
    }
}
