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
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use failure::Fail;
use log::debug;
use reqwest::{Certificate, Client as HttpClient, tls};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;

use super::{PortalRequest, PortalResponse};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/97.0.4692.71 Safari/537.36";

// SIAK slows to a crawl around grade publication, past this an attempt is given up
const TIMEOUT_SECS: u64 = 30;

/// Executes a single exchange with the portal. Redirects are never followed and cookies
/// are never stored here, both are the session's business.
#[async_trait(?Send)]
pub trait Transport {
    async fn send(&self, url: &str, request: &PortalRequest, cookie: Option<&str>) -> Result<PortalResponse, TransportError>;
}

pub struct HttpTransport {
    http: HttpClient
}

impl HttpTransport {
    /// SIAK still runs a legacy TLS setup: TLS 1.3 is disabled here and its certificate
    /// chain may need an explicit trust anchor. The cipher security level it requires
    /// (OpenSSL `DEFAULT@SECLEVEL=1`) has to come from the system OpenSSL configuration.
    /// All of this weakens transport security and is only done for compatibility.
    pub fn new(ca_certificate: Option<&Path>) -> Result<Self, TransportError> {
        let mut builder = HttpClient::builder()
            .redirect(Policy::none())
            .default_headers(default_headers())
            .user_agent(USER_AGENT)
            .max_tls_version(tls::Version::TLS_1_2)
            .timeout(Duration::from_secs(TIMEOUT_SECS));

        if let Some(path) = ca_certificate {
            let pem = fs::read(path)
                .map_err(|e| TransportError::CertificateError { path: path.display().to_string(), error: e })?;

            builder = builder.add_root_certificate(Certificate::from_pem(&pem)?);
        }

        Ok(HttpTransport {
            http: builder.build()?
        })
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn send(&self, url: &str, request: &PortalRequest, cookie: Option<&str>) -> Result<PortalResponse, TransportError> {
        let mut builder = self.http.request(request.method.clone(), url);

        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let response = builder.send().await.map_err(request_error)?;
        let status = response.status();

        let location = response.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let set_cookies = response.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();

        let body = response.text().await.map_err(request_error)?;

        debug!("{} {} -> {} ({} bytes)", request.method, request.path, status, body.len());

        Ok(PortalResponse {
            status,
            location,
            set_cookies,
            body
        })
    }
}

fn request_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::TimedOut { seconds: TIMEOUT_SECS }
    } else {
        TransportError::HttpError { error }
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(header::ACCEPT, HeaderValue::from_static(
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
    ));
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    headers
}

#[derive(Debug, Fail)]
pub enum TransportError {
    #[fail(display = "HTTP error while requesting SIAK : {}", error)]
    HttpError {
        error: reqwest::Error
    },

    #[fail(display = "Can't read trust anchor at '{}' : {}", path, error)]
    CertificateError {
        path: String,
        error: std::io::Error
    },

    #[fail(display = "SIAK did not answer within {} seconds", seconds)]
    TimedOut {
        seconds: u64
    }
}

from_error!(reqwest::Error, TransportError, TransportError::HttpError);
