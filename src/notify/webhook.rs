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
use serde_json::{json, Value};

use crate::scores::summary::CourseSummary;

use super::{NotifyError, NotifyResult, TITLE};

/// Discord-style embed: the mention as content, the changed courses then the whole score
/// table in a code block as description
pub fn payload(mention: Option<&str>, modified: &[String], summaries: &[CourseSummary]) -> Value {
    let table = summaries.iter()
        .map(|s| format!("{}: {}", s.course, s.summary))
        .collect::<Vec<String>>()
        .join("\n");

    json!({
        "content": mention.map(|m| format!("<@{}>", m)).unwrap_or_default(),
        "embeds": [
            {
                "title": TITLE,
                "description": format!("Score changed: {}\n```{}```", modified.join(", "), table)
            }
        ]
    })
}

pub async fn send(http: &reqwest::Client, url: &str, payload: &Value) -> NotifyResult<()> {
    let response = http.post(url)
        .json(payload)
        .send().await?;

    if !response.status().is_success() {
        return Err(NotifyError::RemoteError { status: response.status() });
    }

    Ok(())
}
