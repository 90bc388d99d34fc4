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
use log::{info, warn};
use reqwest::Method;

use crate::portal::{PortalSession, SessionError, Transport, HISTORY_PATH};

mod extract;
pub mod summary;

use extract::{parse_components, parse_listing};

pub type ExtractResult<T> = Result<T, ExtractError>;

pub const FINAL_COMPONENT: &str = "final";

#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub name: String,
    pub values: Vec<String> // Usually [weight, score]
}

#[derive(Clone, Debug, PartialEq)]
pub struct CourseScores {
    pub name: String,
    pub components: Vec<Component> // "final" always comes last
}

/// Every tracked course of the semester, in listing order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub courses: Vec<CourseScores>
}

impl Snapshot {
    pub fn get(&self, name: &str) -> Option<&CourseScores> {
        self.courses.iter().find(|c| c.name == name)
    }
}

pub async fn fetch_snapshot<T: Transport>(session: &mut PortalSession<T>, semester: u32) -> ExtractResult<Snapshot> {
    let rows = {
        let listing_url = session.url(HISTORY_PATH)?;
        let (_, listing) = session.request(Method::GET, HISTORY_PATH, None).await?;
        parse_listing(&listing, semester, &listing_url)?
    };

    info!("Found {} courses in semester {}", rows.len(), semester);

    let mut snapshot = Snapshot::default();
    for row in rows {
        if snapshot.get(&row.name).is_some() {
            warn!("Course '{}' is listed twice, keeping the first one", row.name);
            continue;
        }

        let mut components = {
            let (_, detail) = session.request(Method::GET, &row.detail_path, None).await?;
            parse_components(&detail)?
        };

        components.push(Component {
            name: FINAL_COMPONENT.to_string(),
            values: vec![row.final_score, row.final_index]
        });

        snapshot.courses.push(CourseScores {
            name: row.name,
            components
        });
    }

    Ok(snapshot)
}

#[derive(Debug, Fail)]
pub enum ExtractError {
    #[fail(display = "{}", error)]
    SessionError {
        error: SessionError
    },

    #[fail(display = "Unexpected '{}' page layout : {}", page, detail)]
    StructureError {
        page: &'static str,
        detail: String
    }
}

impl ExtractError {
    /// True when retrying won't help: the portal most likely changed its pages
    pub fn is_protocol(&self) -> bool {
        match self {
            ExtractError::SessionError { error: SessionError::ProtocolError { .. } } => true,
            ExtractError::StructureError { .. } => true,
            _ => false
        }
    }
}

from_error!(SessionError, ExtractError, ExtractError::SessionError);
