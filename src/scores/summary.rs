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
use serde_derive::{Serialize, Deserialize};

use crate::store::LastRun;
use crate::utils::{title_case, initials};

use super::{CourseScores, Snapshot};

const SEPARATOR: &str = " | ";

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStyle {
    Title,
    Initials
}

#[derive(Clone, Debug, PartialEq)]
pub struct CourseSummary {
    pub course: String,
    pub summary: String
}

/// Display token of a component, built from its score (second value, or the only one)
pub fn token(values: &[String], style: TokenStyle) -> String {
    let value = match values.get(1).or_else(|| values.last()) {
        Some(v) => v.trim(),
        None => return String::new()
    };

    if value.contains('.') {
        let integer = value.split('.').next().unwrap_or_default();
        return format!("{:>2}", integer);
    }

    match style {
        TokenStyle::Title => title_case(value),
        TokenStyle::Initials => initials(value)
    }
}

pub fn summarize(course: &CourseScores, style: TokenStyle) -> String {
    course.components.iter()
        .map(|c| token(&c.values, style))
        .collect::<Vec<String>>()
        .join(SEPARATOR)
}

pub fn render(snapshot: &Snapshot, style: TokenStyle) -> Vec<CourseSummary> {
    snapshot.courses.iter()
        .map(|course| CourseSummary {
            course: course.name.clone(),
            summary: summarize(course, style)
        })
        .collect()
}

/// Names of the courses whose summary moved since the last run, in listing order. The
/// last run is updated with the new summaries. A course never seen before only counts
/// when `notify_new_courses` is set.
pub fn detect_changes(summaries: &[CourseSummary], last_run: &mut LastRun, notify_new_courses: bool) -> Vec<String> {
    let mut modified = Vec::new();

    for s in summaries {
        let changed = match last_run.get(&s.course) {
            Some(previous) => previous != s.summary,
            None => notify_new_courses
        };

        if changed {
            modified.push(s.course.clone());
        }

        last_run.record(&s.course, &s.summary);
    }

    modified
}
