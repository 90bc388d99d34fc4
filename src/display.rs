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
use chrono::{DateTime, Duration, Local};

use crate::scores::summary::CourseSummary;

const CLEAR_SCREEN: &str = "\x1B[2J\x1B[H";

pub fn render_table(summaries: &[CourseSummary]) -> String {
    let subject_width = summaries.iter()
        .map(|s| s.course.chars().count())
        .chain(std::iter::once("Subject".len()))
        .max()
        .unwrap_or(0);

    let scores_width = summaries.iter()
        .map(|s| s.summary.chars().count())
        .chain(std::iter::once("Scores".len()))
        .max()
        .unwrap_or(0);

    let mut lines = vec![
        format!("{:^width$}", "Scores", width = subject_width + scores_width + 3),
        format!("{:<width$} | {}", "Subject", "Scores", width = subject_width),
        format!("{}-+-{}", "-".repeat(subject_width), "-".repeat(scores_width))
    ];

    for s in summaries {
        lines.push(format!("{:<width$} | {}", s.course, s.summary, width = subject_width));
    }

    lines.join("\n")
}

/// Redraws the terminal after a successful cycle
pub fn show(summaries: &[CourseSummary], modified: &[String], fetched_at: DateTime<Local>, poll_interval: u64) {
    let next = fetched_at + Duration::seconds(poll_interval as i64);

    print!("{}", CLEAR_SCREEN);
    println!("{}", render_table(summaries));
    println!();

    if !modified.is_empty() {
        println!("Changed: {}", modified.join(", "));
    }

    println!("Fetch time: {}", fetched_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Next: {}", next.format("%Y-%m-%d %H:%M:%S"));
    println!("Automatic refresh every {}s", poll_interval);
}
