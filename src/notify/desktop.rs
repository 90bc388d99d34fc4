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
use std::process::Command;

use super::{NotifyError, NotifyResult};

pub fn body(modified: &[String]) -> String {
    modified.join("\n")
}

#[cfg(target_os = "macos")]
fn command(title: &str, body: &str) -> Command {
    let script = format!(
        "display notification {:?} with title {:?}",
        body.replace('\n', ", "),
        title
    );

    let mut command = Command::new("osascript");
    command.arg("-e").arg(script);
    command
}

#[cfg(not(target_os = "macos"))]
fn command(title: &str, body: &str) -> Command {
    let mut command = Command::new("notify-send");
    command.arg("--app-name=siak_track").arg(title).arg(body);
    command
}

pub fn show(title: &str, body: &str) -> NotifyResult<()> {
    let mut command = command(title, body);
    let program = command.get_program().to_string_lossy().to_string();

    let status = command.status()
        .map_err(|e| NotifyError::CommandError { command: program.clone(), error: e })?;

    if !status.success() {
        return Err(NotifyError::CommandFailed { command: program, status: status.to_string() });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::body;

    #[test]
    fn body_lists_one_course_per_line() {
        assert_eq!(body(&["Kalkulus 1".to_string(), "Fisika Dasar".to_string()]), "Kalkulus 1\nFisika Dasar");
    }
}
