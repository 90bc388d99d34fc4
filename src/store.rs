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
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use failure::Fail;
use log::info;

pub type StoreResult<T> = Result<T, StoreError>;

/// Summary of each course as of the last successful poll, the change detection baseline
pub struct LastRun {
    path: Option<PathBuf>,
    summaries: BTreeMap<String, String>
}

impl LastRun {
    /// Forgotten when the process ends
    pub fn in_memory() -> Self {
        LastRun {
            path: None,
            summaries: BTreeMap::new()
        }
    }

    /// Backed by a JSON file, missing file means an empty baseline
    pub fn load(path: &Path) -> StoreResult<Self> {
        let summaries: BTreeMap<String, String> = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| StoreError::IOError { path: path.display().to_string(), error: e })?;

            serde_json::from_str(&content)
                .map_err(|e| StoreError::FormatError { path: path.display().to_string(), error: e })?
        } else {
            BTreeMap::new()
        };

        info!("Loaded {} last-run summaries from '{}'", summaries.len(), path.display());

        Ok(LastRun {
            path: Some(path.to_path_buf()),
            summaries
        })
    }

    pub fn get(&self, course: &str) -> Option<&str> {
        self.summaries.get(course).map(String::as_str)
    }

    pub fn record(&mut self, course: &str, summary: &str) {
        self.summaries.insert(course.to_string(), summary.to_string());
    }

    pub fn save(&self) -> StoreResult<()> {
        let path = match &self.path {
            Some(p) => p,
            None => return Ok(())
        };

        let content = serde_json::to_string(&self.summaries)
            .map_err(|e| StoreError::FormatError { path: path.display().to_string(), error: e })?;

        fs::write(path, content)
            .map_err(|e| StoreError::IOError { path: path.display().to_string(), error: e })
    }
}

#[derive(Debug, Fail)]
pub enum StoreError {
    #[fail(display = "Can't access last-run file '{}' : {}", path, error)]
    IOError {
        path: String,
        error: std::io::Error
    },

    #[fail(display = "Last-run file '{}' is not a JSON object of strings : {}", path, error)]
    FormatError {
        path: String,
        error: serde_json::Error
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::LastRun;

    #[test]
    fn missing_file_is_an_empty_baseline() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let last_run = LastRun::load(&path).unwrap();

        assert_eq!(last_run.get("Kalkulus 1"), None);
        assert!(!path.exists());
    }

    #[test]
    fn saved_summaries_come_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("last.json");

        let mut last_run = LastRun::load(&path).unwrap();
        last_run.record("Kalkulus 1", "85 | A");
        last_run.record("Fisika Dasar", "Belum Ada");
        last_run.save().unwrap();

        let reloaded = LastRun::load(&path).unwrap();
        assert_eq!(reloaded.get("Kalkulus 1"), Some("85 | A"));
        assert_eq!(reloaded.get("Fisika Dasar"), Some("Belum Ada"));
    }

    #[test]
    fn file_is_a_plain_json_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.json");
        fs::write(&path, r#"{"Kalkulus 1": "85 | A"}"#).unwrap();

        let last_run = LastRun::load(&path).unwrap();
        assert_eq!(last_run.get("Kalkulus 1"), Some("85 | A"));
    }

    #[test]
    fn garbage_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(LastRun::load(&path).is_err());
    }

    #[test]
    fn unwritable_location_is_an_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no_such_folder").join("last.json");

        let last_run = LastRun::load(&path).unwrap();

        assert!(last_run.save().is_err());
    }

    #[test]
    fn memory_store_saves_nowhere() {
        let mut last_run = LastRun::in_memory();
        last_run.record("Kalkulus 1", "85 | A");

        assert!(last_run.save().is_ok());
    }
}
