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
use std::path::Path;

use futures::future::{self, Either};
use log::{info, error};
use fern::colors::{ColoredLevelConfig, Color};

const VERSION: &str = "0.1.0";

#[macro_use]
mod macros;

mod utils;

mod config;
mod display;
mod notify;
mod portal;
mod scores;
mod store;
mod tracker;

use config::{ConfigError, TrackerConfig};
use notify::Notifier;
use portal::{Credentials, HttpTransport, PortalSession};
use store::LastRun;
use tracker::Tracker;
use utils::is_env_enable;

#[actix_rt::main]
async fn main() {
    let is_debug = is_env_enable("SIAK_TRACK_DEBUG");

    if let Err(e) = setup_logger(is_debug) {
        eprintln!("Couldn't initialize logger : {}", e);
        return;
    }

    info!("siak_track v{}", VERSION);
    info!("---------------------------------------------------");

    let config = match load_config() {
        Ok(c) => c,
        Err(ConfigError::Created { path }) => {
            info!("Created a default configuration at '{}', fill it before restarting", path);
            return;
        },
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let transport = match HttpTransport::new(config.ca_certificate.as_deref().map(Path::new)) {
        Ok(t) => t,
        Err(e) => {
            error!("Error while setting up the HTTP client : {}", e);
            std::process::exit(1);
        }
    };

    let notifier = match Notifier::from_config(&config.notifier) {
        Ok(n) => n,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let last_run = match &config.state_file {
        Some(path) => match LastRun::load(Path::new(path)) {
            Ok(l) => l,
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        None => LastRun::in_memory()
    };

    let session = PortalSession::new(
        transport,
        &config.base_url,
        Credentials::new(&config.username, &config.password),
        config.max_attempts
    );

    let mut tracker = Tracker::new(&config, session, notifier, last_run);

    let tracking = tracker.run();
    let interrupted = actix_rt::signal::ctrl_c();
    futures::pin_mut!(tracking, interrupted);

    if let Either::Right((Err(e), _)) = future::select(tracking, interrupted).await {
        error!("Couldn't listen for interruptions : {}", e);
    }

    println!("Exited by request");
}

fn load_config() -> Result<TrackerConfig, ConfigError> {
    let mut config = config::load(&config::config_path())?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    config.apply_args(&args)?;
    config.validate()?;

    Ok(config)
}

// Column the messages start at, wide enough for "siak_track::portal::session"
const TARGET_WIDTH: usize = 28;

fn timestamp() -> chrono::format::DelayedFormat<chrono::format::StrftimeItems<'static>> {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
}

// Tracker modules lose their crate prefix, dependencies keep their full target
fn short_target(target: &str) -> &str {
    target.strip_prefix("siak_track::").unwrap_or(target)
}

/// Logs to stderr, colored, so the score table on stdout stays clean, and to
/// `siak_track.log` in plain text.
fn setup_logger(debug: bool) -> Result<(), fern::InitError> {
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red)
        .debug(Color::Cyan);

    let terminal = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} {:>5} {:>width$} > {}",
                timestamp(),
                colors.color(record.level()),
                short_target(record.target()),
                message,
                width = TARGET_WIDTH
            ))
        })
        .chain(std::io::stderr());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{:<5}] {:<width$} | {}",
                timestamp(),
                record.level(),
                record.target(),
                message,
                width = TARGET_WIDTH
            ))
        })
        .chain(fern::log_file("siak_track.log")?);

    let (default_level, tracker_level) = if debug {
        (log::LevelFilter::Info, log::LevelFilter::Trace)
    } else {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    };

    fern::Dispatch::new()
        .level(default_level)
        .level_for("siak_track", tracker_level)
        // Parsing the portal pages is noisy below errors
        .level_for("html5ever", log::LevelFilter::Error)
        .level_for("selectors", log::LevelFilter::Error)
        .chain(file)
        .chain(terminal)
        .apply()?;

    Ok(())
}
