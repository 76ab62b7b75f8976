/*
This crate is part of the riparian lakes analysis toolset.
License: MIT
*/

//! Console logging, plus an optional timestamped plain-text log file when a
//! log directory is supplied.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::errors::AnalysisError;

pub fn init(level: &str, log_dir: Option<&str>) -> Result<(), AnalysisError> {
    let filter = match level {
        "DEBUG" => LevelFilter::DEBUG,
        "INFO" => LevelFilter::INFO,
        "WARNING" => LevelFilter::WARN,
        "ERROR" => LevelFilter::ERROR,
        other => {
            return Err(AnalysisError::Input(format!(
                "invalid log level '{}'",
                other
            )))
        }
    };
    let console = fmt::layer().with_target(false);
    match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
            let path = Path::new(dir).join(format!("{}_riparian_analysis.log", stamp));
            let file = File::create(path)?;
            tracing_subscriber::registry()
                .with(console)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry().with(console).with(filter).init();
        }
    }
    Ok(())
}
