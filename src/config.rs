//! Server configuration from environment variables.

use std::path::PathBuf;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Directory holding the record store.
    pub data_dir: PathBuf,
    /// Development mode relaxes logging defaults.
    pub dev_mode: bool,
}

impl Config {
    /// Build a config from the environment:
    /// - `TASKHUB_PORT` (default 3000)
    /// - `TASKHUB_DATA_DIR` (default `./data`)
    /// - `DEV_MODE` (default false)
    pub fn from_env() -> Self {
        let port = std::env::var("TASKHUB_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let data_dir = std::env::var("TASKHUB_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        let dev_mode = std::env::var("DEV_MODE")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        Self {
            port,
            data_dir,
            dev_mode,
        }
    }
}
