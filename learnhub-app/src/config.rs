//! Runtime configuration, read from the environment and overridden by CLI
//! flags. Every setting has a default so the app runs with no configuration.

use crate::cli::opts::Cli;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Env: `LEARNHUB_HTTP_ADDR`. Default `127.0.0.1:8080`.
    pub http_addr: SocketAddr,

    /// SQLite database file. When unset the built-in mock database is used.
    /// Env: `LEARNHUB_DATABASE`
    pub database: Option<PathBuf>,

    /// Session ledger file (paid courses, certificates).
    /// Env: `LEARNHUB_STATE_FILE`. Default: platform data dir.
    pub state_file: Option<PathBuf>,

    /// Base URL of a remote LearnHub backend; takes precedence over
    /// `database`. Env: `LEARNHUB_REMOTE`
    pub remote: Option<String>,

    /// Deadline before a slow provider call is reported to the user. The call
    /// keeps running. Env: `LEARNHUB_TIMEOUT_MS`. Default 3000.
    pub timeout: Duration,

    /// Name printed on certificates. Env: `LEARNHUB_STUDENT`
    pub student_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: ([127, 0, 0, 1], 8080).into(),
            database: None,
            state_file: None,
            remote: None,
            timeout: Duration::from_millis(3_000),
            student_name: "LearnHub Student".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = get("LEARNHUB_HTTP_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(parsed) => config.http_addr = parsed,
                Err(_) => tracing::warn!(value = %addr, "invalid LEARNHUB_HTTP_ADDR, using default"),
            }
        }

        if let Some(path) = get("LEARNHUB_DATABASE").filter(|s| !s.is_empty()) {
            config.database = Some(PathBuf::from(path));
        }

        if let Some(path) = get("LEARNHUB_STATE_FILE").filter(|s| !s.is_empty()) {
            config.state_file = Some(PathBuf::from(path));
        }

        if let Some(url) = get("LEARNHUB_REMOTE").filter(|s| !s.is_empty()) {
            config.remote = Some(url.trim_end_matches('/').to_string());
        }

        if let Some(ms) = get("LEARNHUB_TIMEOUT_MS") {
            match ms.parse::<u64>() {
                Ok(n) if n > 0 => config.timeout = Duration::from_millis(n),
                _ => tracing::warn!(value = %ms, "invalid LEARNHUB_TIMEOUT_MS, using default"),
            }
        }

        if let Some(name) = get("LEARNHUB_STUDENT").filter(|s| !s.trim().is_empty()) {
            config.student_name = name;
        }

        config
    }

    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(p) = &cli.db_path {
            self.database = Some(p.clone());
        }
        if let Some(p) = &cli.state_file {
            self.state_file = Some(p.clone());
        }
        if let Some(url) = &cli.remote {
            self.remote = Some(url.trim_end_matches('/').to_string());
        }
        if let Some(ms) = cli.timeout_ms {
            self.timeout = Duration::from_millis(ms.max(1));
        }
        if let Some(name) = &cli.student {
            self.student_name = name.clone();
        }
        self
    }
}
