//! Global CLI options shared across all commands

use crate::cli::{Cli, OutputFormat};

/// Global CLI options passed to all command handlers.
///
/// Precedence is CLI flag > environment variable > config file > default.
/// This struct captures the CLI/env layer; config file values are merged in
/// `CommandContext`.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    /// Output format (table, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.holocron/config.yaml)
    pub config: Option<String>,

    /// Upstream API root override
    pub api_url: Option<String>,

    /// Image URL root override
    pub app_url: Option<String>,

    /// Skip the raw response cache for this invocation
    pub no_cache: bool,

    /// Use the in-process store instead of sqlite
    pub memory: bool,
}

impl GlobalOptions {
    /// Called once in main.rs after parsing.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            api_url: cli.api_url.clone(),
            app_url: cli.app_url.clone(),
            no_cache: cli.no_cache,
            memory: cli.memory,
        }
    }

    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    pub fn api_url_ref(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    pub fn app_url_ref(&self) -> Option<&str> {
        self.app_url.as_deref()
    }
}
