//! Init command implementation

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::config::Config;
use crate::error::{Error, Result};

/// Write a default config file, seeded with any `--api-url`/`--app-url` given
pub fn run(opts: &GlobalOptions, force: bool) -> Result<()> {
    let path = Config::resolve_path(opts.config_ref())?;

    if path.exists() && !force {
        return Err(Error::Other(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let mut config = Config::default();
    if let Some(url) = opts.api_url_ref() {
        config.api_base_url = url.to_string();
    }
    if let Some(url) = opts.app_url_ref() {
        config.app_url = url.to_string();
    }
    let config = config.normalized()?;

    config.save_to(&path)?;

    println!("{} Wrote {}", "✓".green(), path.display().to_string().cyan());
    println!("  API: {}", config.api_base_url);
    Ok(())
}
