//! Status command implementation

use colored::Colorize;

use crate::cli::CommandContext;
use crate::cli::args::GlobalOptions;
use crate::cli::context::sqlite_dir;
use crate::config::{CacheBackend, Config};
use crate::error::Result;

/// Run the status command to display configuration and cache status
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "holocron status".bold());

    let config_path = Config::resolve_path(opts.config_ref())?;
    if config_path.exists() {
        println!("Config file: {}", config_path.display().to_string().cyan());
    } else {
        println!(
            "Config file: {} {}",
            config_path.display().to_string().cyan(),
            "(not found, using defaults)".dimmed()
        );
    }

    let ctx = match CommandContext::new(opts) {
        Ok(ctx) => ctx,
        Err(e) => {
            println!("{} Configuration invalid: {}", "✗".red(), e);
            println!("  → Run 'holocron init --force' to write a fresh one");
            return Ok(());
        }
    };
    let config = &ctx.config;

    println!();
    println!("{} API: {}", "✓".green(), config.api_base_url.cyan());
    println!("{} Images: {}", "✓".green(), config.app_url.cyan());
    println!(
        "{} Concurrency: {} (timeout {}s)",
        "○".dimmed(),
        config.max_concurrent,
        config.request_timeout_secs
    );

    match config.cache.backend {
        CacheBackend::Sqlite => println!(
            "{} Cache: sqlite at {}",
            "✓".green(),
            sqlite_dir(config)?.display()
        ),
        CacheBackend::Memory => println!(
            "{} Cache: in-process ({} entries, nothing persists)",
            "⚠".yellow(),
            config.cache.max_entries
        ),
    }

    match config.cache.response_ttl() {
        Some(ttl) => println!("{} Response cache: {}s", "✓".green(), ttl.as_secs()),
        None => println!("{} Response cache: off", "○".dimmed()),
    }
    if opts.no_cache {
        println!("{} Raw response cache bypassed (--no-cache)", "○".dimmed());
    }

    match ctx.service.get_cumulative_fetch_count().await? {
        Some(count) => println!("{} Upstream fetches so far: {}", "✓".green(), count),
        None => println!("{} No upstream fetches recorded yet", "○".dimmed()),
    }

    println!();
    Ok(())
}
