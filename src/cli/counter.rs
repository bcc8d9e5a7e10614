//! Cumulative fetch counter command

use serde::Serialize;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::Result;
use crate::output::json;

#[derive(Debug, Serialize)]
struct CounterOutput {
    /// `None` until the first request has been counted
    count: Option<u64>,
}

pub async fn run(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let count = ctx.service.get_cumulative_fetch_count().await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", json::format_json(&CounterOutput { count })?),
        OutputFormat::Table => match count {
            Some(n) => println!("{}", n),
            None => println!("No upstream fetches recorded yet"),
        },
    }

    Ok(())
}
