//! Generic get-by-id command handler

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::Result;
use crate::output::{json, table};
use crate::swapi::SwapiService;

/// Run a get command: one entity, printed as JSON or as a FIELD/VALUE table.
pub async fn run_get_command<E, D, F, Fut>(opts: &GlobalOptions, operation: F) -> Result<()>
where
    E: Serialize,
    D: Tabled + for<'a> From<&'a E>,
    F: FnOnce(Arc<SwapiService>) -> Fut,
    Fut: Future<Output = Result<E>>,
{
    let ctx = CommandContext::new(opts)?;
    let entity = operation(ctx.service.clone()).await?;

    let output = match ctx.format {
        OutputFormat::Json => {
            json::format_json_with_counters(&entity, ctx.service.last_counters())?
        }
        OutputFormat::Table => table::format_record(&D::from(&entity)),
    };
    println!("{}", output);

    Ok(())
}
