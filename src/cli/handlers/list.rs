//! Generic list command handler
//!
//! Every collection list follows the same flow:
//! 1. Create command context
//! 2. Run the service operation
//! 3. Print mapped entities as JSON, or their display rows as a table

use std::future::Future;
use std::sync::Arc;

use log::debug;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::Result;
use crate::output::{json, table};
use crate::swapi::SwapiService;

/// Run a list command with the common fetch → display → print pattern.
///
/// # Type Parameters
///
/// * `E` - The mapped entity returned by the service (e.g. `Person`)
/// * `D` - The table row built from `&E`
///
/// # Example
///
/// ```ignore
/// run_list_command::<Person, PersonDisplay, _, _>(opts, "people", |svc| async move {
///     svc.list_people(search).await
/// })
/// .await
/// ```
pub async fn run_list_command<E, D, F, Fut>(
    opts: &GlobalOptions,
    resource_name: &str,
    operation: F,
) -> Result<()>
where
    E: Serialize,
    D: Tabled + for<'a> From<&'a E>,
    F: FnOnce(Arc<SwapiService>) -> Fut,
    Fut: Future<Output = Result<Vec<E>>>,
{
    let ctx = CommandContext::new(opts)?;

    debug!("Listing {}", resource_name);
    let items = operation(ctx.service.clone()).await?;
    debug!("Listed {} {}", items.len(), resource_name);

    let output = match ctx.format {
        OutputFormat::Json => {
            json::format_json_with_counters(&items, ctx.service.last_counters())?
        }
        OutputFormat::Table => {
            let rows: Vec<D> = items.iter().map(D::from).collect();
            table::format_table(&rows)
        }
    };
    println!("{}", output);

    Ok(())
}
