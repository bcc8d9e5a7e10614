//! Generic command handlers shared by the collection commands

mod get;
mod list;

pub use get::run_get_command;
pub use list::run_list_command;
