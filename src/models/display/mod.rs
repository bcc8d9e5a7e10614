//! Display model implementations for table output
//!
//! Display models flatten mapped entities into one row each, with column
//! names and placeholder handling suited to a terminal.

mod common;
mod film;
mod person;
mod starship;

pub use film::FilmDisplay;
pub use person::PersonDisplay;
pub use starship::StarshipDisplay;
