//! Table output formatting

use tabled::{
    Table, Tabled,
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Format rows as a table
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(data);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

/// Format a single record as FIELD / VALUE rows
pub fn format_record<T: Tabled>(item: &T) -> String {
    let mut builder = Builder::default();
    builder.push_record(["FIELD".to_string(), "VALUE".to_string()]);
    for (header, value) in T::headers().into_iter().zip(item.fields()) {
        builder.push_record([header.to_string(), value.to_string()]);
    }

    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}
