pub use crate::error::Error;

pub use anstream::eprintln;
pub use anstream::println;
pub use color_eyre::eyre::{eyre, Context, Result};
pub use std::format as f;

/// Borderless table with the given column titles.
pub fn new_table(titles: &[&str]) -> prettytable::Table {
    let mut table = prettytable::Table::new();

    let format = prettytable::format::FormatBuilder::new()
        .padding(1, 1)
        .separator(
            prettytable::format::LinePosition::Title,
            prettytable::format::LineSeparator::new('-', '+', '+', '+'),
        )
        .build();

    table.set_format(format);

    if !titles.is_empty() {
        table.set_titles(prettytable::Row::new(
            titles.iter().map(|t| prettytable::Cell::new(t)).collect(),
        ));
    }

    table
}
