//! Plain tables for listings

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets};

/// Column alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Render rows under `header` as a borderless table
pub fn render_table(header: &[(&str, Align)], rows: &[Vec<String>]) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(header.iter().map(|(name, _)| Cell::new(name)));

    for row in rows {
        table.add_row(row.iter().zip(header).map(|(value, (_, align))| {
            let cell = Cell::new(value);
            match align {
                Align::Left => cell,
                Align::Right => cell.set_alignment(CellAlignment::Right),
            }
        }));
    }

    table.to_string()
}
