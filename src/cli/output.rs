use anyhow::Result;
use console::{measure_text_width, style, truncate_str};
use serde::Serialize;

use crate::core::terminal::print_info;
use crate::core::turso::Row;

const MAX_CELL_WIDTH: usize = 48;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cell(text: &str) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    truncate_str(&flat, MAX_CELL_WIDTH, "…").into_owned()
}

/// Column widths sized to the widest cell, header included.
pub(crate) fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| measure_text_width(c))
                .chain(std::iter::once(measure_text_width(h)))
                .max()
                .unwrap_or(0)
        })
        .collect()
}

pub(crate) fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    if rows.is_empty() {
        print_info("No rows.");
        return;
    }
    let rows: Vec<Vec<String>> = rows
        .into_iter()
        .map(|r| r.iter().map(|c| cell(c)).collect())
        .collect();
    let widths = column_widths(headers, &rows);

    let header_line: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{}", style(format!("{:<w$}", h, w = *w)).bold().cyan()))
        .collect();
    println!("  {}", header_line.join("  "));

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| {
                let pad = w.saturating_sub(measure_text_width(c));
                format!("{}{}", c, " ".repeat(pad))
            })
            .collect();
        println!("  {}", line.join("  ").trim_end());
    }
    println!(
        "\n  {}",
        style(format!("{} row(s)", rows.len())).dim()
    );
}

/// Prints the named columns of query rows; `NULL` shows as blank.
pub(crate) fn print_rows(rows: &[Row], columns: &[(&str, &str)]) {
    let headers: Vec<&str> = columns.iter().map(|(_, label)| *label).collect();
    let body = rows
        .iter()
        .map(|row| columns.iter().map(|(key, _)| row.text(key)).collect())
        .collect();
    print_table(&headers, body);
}
