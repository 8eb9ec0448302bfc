//! Terminal output. Tables go to stdout; so does `--json`.

use anyhow::Result;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use tdc_core::{present, PageNav, ResultPage};

pub fn table(headers: Vec<String>, rows: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers);
    for row in rows {
        builder.push_record(row);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A result page as a table plus paging summary. With `expand`, the full
/// content behind compacted cells is listed below the table.
pub fn print_page(page: &ResultPage, json: bool, expand: bool) -> Result<()> {
    if json {
        return print_json(page);
    }

    let nav = PageNav::of(page);
    let result = present(page);
    if result.is_empty() {
        println!("{}", nav.summary());
        return Ok(());
    }

    let headers = result.headers();
    let rows = result
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.render()).collect())
        .collect();
    println!("{}", table(headers.clone(), rows));

    if expand {
        for (i, row) in result.rows.iter().enumerate() {
            for (header, cell) in headers.iter().zip(row) {
                if let Some(detail) = cell.detail() {
                    println!("\n[row {}] {}:\n{}", i + 1, header, detail);
                }
            }
        }
    }

    println!("{}", nav.summary());
    if nav.has_controls() {
        println!("{}", nav.position());
    }
    println!("Executed in {}ms", page.execution_time);
    Ok(())
}
