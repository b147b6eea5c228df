//! Output formatting: table, CSV, JSON.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! JSON uses serde, CSV emits a header line plus comma-joined rows with
//! minimal quoting.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `csv`: `csv_header` line, then `to_record` cells per item
/// - `json`: serializes the original data via serde
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    csv_header: &[&str],
    to_record: impl Fn(&T) -> Vec<String>,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Csv => render_csv(csv_header, data.iter().map(to_record)),
        OutputFormat::Json => render_json(data),
    }
}

/// Print the rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Pretty-printed JSON.
pub fn render_json<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).expect("serialization should not fail")
}

/// Header + records, comma-joined with minimal quoting.
pub fn render_csv<I>(header: &[&str], records: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut lines = vec![header.join(",")];
    lines.extend(
        records
            .into_iter()
            .map(|record| record.iter().map(|cell| csv_escape(cell)).collect::<Vec<_>>().join(",")),
    );
    lines.join("\n")
}

/// Quote a CSV cell only when it needs it.
fn csv_escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_plain_cells_pass_through() {
        assert_eq!(csv_escape("Kitchen Plug"), "Kitchen Plug");
    }

    #[test]
    fn csv_cells_with_commas_are_quoted() {
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn csv_render_includes_header() {
        let out = render_csv(
            &["Coordinator", "Device"],
            vec![vec!["zigbee15".to_owned(), "Plug1".to_owned()]],
        );
        assert_eq!(out, "Coordinator,Device\nzigbee15,Plug1");
    }
}
