use pipeline_core::reconcile::Notifier;
use pipeline_core::types::Severity;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Print rows under a header, each column padded to its widest cell.
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    println!("{}", fmt_row(&header, &widths));
    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", fmt_row(&sep, &widths));
    for row in &rows {
        println!("{}", fmt_row(row, &widths));
    }
}

fn fmt_row(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let w = widths.get(i).copied().unwrap_or(0);
            format!("{cell:w$}")
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

pub fn money(value: f64) -> String {
    format!("{value:.0}")
}

/// Toasts go to stderr so `--json` output on stdout stays parseable.
pub struct Console;

impl Notifier for Console {
    fn notify(&self, message: &str, severity: Severity) {
        eprintln!("[{severity}] {message}");
    }
}
