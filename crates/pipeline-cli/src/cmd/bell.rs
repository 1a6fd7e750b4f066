use crate::client::HttpBackend;
use crate::output::{print_json, print_table};
use anyhow::{bail, Context};
use chrono::Utc;
use pipeline_core::agenda::{self, ReadMarks};
use pipeline_core::store::OpportunityStore;
use std::path::Path;

/// Show overdue and urgent activities.
///
/// Read marks live in the server process, so `--mark-read` needs `--server`.
/// Against the local store every item is unread.
pub fn run(root: &Path, server: Option<&str>, mark_read: bool, json: bool) -> anyhow::Result<()> {
    let bell = match server {
        Some(url) => {
            let http = HttpBackend::new(url);
            if mark_read {
                http.post_json("/api/agenda/bell/read", serde_json::json!({}))?
            } else {
                http.get_json("/api/agenda/bell")?
            }
        }
        None => {
            if mark_read {
                bail!("--mark-read needs --server: read marks are kept by the server session");
            }
            let records = OpportunityStore::new(root)
                .load_all()
                .context("failed to load opportunities")?;
            serde_json::to_value(agenda::bell(&records, Utc::now(), &ReadMarks::new()))?
        }
    };

    if json {
        return print_json(&bell);
    }

    let unread = bell["unread"].as_u64().context("unexpected bell payload")?;
    println!("{unread} unread");
    let rows: Vec<Vec<String>> = bell["items"]
        .as_array()
        .map(|items| items.iter().map(bell_row).collect())
        .unwrap_or_default();
    if !rows.is_empty() {
        print_table(&["", "DUE", "DAYS", "TIER", "OPPORTUNITY", "ACTIVITY", "NOTE"], rows);
    }
    Ok(())
}

/// One table row from a serialized bell entry; unread entries are starred.
fn bell_row(entry: &serde_json::Value) -> Vec<String> {
    let text = |key: &str| match &entry[key] {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    };
    let due = chrono::DateTime::parse_from_rfc3339(&text("due"))
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| text("due"));
    let read = entry["read"].as_bool().unwrap_or(false);
    vec![
        if read { " " } else { "*" }.to_string(),
        due,
        text("days_until"),
        text("tier"),
        text("opportunity_name"),
        text("activity_type"),
        text("note"),
    ]
}
