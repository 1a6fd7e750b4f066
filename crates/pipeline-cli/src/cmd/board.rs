use crate::cmd::Backend;
use crate::output::{money, print_json, print_table};
use anyhow::Context;
use pipeline_core::board;
use pipeline_core::reconcile::RecordSource;
use pipeline_core::types::Taxonomy;
use std::path::Path;

pub fn run(root: &Path, server: Option<&str>, taxonomy: Taxonomy, json: bool) -> anyhow::Result<()> {
    let records = Backend::select(root, server)
        .fetch_records()
        .context("failed to load opportunities")?;
    let partition = board::partition(&records, taxonomy);
    let summaries = partition.aggregate();

    if json {
        let columns: Vec<serde_json::Value> = partition
            .buckets
            .iter()
            .zip(&summaries)
            .map(|(bucket, summary)| {
                serde_json::json!({
                    "stage": summary.stage,
                    "label": summary.label,
                    "count": summary.count,
                    "total_value": summary.total_value,
                    "mean_win_probability": summary.mean_win_probability,
                    "records": bucket.records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "taxonomy": taxonomy,
            "columns": columns,
        }));
    }

    let rows: Vec<Vec<String>> = partition
        .buckets
        .iter()
        .zip(&summaries)
        .map(|(bucket, summary)| {
            let ids: Vec<&str> = bucket.records.iter().map(|r| r.id.as_str()).collect();
            let mut row = vec![
                summary.label.to_string(),
                summary.count.to_string(),
                money(summary.total_value),
            ];
            if let Some(mean) = summary.mean_win_probability {
                row.push(format!("{mean:.0}%"));
            }
            row.push(ids.join(", "));
            row
        })
        .collect();

    let headers: &[&str] = match taxonomy {
        Taxonomy::Primary => &["STAGE", "COUNT", "VALUE", "RECORDS"],
        Taxonomy::Forecast => &["STAGE", "COUNT", "VALUE", "WIN", "RECORDS"],
    };
    print_table(headers, rows);
    Ok(())
}
