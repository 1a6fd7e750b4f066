use crate::cmd::Backend;
use crate::output::{print_json, print_table};
use anyhow::Context;
use chrono::{Duration, NaiveDate, Utc};
use pipeline_core::agenda::{self, AgendaItem};
use pipeline_core::reconcile::RecordSource;
use std::path::Path;

pub struct AgendaArgs {
    pub calendar: bool,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

pub fn run(root: &Path, server: Option<&str>, args: AgendaArgs, json: bool) -> anyhow::Result<()> {
    let records = Backend::select(root, server)
        .fetch_records()
        .context("failed to load opportunities")?;
    let now = Utc::now();

    if !args.calendar {
        let items = agenda::event_list(&records, now);
        if json {
            return print_json(&items);
        }
        if items.is_empty() {
            println!("No pending activities.");
            return Ok(());
        }
        print_table(
            &["DUE", "DAYS", "TIER", "OPPORTUNITY", "ACTIVITY", "NOTE"],
            items.iter().map(item_row).collect(),
        );
        return Ok(());
    }

    let today = now.date_naive();
    let from = args.from.unwrap_or(today);
    let to = args.to.unwrap_or(from + Duration::days(30));
    if from > to {
        anyhow::bail!("--from {from} is after --to {to}");
    }
    let days = agenda::calendar(&records, now, from, to);
    if json {
        return print_json(&serde_json::json!({ "from": from, "to": to, "days": days }));
    }
    if days.is_empty() {
        println!("Nothing due between {from} and {to}.");
        return Ok(());
    }
    for day in &days {
        println!("{}  [{}]", day.date.format("%a %Y-%m-%d"), day.tier);
        for item in &day.items {
            println!(
                "    {}  {} ({})",
                item.due.format("%H:%M"),
                item.opportunity_name,
                item.activity_type
            );
        }
    }
    Ok(())
}

fn item_row(item: &AgendaItem) -> Vec<String> {
    vec![
        item.due.format("%Y-%m-%d %H:%M").to_string(),
        item.days_until.to_string(),
        item.tier.to_string(),
        item.opportunity_name.clone(),
        item.activity_type.clone(),
        item.note.clone(),
    ]
}
