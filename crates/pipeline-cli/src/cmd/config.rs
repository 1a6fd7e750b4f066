use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use pipeline_core::config::{Config, WarnLevel};
use pipeline_core::types::Taxonomy;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        return print_json(&config);
    }

    println!("project: {}", config.project.name);
    for taxonomy in Taxonomy::all() {
        let board = config.board(*taxonomy);
        println!(
            "board {taxonomy}: policy={:?} success_toast={} card_target={:?}",
            board.policy, board.success_toast, board.card_target
        );
    }
    let g = &config.gestures;
    println!(
        "gestures: pointer={}px touch={}px double_activation={}ms",
        g.pointer_distance, g.touch_distance, g.double_activation_ms
    );
    println!("server: port {}", config.server.port);
    Ok(())
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
