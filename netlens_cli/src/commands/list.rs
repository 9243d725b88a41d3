//! List calls from a HAR capture

use super::SearchArgs;
use crate::config::{load_preferences, Config};
use crate::har::HarFile;
use crate::render;
use anyhow::Result;
use console::style;
use netlens_core::{visible_calls, HistoricalLoader};
use std::path::Path;

pub async fn run(settings: &Config, har: &Path, args: &SearchArgs, all: bool) -> Result<()> {
    let prefs = load_preferences();
    let search = args.apply(&prefs.search);
    let rules = if all { &[][..] } else { prefs.filters.rules() };

    let loader = HistoricalLoader::with_config(HarFile::new(har), settings.loader());
    let result = loader
        .load_with_progress(|done, total| {
            tracing::debug!("Normalized {}/{} entries", done, total);
        })
        .await;

    for error in &result.errors {
        eprintln!("{} {}", style("error:").red().bold(), error);
    }

    if !result.is_ok() {
        anyhow::bail!("Failed to load {}", har.display());
    }

    let visible = visible_calls(&result.calls, rules, &search);

    if visible.is_empty() {
        println!("No calls match.");
    } else {
        render::print_calls(&visible, settings.list_limit);
    }

    println!();
    println!(
        "{} {} of {} calls shown, {} entries skipped, loaded in {:.1}ms",
        style("✓").green(),
        visible.len(),
        result.calls.len(),
        result.skipped(),
        result.load_time
    );

    let active = rules.iter().filter(|r| r.is_active).count();
    if active > 0 {
        println!(
            "  {} active filter(s). Use {} to ignore them.",
            active,
            style("--all").cyan()
        );
    }

    Ok(())
}
