//! Saved search config commands (set, show, reset)

use crate::config::{load_preferences, save_preferences};
use anyhow::Result;
use clap::Subcommand;
use console::style;
use netlens_core::SearchConfig;

#[derive(Subcommand, Debug)]
pub enum SearchAction {
    /// Update the saved query and field toggles
    Set {
        /// Query text; omit to keep the current one
        query: Option<String>,

        /// Search request headers
        #[arg(long)]
        headers: Option<bool>,

        /// Search request payloads
        #[arg(long)]
        payload: Option<bool>,

        /// Search response bodies
        #[arg(long)]
        response: Option<bool>,

        /// Search error descriptions
        #[arg(long)]
        errors: Option<bool>,
    },

    /// Show the saved search config
    Show,

    /// Clear the query and enable every field
    Reset,
}

pub fn run(action: SearchAction) -> Result<()> {
    let mut prefs = load_preferences();

    match action {
        SearchAction::Set {
            query,
            headers,
            payload,
            response,
            errors,
        } => {
            apply(&mut prefs.search, query, headers, payload, response, errors);
            save_preferences(&prefs)?;
            show(&prefs.search);
        }

        SearchAction::Show => show(&prefs.search),

        SearchAction::Reset => {
            prefs.search.reset();
            save_preferences(&prefs)?;
            println!("Search config reset.");
        }
    }

    Ok(())
}

fn apply(
    config: &mut SearchConfig,
    query: Option<String>,
    headers: Option<bool>,
    payload: Option<bool>,
    response: Option<bool>,
    errors: Option<bool>,
) {
    if let Some(query) = query {
        config.query = query;
    }
    config.search_in_headers = headers.unwrap_or(config.search_in_headers);
    config.search_in_payload = payload.unwrap_or(config.search_in_payload);
    config.search_in_response = response.unwrap_or(config.search_in_response);
    config.search_in_errors = errors.unwrap_or(config.search_in_errors);
}

fn show(config: &SearchConfig) {
    let query = match config.normalized_query() {
        Some(_) => style(config.query.as_str()).yellow().to_string(),
        None => style("(none)").dim().to_string(),
    };
    println!("{:<10} {}", "query", query);

    for (field, enabled) in [
        ("headers", config.search_in_headers),
        ("payload", config.search_in_payload),
        ("response", config.search_in_response),
        ("errors", config.search_in_errors),
    ] {
        let state = if enabled {
            style("on").green()
        } else {
            style("off").dim()
        };
        println!("{:<10} {}", field, state);
    }
}
