//! Saved filter rule commands (add, ls, rm, toggle, clear)

use crate::config::{load_preferences, save_preferences};
use crate::render::truncate;
use anyhow::Result;
use clap::Subcommand;
use console::style;
use netlens_core::{FilterRule, FilterSet};

#[derive(Subcommand, Debug)]
pub enum FilterAction {
    /// Add a filter rule
    Add {
        /// Display name
        name: String,

        /// HTTP method; repeat to create one rule per method
        #[arg(short, long = "method")]
        methods: Vec<String>,

        /// Case-insensitive URL substring
        #[arg(short, long)]
        url: Option<String>,

        /// Only match failed calls
        #[arg(short, long)]
        errors: bool,

        /// Status codes or classes, e.g. 404,5XX
        #[arg(short, long, value_delimiter = ',')]
        codes: Vec<String>,

        /// Hide matching calls instead of keeping them
        #[arg(short = 'x', long)]
        exclude: bool,

        /// Save the rule disabled
        #[arg(long)]
        inactive: bool,
    },

    /// List filter rules
    Ls,

    /// Remove a filter rule
    Rm {
        /// Rule ID (or prefix)
        id: String,
    },

    /// Enable or disable a filter rule
    Toggle {
        /// Rule ID (or prefix)
        id: String,
    },

    /// Remove every filter rule
    Clear,
}

pub fn run(action: FilterAction) -> Result<()> {
    let mut prefs = load_preferences();

    match action {
        FilterAction::Add {
            name,
            methods,
            url,
            errors,
            codes,
            exclude,
            inactive,
        } => {
            let draft = draft_rule(name, url, errors, codes, exclude);
            let methods: Vec<String> = methods.iter().map(|m| m.to_uppercase()).collect();

            for rule in FilterRule::for_methods(&draft, &methods) {
                let added = prefs.filters.add(rule);
                let id = added.id.clone();
                println!("Added filter {} {}", style(&added.name).bold(), style(short_id(&id)).dim());
                if inactive {
                    prefs.filters.toggle(&id);
                }
            }
        }

        FilterAction::Ls => {
            list(&prefs.filters);
            return Ok(());
        }

        FilterAction::Rm { id } => {
            let id = resolve_id(&prefs.filters, &id)?;
            if let Some(rule) = prefs.filters.remove(&id) {
                println!("Removed filter: {}", rule.name);
            }
        }

        FilterAction::Toggle { id } => {
            let id = resolve_id(&prefs.filters, &id)?;
            if let Some(active) = prefs.filters.toggle(&id) {
                let state = if active { "enabled" } else { "disabled" };
                println!("Filter {} {}", short_id(&id), state);
            }
        }

        FilterAction::Clear => {
            let count = prefs.filters.len();
            prefs.filters.clear();
            println!("Removed {} filter(s).", count);
        }
    }

    save_preferences(&prefs)
}

fn draft_rule(name: String, url: Option<String>, errors: bool, codes: Vec<String>, exclude: bool) -> FilterRule {
    let mut rule = FilterRule::new(name);
    if let Some(url) = url {
        rule = rule.with_url_pattern(url);
    }
    if errors {
        rule = rule.with_errors();
    }
    if !codes.is_empty() {
        rule = rule.with_response_codes(codes.into_iter().map(|c| c.trim().to_uppercase()));
    }
    if exclude {
        rule = rule.excluding();
    }
    rule
}

fn resolve_id(filters: &FilterSet, id: &str) -> Result<String> {
    filters
        .find(id)
        .map(|rule| rule.id.clone())
        .ok_or_else(|| anyhow::anyhow!("Filter not found: {}", id))
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn list(filters: &FilterSet) {
    if filters.is_empty() {
        println!("No saved filters.");
        println!();
        println!("Add one with: netlens filter add <NAME> --errors");
        return;
    }

    println!(
        "{:<10} {:<24} {:<8} {:<8} {}",
        "ID", "NAME", "MODE", "STATE", "CRITERIA"
    );
    println!("{}", "-".repeat(80));

    for rule in filters.rules() {
        let mode = if rule.is_exclude { "exclude" } else { "include" };
        let state = if rule.is_active {
            style("on").green()
        } else {
            style("off").dim()
        };

        println!(
            "{:<10} {:<24} {:<8} {:<8} {}",
            short_id(&rule.id),
            truncate(&rule.name, 22),
            mode,
            state,
            describe(rule)
        );
    }
}

/// Human summary of a rule's criteria
fn describe(rule: &FilterRule) -> String {
    let mut parts = Vec::new();

    if let Some(method) = rule.method.as_deref().filter(|m| !m.is_empty()) {
        parts.push(format!("method={}", method));
    }
    if let Some(methods) = rule.methods.as_ref().filter(|m| !m.is_empty()) {
        parts.push(format!("methods={}", methods.join("|")));
    }
    if let Some(url) = rule.url_pattern.as_deref().filter(|u| !u.is_empty()) {
        parts.push(format!("url~{}", url));
    }
    if rule.include_errors == Some(true) {
        parts.push("errors".to_string());
    }
    if let Some(codes) = rule.response_code_filter.as_ref().filter(|c| !c.is_empty()) {
        parts.push(format!("status={}", codes.join(",")));
    }

    if parts.is_empty() {
        "any".to_string()
    } else {
        parts.join(" ")
    }
}
