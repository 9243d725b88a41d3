//! CLI command implementations

pub mod filter;
pub mod inspect;
pub mod list;
pub mod search;
pub mod tail;

use clap::Args;
use netlens_core::SearchConfig;

/// Search flags shared by commands that print call lists
#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Free-text query (overrides the saved query)
    #[arg(short, long)]
    pub query: Option<String>,

    /// Do not search request headers
    #[arg(long)]
    pub no_headers: bool,

    /// Do not search request payloads
    #[arg(long)]
    pub no_payload: bool,

    /// Do not search response bodies
    #[arg(long)]
    pub no_response: bool,

    /// Do not search error descriptions
    #[arg(long)]
    pub no_errors: bool,
}

impl SearchArgs {
    /// Layer the flags over a saved config
    pub fn apply(&self, saved: &SearchConfig) -> SearchConfig {
        SearchConfig {
            query: self.query.clone().unwrap_or_else(|| saved.query.clone()),
            search_in_headers: saved.search_in_headers && !self.no_headers,
            search_in_payload: saved.search_in_payload && !self.no_payload,
            search_in_response: saved.search_in_response && !self.no_response,
            search_in_errors: saved.search_in_errors && !self.no_errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_saved_config() {
        let saved = SearchConfig::with_query("saved");
        let args = SearchArgs {
            no_response: true,
            ..Default::default()
        };

        let config = args.apply(&saved);
        assert_eq!(config.query, "saved");
        assert!(!config.search_in_response);
        assert!(config.search_in_headers);

        let args = SearchArgs {
            query: Some("cli".to_string()),
            ..Default::default()
        };
        assert_eq!(args.apply(&saved).query, "cli");
    }
}
