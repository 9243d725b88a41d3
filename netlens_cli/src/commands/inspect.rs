//! Show one call with identifiers and search matches highlighted

use crate::config::{load_preferences, Config};
use crate::har::HarFile;
use crate::render;
use anyhow::Result;
use console::style;
use netlens_core::identifiers::identifiers_in_url;
use netlens_core::locate::locate_with_depth;
use netlens_core::{
    collect_spans, detect_identifiers, find_text_matches, merge, search_body, CallRecord, HistoricalLoader,
    RenderPass, SearchNavigator, TextMatch,
};
use serde_json::Value;
use std::path::PathBuf;

/// Options for the inspect command
pub struct InspectOptions {
    pub har: PathBuf,
    pub id: String,
    pub query: Option<String>,
    pub index: usize,
    pub payload: bool,
}

/// One block of text rendered with its own spans
struct Unit {
    label: Option<String>,
    text: String,
    matches: Vec<TextMatch>,
}

pub async fn run(settings: &Config, opts: InspectOptions) -> Result<()> {
    let loader = HistoricalLoader::with_config(HarFile::new(&opts.har), settings.loader());
    let result = loader.load().await;

    if let Some(error) = result.errors.first() {
        anyhow::bail!("Failed to load {}: {}", opts.har.display(), error);
    }

    let call = find_call(&result.calls, &opts.id)?.clone();

    let body = if opts.payload {
        call.request_body.clone()
    } else {
        match &call.response_body {
            Some(body) => Some(body.clone()),
            None => loader.load_response_content(&call.id).await,
        }
    };

    let query = opts
        .query
        .clone()
        .unwrap_or_else(|| load_preferences().search.query);
    let query = query.trim().to_string();

    let units = build_units(&call, body.as_deref(), &query, settings.case_sensitive);

    // First pass only counts, so the requested index can be clamped
    let mut counting = RenderPass::new(usize::MAX);
    for unit in &units {
        let spans = collect_spans(&detect_identifiers(&unit.text), &unit.matches);
        merge(&unit.text, &spans, &mut counting);
    }

    let mut navigator = SearchNavigator::new(counting.total());
    navigator.select(opts.index);

    println!(
        "{} {} {}",
        style(&call.method).bold(),
        style(&call.url).green(),
        style(format!("[{}]", call.id)).dim()
    );
    for token in identifiers_in_url(&call.url) {
        println!("  {} {}", style("identifier:").dim(), style(token).magenta());
    }
    println!(
        "  {} {} {}  {} {:.0}ms",
        style("status:").dim(),
        call.status,
        call.status_text,
        style("time:").dim(),
        call.duration
    );
    if let Some(error) = &call.error {
        println!("  {} {}", style("error:").dim(), style(error).red());
    }
    println!();

    let mut pass = RenderPass::new(navigator.current());
    for unit in &units {
        let spans = collect_spans(&detect_identifiers(&unit.text), &unit.matches);
        let rendered = render::segments(&merge(&unit.text, &spans, &mut pass));
        if let Some(label) = &unit.label {
            println!("{}", style(label).cyan().bold());
        }
        if !unit.text.is_empty() {
            println!("{}", rendered);
        }
    }

    if body.is_none() {
        println!("{}", style("(no body)").dim());
    }

    if !query.is_empty() {
        println!();
        if navigator.total() == 0 {
            println!("No matches for {}", style(&query).yellow());
        } else {
            println!(
                "match {}/{} for {}",
                navigator.current() + 1,
                navigator.total(),
                style(&query).yellow()
            );
        }

        if let Some(data) = body.as_deref().and_then(|b| serde_json::from_str::<Value>(b).ok()) {
            for m in locate_with_depth(&data, &query, settings.case_sensitive, settings.max_depth) {
                let path = if m.path.is_empty() { "$" } else { m.path.as_str() };
                tracing::debug!("Structured {:?} match at {}", m.kind, path);
                println!("  {} {}", style(path).dim(), m.text);
            }
        }
    }

    Ok(())
}

fn find_call<'a>(calls: &'a [CallRecord], id: &str) -> Result<&'a CallRecord> {
    if let Some(call) = calls.iter().find(|c| c.id == id) {
        return Ok(call);
    }

    let mut hits = calls.iter().filter(|c| c.id.starts_with(id));
    match (hits.next(), hits.next()) {
        (Some(call), None) => Ok(call),
        (Some(_), Some(_)) => anyhow::bail!("Call ID prefix is ambiguous: {}", id),
        _ => anyhow::bail!("Call not found: {}", id),
    }
}

fn build_units(call: &CallRecord, body: Option<&str>, query: &str, case_sensitive: bool) -> Vec<Unit> {
    let mut units = Vec::new();

    units.push(Unit {
        label: Some("Request headers".to_string()),
        text: String::new(),
        matches: Vec::new(),
    });
    for (name, value) in call.request_headers.iter() {
        let text = format!("  {}: {}", name, value);
        let matches = find_text_matches(&text, query, case_sensitive);
        units.push(Unit {
            label: None,
            text,
            matches,
        });
    }

    units.push(Unit {
        label: Some("Response headers".to_string()),
        text: String::new(),
        matches: Vec::new(),
    });
    for (name, value) in call.response_headers.iter() {
        let text = format!("  {}: {}", name, value);
        let matches = find_text_matches(&text, query, case_sensitive);
        units.push(Unit {
            label: None,
            text,
            matches,
        });
    }

    if let Some(body) = body {
        let text = pretty_body(body);
        let matches = search_body(&text, query, case_sensitive).matches;
        units.push(Unit {
            label: Some("Body".to_string()),
            text,
            matches,
        });
    }

    units
}

/// Pretty-print JSON bodies, leave everything else as is
fn pretty_body(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|data| serde_json::to_string_pretty(&data).ok())
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use netlens_core::HeaderMap;

    fn call(id: &str) -> CallRecord {
        CallRecord {
            id: id.to_string(),
            url: "https://x.test/users".to_string(),
            method: "GET".to_string(),
            status: 200,
            status_text: "OK".to_string(),
            request_headers: [("Accept", "application/json")].into_iter().collect::<HeaderMap>(),
            response_headers: HeaderMap::new(),
            request_body: None,
            response_body: Some(r#"{"accept":true}"#.to_string()),
            timestamp: 0,
            duration: 3.0,
            error: None,
        }
    }

    #[test]
    fn test_find_call_by_prefix() {
        let calls = vec![call("abc-1"), call("abd-2")];
        assert_eq!(find_call(&calls, "abc").unwrap().id, "abc-1");
        assert!(find_call(&calls, "ab").is_err());
        assert!(find_call(&calls, "zzz").is_err());
    }

    #[test]
    fn test_units_cover_headers_and_body() {
        let c = call("1");
        let units = build_units(&c, c.response_body.as_deref(), "accept", false);

        let total: usize = units.iter().map(|u| u.matches.len()).sum();
        assert_eq!(total, 2);
        assert_eq!(units.last().unwrap().text, "{\n  \"accept\": true\n}");
    }

    #[test]
    fn test_pretty_body_leaves_text_alone() {
        assert_eq!(pretty_body("plain text"), "plain text");
        assert_eq!(pretty_body("[1]"), "[\n  1\n]");
    }
}
