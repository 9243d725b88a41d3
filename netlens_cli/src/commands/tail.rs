//! Follow live capture events from stdin
//!
//! Each input line is one JSON object: either a finished-request event with
//! `request`/`response` sections, or a `{"requestId", "content"}` body that
//! arrived later for an earlier event.

use crate::config::load_preferences;
use crate::render;
use anyhow::{Context, Result};
use console::style;
use netlens_core::{visible_calls, CallRecord, CallStore, FilterRule, SearchConfig, StoreEvent};
use serde_json::Value;
use std::collections::HashSet;
use std::future::Ready;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, oneshot};

/// One parsed input line
#[derive(Debug, PartialEq)]
enum TailLine {
    Capture(Value),
    Body { request_id: String, content: String },
}

fn parse_line(line: &str) -> Option<TailLine> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Skipping invalid event line: {}", e);
            return None;
        }
    };

    let is_body = value.get("request").is_none() && value.get("response").is_none();
    match (
        value.get("requestId").and_then(Value::as_str),
        value.get("content").and_then(Value::as_str),
    ) {
        (Some(id), Some(content)) if is_body => Some(TailLine::Body {
            request_id: id.to_string(),
            content: content.to_string(),
        }),
        _ => Some(TailLine::Capture(value)),
    }
}

pub async fn run(all: bool) -> Result<()> {
    let prefs = load_preferences();
    let rules = if all { Vec::new() } else { prefs.filters.rules().to_vec() };

    let store = Arc::new(CallStore::new());
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let printer = tokio::spawn(follow(
        store.clone(),
        store.subscribe(),
        shutdown_rx,
        Printer::new(rules, prefs.search),
        |call: &CallRecord| println!("{}", render::call_line(call)),
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match parse_line(&line) {
            Some(TailLine::Capture(event)) => {
                store.capture::<Ready<Option<String>>>(&event, None).await;
            }
            Some(TailLine::Body { request_id, content }) => {
                store.resolve_body(&request_id, content).await;
            }
            None => {}
        }
    }

    // Ignore if the printer already exited
    let _ = shutdown_tx.send(());
    printer.await.context("Event printer failed")?;

    eprintln!("{} {} calls captured", style("✓").green(), store.len().await);
    Ok(())
}

/// Decides which calls get printed, each at most once
struct Printer {
    rules: Vec<FilterRule>,
    search: SearchConfig,
    printed: HashSet<String>,
}

impl Printer {
    fn new(rules: Vec<FilterRule>, search: SearchConfig) -> Self {
        Self {
            rules,
            search,
            printed: HashSet::new(),
        }
    }

    /// Whether `call` is visible and has not been printed yet
    fn admit(&mut self, call: &CallRecord) -> bool {
        if self.printed.contains(&call.id) {
            return false;
        }
        if visible_calls(std::slice::from_ref(call), &self.rules, &self.search).is_empty() {
            return false;
        }
        self.printed.insert(call.id.clone());
        true
    }
}

/// Print store events until shutdown.
///
/// Broadcast events can be dropped when the reader outpaces the printer, so
/// after a lag and again at shutdown the printer catches up from a snapshot.
async fn follow<F>(
    store: Arc<CallStore>,
    mut rx: broadcast::Receiver<StoreEvent>,
    mut shutdown: oneshot::Receiver<()>,
    mut printer: Printer,
    mut emit: F,
) where
    F: FnMut(&CallRecord),
{
    loop {
        tokio::select! {
            biased;

            event = rx.recv() => match event {
                Ok(StoreEvent::Added(call)) | Ok(StoreEvent::Updated(call)) => {
                    if printer.admit(&call) {
                        emit(&call);
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!("Event printer lagged by {} events, catching up", n);
                    catch_up(&store, &mut printer, &mut emit).await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            _ = &mut shutdown => break,
        }
    }

    catch_up(&store, &mut printer, &mut emit).await;
}

async fn catch_up<F>(store: &CallStore, printer: &mut Printer, emit: &mut F)
where
    F: FnMut(&CallRecord),
{
    for call in store.snapshot().await {
        if printer.admit(&call) {
            emit(&call);
        }
    }
}
