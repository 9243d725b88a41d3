//! Call storage and broadcast
//!
//! The store is the single call list shared by live capture and historical
//! replay. Records are only ever appended or replaced whole by id.

use crate::call::CallRecord;
use crate::filter::{FilterPlan, FilterRule};
use crate::normalize::from_capture_event;
use crate::search::SearchConfig;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use tokio::sync::{broadcast, RwLock};

/// Events broadcast to subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum StoreEvent {
    #[serde(rename = "added")]
    Added(CallRecord),
    #[serde(rename = "updated")]
    Updated(CallRecord),
    #[serde(rename = "history")]
    HistoryLoaded { inserted: usize },
    #[serde(rename = "clear")]
    Cleared,
}

/// What an upsert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Store for captured calls with broadcast capability
pub struct CallStore {
    calls: RwLock<Vec<CallRecord>>,
    broadcast_tx: broadcast::Sender<StoreEvent>,
}

impl CallStore {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(100);
        Self {
            calls: RwLock::new(Vec::new()),
            broadcast_tx,
        }
    }

    /// Append a new call, or replace the record that has the same id.
    ///
    /// A replacement without a response body keeps the body already stored.
    pub async fn upsert(&self, mut call: CallRecord) -> Upsert {
        let mut calls = self.calls.write().await;

        let outcome = match calls.iter_mut().find(|c| c.id == call.id) {
            Some(existing) => {
                if call.response_body.is_none() {
                    call.response_body = existing.response_body.take();
                }
                *existing = call.clone();
                Upsert::Replaced
            }
            None => {
                calls.push(call.clone());
                Upsert::Inserted
            }
        };
        drop(calls);

        // Ignore if no receivers
        let _ = self.broadcast_tx.send(match outcome {
            Upsert::Inserted => StoreEvent::Added(call),
            Upsert::Replaced => StoreEvent::Updated(call),
        });

        outcome
    }

    /// Replace the call at `id` with a copy carrying the resolved body.
    ///
    /// Returns false when no such call exists; late results for cleared
    /// calls are dropped.
    pub async fn resolve_body(&self, id: &str, body: String) -> bool {
        let mut calls = self.calls.write().await;

        let Some(existing) = calls.iter_mut().find(|c| c.id == id) else {
            tracing::debug!("Discarding body for unknown call {}", id);
            return false;
        };

        let updated = existing.with_response_body(body);
        *existing = updated.clone();
        drop(calls);

        let _ = self.broadcast_tx.send(StoreEvent::Updated(updated));
        true
    }

    /// Normalize a live capture event and store it.
    ///
    /// When the event carries no inline body and a content fetcher is given,
    /// the call is stored first and updated once the fetcher resolves.
    /// Returns the stored call's id.
    pub async fn capture<F>(&self, event: &Value, content: Option<F>) -> Option<String>
    where
        F: Future<Output = Option<String>>,
    {
        let call = from_capture_event(event)?;
        let id = call.id.clone();
        let needs_body = !call.has_response_body();

        tracing::debug!("Network call captured: {} {}", call.method, call.url);
        self.upsert(call).await;

        if let (true, Some(fetch)) = (needs_body, content) {
            if let Some(body) = fetch.await {
                self.resolve_body(&id, body).await;
            }
        }

        Some(id)
    }

    /// Put a historical batch in front of the live calls as one step.
    ///
    /// Calls whose id is already present are skipped. Returns how many were
    /// inserted.
    pub async fn prepend_history(&self, history: Vec<CallRecord>) -> usize {
        let mut calls = self.calls.write().await;

        let mut batch: Vec<CallRecord> = Vec::with_capacity(history.len());
        for call in history {
            let known = calls.iter().any(|c| c.id == call.id) || batch.iter().any(|c| c.id == call.id);
            if !known {
                batch.push(call);
            }
        }

        let inserted = batch.len();
        batch.append(&mut calls);
        *calls = batch;
        drop(calls);

        let _ = self.broadcast_tx.send(StoreEvent::HistoryLoaded { inserted });
        inserted
    }

    /// Get all stored calls
    pub async fn snapshot(&self) -> Vec<CallRecord> {
        self.calls.read().await.clone()
    }

    /// Get a specific call by ID
    pub async fn get(&self, id: &str) -> Option<CallRecord> {
        self.calls.read().await.iter().find(|c| c.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.calls.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.calls.read().await.is_empty()
    }

    /// Clear all calls
    pub async fn clear(&self) {
        self.calls.write().await.clear();
        let _ = self.broadcast_tx.send(StoreEvent::Cleared);
    }

    /// Calls that pass the filter rules and then the free-text search
    pub async fn visible(&self, rules: &[FilterRule], config: &SearchConfig) -> Vec<CallRecord> {
        visible_calls(&self.calls.read().await, rules, config)
    }

    /// Subscribe to store events
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.broadcast_tx.subscribe()
    }
}

impl Default for CallStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter evaluation followed by free-text search, without mutation
pub fn visible_calls(calls: &[CallRecord], rules: &[FilterRule], config: &SearchConfig) -> Vec<CallRecord> {
    let plan = FilterPlan::new(rules);
    let query = config.normalized_query();

    calls
        .iter()
        .filter(|call| plan.admits(call))
        .filter(|call| match &query {
            Some(q) => config.matches(call, q),
            None => true,
        })
        .cloned()
        .collect()
}
