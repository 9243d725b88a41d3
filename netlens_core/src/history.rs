//! Historical batch loader
//!
//! Pulls a HAR document from a capture source and normalizes its entries in
//! fixed-size chunks, yielding to the runtime between chunks on large
//! histories. The loader never fails: source problems end up in
//! [`HistoricalLoadResult::errors`] and malformed entries are skipped.

use crate::call::CallRecord;
use crate::error::LoadError;
use crate::normalize::{decode_content, from_har_entry};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::time::Instant;

/// Entries normalized per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Chunk count above which the loader yields between chunks
pub const DEFAULT_YIELD_AFTER_CHUNKS: usize = 10;

/// Pull-style access to the full capture history
pub trait HarSource {
    /// Fetch the HAR document, either `{"log": {"entries": [...]}}` or the bare
    /// log object `{"entries": [...]}`
    fn fetch_har(&self) -> impl Future<Output = Result<Value, LoadError>> + Send;
}

/// Outcome of one batch load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalLoadResult {
    pub calls: Vec<CallRecord>,
    /// Wall-clock milliseconds
    pub load_time: f64,
    /// Raw entry count, including entries that were skipped
    pub total_requests: usize,
    pub errors: Vec<String>,
}

impl HistoricalLoadResult {
    pub fn skipped(&self) -> usize {
        self.total_requests.saturating_sub(self.calls.len())
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderConfig {
    pub chunk_size: usize,
    pub yield_after_chunks: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            yield_after_chunks: DEFAULT_YIELD_AFTER_CHUNKS,
        }
    }
}

pub struct HistoricalLoader<S> {
    source: S,
    config: LoaderConfig,
}

impl<S: HarSource> HistoricalLoader<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, LoaderConfig::default())
    }

    pub fn with_config(source: S, config: LoaderConfig) -> Self {
        Self {
            source,
            config: LoaderConfig {
                chunk_size: config.chunk_size.max(1),
                ..config
            },
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Load and normalize the whole history
    pub async fn load(&self) -> HistoricalLoadResult {
        self.load_with_progress(|_, _| {}).await
    }

    /// Like [`load`](Self::load), reporting `(processed, total)` after each chunk
    pub async fn load_with_progress<F>(&self, mut on_progress: F) -> HistoricalLoadResult
    where
        F: FnMut(usize, usize),
    {
        let started = Instant::now();
        let mut result = HistoricalLoadResult::default();

        tracing::debug!("Loading existing network data...");

        let document = match self.source.fetch_har().await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!("Error loading historical network data: {}", e);
                result.errors.push(e.to_string());
                result.load_time = elapsed_ms(started);
                return result;
            }
        };

        let Some(entries) = entries_of(&document) else {
            let e = LoadError::MalformedDocument;
            tracing::warn!("{}", e);
            result.errors.push(e.to_string());
            result.load_time = elapsed_ms(started);
            return result;
        };

        result.total_requests = entries.len();
        on_progress(0, result.total_requests);
        tracing::debug!("Found {} existing network requests", result.total_requests);

        let chunk_count = entries.len().div_ceil(self.config.chunk_size);
        let mut processed = 0;

        for (chunk_index, chunk) in entries.chunks(self.config.chunk_size).enumerate() {
            if chunk_index > 0 && chunk_count > self.config.yield_after_chunks {
                tokio::task::yield_now().await;
            }

            result.calls.extend(chunk.iter().filter_map(from_har_entry));
            processed += chunk.len();
            on_progress(processed, result.total_requests);

            if chunk_count > 5 {
                tracing::debug!(
                    "Processed chunk {}/{} ({} valid calls)",
                    chunk_index + 1,
                    chunk_count,
                    result.calls.len()
                );
            }
        }

        result.load_time = elapsed_ms(started);
        tracing::info!(
            "Loaded {} network calls in {:.2}ms",
            result.calls.len(),
            result.load_time
        );

        result
    }

    /// Fetch one entry's response body on demand.
    ///
    /// Returns `None` when the source is unavailable, the id is unknown or
    /// the entry carries no content.
    pub async fn load_response_content(&self, request_id: &str) -> Option<String> {
        let document = match self.source.fetch_har().await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Cannot load response content: {}", e);
                return None;
            }
        };

        let entry = entries_of(&document)?
            .iter()
            .find(|e| e.get("_requestId").and_then(Value::as_str) == Some(request_id));

        let Some(entry) = entry else {
            tracing::warn!("Request with ID {} not found in HAR data", request_id);
            return None;
        };

        let content = entry.get("response")?.get("content")?;
        let text = content.get("text").and_then(Value::as_str)?;
        Some(decode_content(
            text,
            content.get("encoding").and_then(Value::as_str),
        ))
    }
}

fn entries_of(document: &Value) -> Option<&Vec<Value>> {
    document
        .get("log")
        .unwrap_or(document)
        .get("entries")
        .and_then(Value::as_array)
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
