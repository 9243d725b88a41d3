//! Netlens Core - network call capture and inspection engine
//!
//! This crate normalizes captured HTTP exchanges into [`CallRecord`]s and
//! provides the filtering, search, identifier detection and highlighting
//! used by the CLI.

pub mod call;
pub mod error;
pub mod filter;
pub mod headers;
pub mod highlight;
pub mod history;
pub mod identifiers;
pub mod locate;
pub mod normalize;
pub mod prefs;
pub mod search;
pub mod store;
mod text;

pub use call::{status_error, CallRecord};
pub use error::{LoadError, PersistError};
pub use filter::{FilterPlan, FilterRule, FilterSet};
pub use headers::{normalize_headers, HeaderMap};
pub use highlight::{collect_spans, merge, MatchSpan, RenderPass, SearchNavigator, Segment, SpanKind};
pub use history::{HarSource, HistoricalLoadResult, HistoricalLoader, LoaderConfig};
pub use identifiers::{detect_identifiers, IdentifierMatch};
pub use locate::{find_text_matches, locate, search_body, BodySearch, MatchKind, StructuredMatch, TextMatch};
pub use normalize::{from_capture_event, from_har_entry};
pub use prefs::{BlobStore, MemoryBlobStore, Preferences};
pub use search::SearchConfig;
pub use store::{visible_calls, CallStore, StoreEvent, Upsert};
