//! Highlight merger and search navigation
//!
//! Combines identifier spans and search spans for one text unit into an
//! ordered, non-overlapping list of segments. Search spans get a global index
//! from a [`RenderPass`] that the caller threads through every text unit of
//! one render, so indices stay stable across the units of a structure.

use crate::identifiers::IdentifierMatch;
use crate::locate::TextMatch;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Identifier,
    Search,
}

/// A span to highlight inside one text unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSpan {
    pub position: usize,
    pub length: usize,
    pub text: String,
    pub kind: SpanKind,
    /// Order of this match within its own text unit; `None` for identifiers.
    ///
    /// Restarts at 0 for every unit. Navigation uses
    /// the `global_index` of [`Segment::Highlight`] instead.
    pub local_index: Option<usize>,
}

impl MatchSpan {
    pub fn identifier(m: &IdentifierMatch) -> Self {
        Self {
            position: m.position,
            length: m.token.len(),
            text: m.token.clone(),
            kind: SpanKind::Identifier,
            local_index: None,
        }
    }

    pub fn search(m: &TextMatch, local_index: usize) -> Self {
        Self {
            position: m.position,
            length: m.length,
            text: m.text.clone(),
            kind: SpanKind::Search,
            local_index: Some(local_index),
        }
    }

    fn end(&self) -> usize {
        self.position + self.length
    }
}

/// Build the span list for one text unit, identifiers first.
///
/// Search spans are numbered per unit; [`merge`] assigns the pass-wide index.
pub fn collect_spans(identifiers: &[IdentifierMatch], searches: &[TextMatch]) -> Vec<MatchSpan> {
    identifiers
        .iter()
        .map(MatchSpan::identifier)
        .chain(
            searches
                .iter()
                .enumerate()
                .map(|(idx, m)| MatchSpan::search(m, idx)),
        )
        .collect()
}

/// Search-match counter shared by every text unit of one render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPass {
    next_index: usize,
    current: usize,
}

impl RenderPass {
    /// Start a fresh top-level render; the counter begins at 0
    pub fn new(current_search_index: usize) -> Self {
        Self {
            next_index: 0,
            current: current_search_index,
        }
    }

    /// Search spans accepted so far in this pass
    pub fn total(&self) -> usize {
        self.next_index
    }

    pub fn current(&self) -> usize {
        self.current
    }

    fn assign(&mut self) -> usize {
        let idx = self.next_index;
        self.next_index += 1;
        idx
    }
}

/// One rendered piece of a text unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment<'a> {
    Text {
        text: &'a str,
    },
    Highlight {
        text: &'a str,
        position: usize,
        kind: SpanKind,
        /// Stable identity of a search match across the whole render pass,
        /// compared against the navigator's current index
        global_index: Option<usize>,
        is_current: bool,
    },
}

impl<'a> Segment<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            Segment::Text { text } | Segment::Highlight { text, .. } => *text,
        }
    }

    pub fn is_current(&self) -> bool {
        matches!(self, Segment::Highlight { is_current: true, .. })
    }
}

/// Merge spans over `text` into renderable segments.
///
/// Spans are sorted by position (stable, so identifiers win ties when listed
/// first). A span starting before the end of the last emitted span is
/// dropped. Spans that fall outside `text` or split a character are ignored.
pub fn merge<'a>(text: &'a str, spans: &[MatchSpan], pass: &mut RenderPass) -> Vec<Segment<'a>> {
    let mut ordered: Vec<&MatchSpan> = spans
        .iter()
        .filter(|s| {
            s.length > 0
                && s.end() <= text.len()
                && text.is_char_boundary(s.position)
                && text.is_char_boundary(s.end())
        })
        .collect();
    ordered.sort_by_key(|s| s.position);

    let mut segments = Vec::new();
    let mut last_end = 0;

    for span in ordered {
        if span.position < last_end {
            continue;
        }

        if span.position > last_end {
            segments.push(Segment::Text {
                text: &text[last_end..span.position],
            });
        }

        let global_index = match span.kind {
            SpanKind::Search => Some(pass.assign()),
            SpanKind::Identifier => None,
        };

        segments.push(Segment::Highlight {
            text: &text[span.position..span.end()],
            position: span.position,
            kind: span.kind,
            global_index,
            is_current: global_index == Some(pass.current),
        });

        last_end = span.end();
    }

    if last_end < text.len() {
        segments.push(Segment::Text {
            text: &text[last_end..],
        });
    }

    segments
}

/// Tracks the current result for next/previous navigation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchNavigator {
    current: usize,
    total: usize,
}

impl SearchNavigator {
    pub fn new(total: usize) -> Self {
        Self { current: 0, total }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// New result set; the current result goes back to the first one
    pub fn reset(&mut self, total: usize) {
        self.current = 0;
        self.total = total;
    }

    /// Jump to a result, clamped into range
    pub fn select(&mut self, index: usize) -> usize {
        self.current = if self.total == 0 {
            0
        } else {
            index.min(self.total - 1)
        };
        self.current
    }

    pub fn next(&mut self) -> usize {
        if self.total > 0 {
            self.current = (self.current + 1) % self.total;
        }
        self.current
    }

    pub fn prev(&mut self) -> usize {
        if self.total > 0 {
            self.current = (self.current + self.total - 1) % self.total;
        }
        self.current
    }
}
