//! Terminal rendering for calls and highlighted text

use chrono::{Local, TimeZone};
use console::style;
use netlens_core::{CallRecord, Segment, SpanKind};

/// Print the call table
pub fn print_calls(calls: &[CallRecord], limit: Option<usize>) {
    println!(
        "{:<14} {:<7} {:<6} {:<9} {:<8} {}",
        "ID", "METHOD", "STATUS", "TIME", "STARTED", "URL"
    );
    println!("{}", "-".repeat(100));

    let shown = limit.unwrap_or(calls.len()).min(calls.len());
    for call in &calls[..shown] {
        println!("{}", call_line(call));
    }

    if shown < calls.len() {
        println!("{}", style(format!("... {} more", calls.len() - shown)).dim());
    }
}

/// One table row
pub fn call_line(call: &CallRecord) -> String {
    format!(
        "{:<14} {:<7} {:<6} {:<9} {:<8} {}",
        truncate(&call.id, 14),
        call.method,
        status_text(call.status),
        format!("{:.0}ms", call.duration),
        started(call.timestamp),
        truncate(&call.url, 60)
    )
}

fn status_text(status: u16) -> String {
    let label = if status == 0 {
        "-".to_string()
    } else {
        status.to_string()
    };

    // Pad before styling so escape codes do not break alignment
    let padded = format!("{:<6}", label);
    match status {
        0 => style(padded).dim().to_string(),
        s if s >= 500 => style(padded).red().bold().to_string(),
        s if s >= 400 => style(padded).yellow().to_string(),
        s if s >= 300 => style(padded).cyan().to_string(),
        _ => style(padded).green().to_string(),
    }
}

fn started(timestamp: i64) -> String {
    match Local.timestamp_millis_opt(timestamp).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}

/// Render merged segments with terminal styles
pub fn segments(segments: &[Segment<'_>]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Text { text } => text.to_string(),
            Segment::Highlight {
                text,
                kind: SpanKind::Identifier,
                ..
            } => style(text).magenta().underlined().to_string(),
            Segment::Highlight {
                text,
                is_current: true,
                ..
            } => style(text).black().on_yellow().bold().to_string(),
            Segment::Highlight { text, .. } => style(text).yellow().reverse().to_string(),
        })
        .collect()
}

/// Truncate a string with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netlens_core::{collect_spans, find_text_matches, merge, RenderPass};

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("https://example.com/long", 10), "https:/...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_segments_keep_text() {
        console::set_colors_enabled(false);
        let text = "status: error, retry on error";
        let spans = collect_spans(&[], &find_text_matches(text, "error", false));
        let merged = merge(text, &spans, &mut RenderPass::new(1));
        assert_eq!(segments(&merged), text);
    }
}
