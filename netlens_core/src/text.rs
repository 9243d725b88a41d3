//! Substring scanning that reports byte spans in the original text
//!
//! Case-insensitive matching compares lowercased characters one haystack
//! character at a time, so reported spans always cover whole characters of
//! the original string even when lowercasing changes byte lengths.

/// Find every non-overlapping occurrence of `needle` in `haystack`.
///
/// Returns `(position, length)` pairs in byte offsets, in ascending order.
/// An empty needle never matches.
pub(crate) fn find_all(haystack: &str, needle: &str, case_sensitive: bool) -> Vec<(usize, usize)> {
    if needle.is_empty() || haystack.is_empty() {
        return Vec::new();
    }

    if case_sensitive {
        return haystack
            .match_indices(needle)
            .map(|(pos, m)| (pos, m.len()))
            .collect();
    }

    let folded: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    let mut spans = Vec::new();
    let mut resume_at = 0;

    for (pos, _) in haystack.char_indices() {
        if pos < resume_at {
            continue;
        }
        if let Some(len) = folded_match_len(&haystack[pos..], &folded) {
            spans.push((pos, len));
            resume_at = pos + len;
        }
    }

    spans
}

/// Byte length of the prefix of `text` that case-folds to exactly `folded`.
fn folded_match_len(text: &str, folded: &[char]) -> Option<usize> {
    let mut matched = 0;
    let mut consumed = 0;

    for ch in text.chars() {
        if matched == folded.len() {
            break;
        }
        for lower in ch.to_lowercase() {
            if folded.get(matched) != Some(&lower) {
                return None;
            }
            matched += 1;
        }
        consumed += ch.len_utf8();
    }

    (matched == folded.len()).then_some(consumed)
}

/// Case-insensitive containment against an already-lowercased needle.
pub(crate) fn contains_lower(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Clamp `idx` down to the nearest char boundary of `s`.
pub(crate) fn floor_boundary(s: &str, idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    let mut idx = idx;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_all_case_insensitive() {
        let spans = find_all("Error: error ERROR", "error", false);
        assert_eq!(spans, vec![(0, 5), (7, 5), (13, 5)]);
    }

    #[test]
    fn test_find_all_case_sensitive() {
        let spans = find_all("Error: error ERROR", "error", true);
        assert_eq!(spans, vec![(7, 5)]);
    }

    #[test]
    fn test_find_all_skips_overlapping_hits() {
        assert_eq!(find_all("aaaa", "aa", false), vec![(0, 2), (2, 2)]);
    }

    #[test]
    fn test_find_all_reports_original_byte_spans() {
        // 'É' is two bytes; the match must cover it entirely
        let text = "café ÉTÉ";
        let spans = find_all(text, "été", false);
        assert_eq!(spans.len(), 1);
        let (pos, len) = spans[0];
        assert_eq!(&text[pos..pos + len], "ÉTÉ");
    }

    #[test]
    fn test_find_all_empty_inputs() {
        assert!(find_all("abc", "", false).is_empty());
        assert!(find_all("", "abc", false).is_empty());
    }

    #[test]
    fn test_floor_boundary() {
        let s = "aé";
        assert_eq!(floor_boundary(s, 2), 1);
        assert_eq!(floor_boundary(s, 99), s.len());
    }
}
