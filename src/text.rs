//! Text normalization helpers shared by the filter, aggregator and report

/// Default summary length, in characters
pub const SUMMARY_LIMIT: usize = 200;

/// Marker appended to a truncated summary
pub const ELLIPSIS: &str = "...";

/// Replace every run of whitespace with a single space and trim both ends.
///
/// `None` is treated as the empty string.
pub fn collapse_whitespace(text: Option<&str>) -> String {
    text.unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse whitespace, then cut to `limit` characters plus [`ELLIPSIS`]
/// when the collapsed text is longer than `limit`.
pub fn summarize(text: Option<&str>, limit: usize) -> String {
    let collapsed = collapse_whitespace(text);
    if collapsed.chars().count() > limit {
        let mut head: String = collapsed.chars().take(limit).collect();
        head.push_str(ELLIPSIS);
        head
    } else {
        collapsed
    }
}

/// Grouping key: whitespace-collapsed and lower-cased. Never displayed.
pub fn normalize_for_grouping(text: Option<&str>) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// Title-case a key for display.
///
/// A letter is upper-cased when it starts the string or follows a
/// non-letter, every other letter is lower-cased.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
