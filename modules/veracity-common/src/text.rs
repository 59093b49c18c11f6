//! Plain-text preparation for content handed to backends.
//!
//! Articles arrive as rendered HTML; backends get stripped, whitespace-
//! normalized text truncated to a fixed word budget. Truncation is a cost
//! control the orchestrator applies regardless of which backend runs.

use std::sync::LazyLock;

use regex::Regex;

/// Word budget for text sent to any backend.
pub const MAX_CONTENT_WORDS: usize = 800;
/// Hard character ceiling applied after the word cut.
pub const MAX_CONTENT_CHARS: usize = 3000;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Remove markup, drop script/style bodies, collapse whitespace.
pub fn strip_html(html: &str) -> String {
    let no_scripts = SCRIPT_RE.replace_all(html, " ");
    let no_tags = TAG_RE.replace_all(&no_scripts, " ");
    let decoded = no_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'");
    WS_RE.replace_all(decoded.trim(), " ").into_owned()
}

/// Truncate to at most `max_words` whitespace-delimited words.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    words[..max_words].join(" ")
}

/// Truncate at a UTF-8 boundary at or before `max_chars` bytes.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    if text.len() <= max_chars {
        return text;
    }
    let mut end = max_chars;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Full preparation pipeline: strip markup, then apply both budgets.
pub fn prepare_content(raw: &str) -> String {
    let stripped = strip_html(raw);
    let worded = truncate_words(&stripped, MAX_CONTENT_WORDS);
    truncate_chars(&worded, MAX_CONTENT_CHARS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        let html = "<p>The  <b>sky</b> is\n\nblue.</p>";
        assert_eq!(strip_html(html), "The sky is blue.");
    }

    #[test]
    fn drops_script_bodies_entirely() {
        let html = "<p>Real text.</p><script>var x = 'noise';</script><p>More.</p>";
        assert_eq!(strip_html(html), "Real text. More.");
    }

    #[test]
    fn decodes_common_entities() {
        assert_eq!(strip_html("Tom &amp; Jerry &quot;cartoon&quot;"), "Tom & Jerry \"cartoon\"");
    }

    #[test]
    fn word_truncation_keeps_leading_words() {
        let text = "one two three four five";
        assert_eq!(truncate_words(text, 3), "one two three");
        assert_eq!(truncate_words(text, 10), text);
    }

    #[test]
    fn char_truncation_respects_utf8_boundaries() {
        let text = "héllo wörld";
        let cut = truncate_chars(text, 3);
        assert!(text.starts_with(cut));
        assert!(cut.len() <= 3);
    }

    #[test]
    fn prepare_is_bounded() {
        let raw = "word ".repeat(2000);
        let prepared = prepare_content(&raw);
        assert!(prepared.split_whitespace().count() <= MAX_CONTENT_WORDS);
        assert!(prepared.len() <= MAX_CONTENT_CHARS);
    }
}
