//! Fragment cleanup applied before assembly.
//!
//! Authored text often arrives through copy/paste and lossy re-encoding:
//! CRLF or bare CR line endings, U+FFFD replacement characters, and runs of
//! `???` where non-ASCII characters used to be.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

fn question_mark_runs() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\?{3,}").ok()).as_ref()
}

/// Normalize line endings, drop replacement characters and `???` runs.
pub fn sanitize_fragment(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let stripped: String = normalized.chars().filter(|&c| c != '\u{FFFD}').collect();
    match question_mark_runs() {
        Some(re) => match re.replace_all(&stripped, "") {
            Cow::Borrowed(_) => stripped,
            Cow::Owned(s) => s,
        },
        None => stripped,
    }
}
