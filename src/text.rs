//! Text helpers for fuzzy episode-name comparison and summary cleanup
//!
//! Episode names and filenames are compared after stripping the separator
//! characters people (and release tools) commonly use instead of spaces.
//! Case is left alone; comparisons lowercase both sides themselves.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

/// Characters ignored when comparing episode names with filenames
const IGNORED_SEPARATORS: [char; 5] = [' ', '+', '.', '-', '_'];

/// Inline markup dropped from catalog summaries (`<br>` is handled separately)
static REMOVED_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:p|i|b|li|ul)>|<div>|<br ?/>|<em/?>").expect("static regex is valid")
});

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br>").expect("static regex is valid"));

/// Canonicalizes an episode name or filename for substring comparison
///
/// Removes spaces, `+`, `.`, `-` and `_` while keeping every other
/// character in its original order and case.
///
/// # Examples
///
/// ```
/// use tvmaze_resolver::normalize;
///
/// assert_eq!(normalize("The.Big.One"), "TheBigOne");
/// assert_eq!(normalize("the big one"), "thebigone");
/// ```
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !IGNORED_SEPARATORS.contains(c))
        .collect()
}

/// Strips the small set of inline tags the catalog uses in summaries
///
/// `<br>` becomes a line break. Paragraph, bold, italic and list tags are
/// removed, as are opening `<div>` and `<em>` tags. Anything else, including
/// `</div>` and `</em>`, is left untouched.
pub fn strip_markup(summary: &str) -> String {
    let with_breaks = LINE_BREAK.replace_all(summary, "\n");
    REMOVED_MARKUP.replace_all(&with_breaks, "").into_owned()
}

/// Parses a loosely formatted catalog date
///
/// Accepts plain `YYYY-MM-DD` dates as well as RFC 3339 and naive
/// date-time stamps. Anything else yields `None`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|stamp| stamp.date())
}
