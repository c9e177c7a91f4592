//! Fence stripping for model output.
//!
//! This is a prefix/suffix trim, not a markdown parser. Prose around a fenced block, or more
//! than one block, is left in place and fails later when executed.

const OPENING_FENCE: &str = "```sql";
const CLOSING_FENCE: &str = "```";

/// Turns raw model output into the statement that will be executed.
///
/// Trims outer whitespace, removes a leading "```sql" and a trailing "```" when they are
/// exactly at the ends, then trims again so the fence's own line breaks are dropped.
pub fn sanitize(raw: &str) -> String {
    let text = raw.trim();
    let text = text.strip_prefix(OPENING_FENCE).unwrap_or(text);
    let text = text.strip_suffix(CLOSING_FENCE).unwrap_or(text);
    text.trim().to_string()
}
