/*!
 * Text clean-up applied around translation.
 *
 * - `strip_italic_tags` removes `<i>`/`</i>` markup from cue text
 * - `fix_leading_dot` repairs a sentence-final period that a model moved to
 *   the front of its output
 * - `normalize_cue_text` keeps translated text from breaking the SRT block layout
 */

use once_cell::sync::Lazy;
use regex::Regex;

static ITALIC_TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?i>").unwrap());
static BLANK_LINES_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+").unwrap());

/// Remove italic open/close tags, leaving their content
pub fn strip_italic_tags(text: &str) -> String {
    ITALIC_TAG_REGEX.replace_all(text, "").into_owned()
}

/// Move a single leading period to the end of the text.
///
/// `".Hello"` becomes `"Hello."`. Text starting with `".."` (an ellipsis) is
/// left alone, which also makes the operation idempotent.
pub fn fix_leading_dot(text: &str) -> String {
    match text.strip_prefix('.') {
        Some(rest) if !rest.starts_with('.') => format!("{}.", rest),
        _ => text.to_string(),
    }
}

/// Make translated text safe to store in a cue.
///
/// A blank line ends an SRT block, so runs of empty or whitespace-only lines
/// collapse into a single line break and the text is trimmed.
pub fn normalize_cue_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    BLANK_LINES_REGEX.replace_all(&unified, "\n").trim().to_string()
}
