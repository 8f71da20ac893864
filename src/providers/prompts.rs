/*!
 * Prompt rendering and the batch framing protocol.
 *
 * A batch is sent as one prompt in which every text is preceded by an
 * `<<ENTRY_n>>` marker and the whole is closed by `<<END>>`. The model is
 * asked to answer with the same markers around each translation.
 */

use once_cell::sync::Lazy;
use regex::Regex;

static NEXT_MARKER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<<(?:ENTRY_\d+|END)>>").unwrap());

/// Appended to the system prompt for batch requests
pub const BATCH_INSTRUCTIONS: &str = "The input contains several subtitles. Each one starts with a marker like <<ENTRY_0>> and the input ends with <<END>>. Translate every subtitle separately and answer with the same markers in the same order, each followed by its translation, and finish with <<END>>. Do not merge, split or skip subtitles.";

/// Substitute the language placeholders of a system prompt template
pub fn render_system_prompt(template: &str, source_language: &str, target_language: &str) -> String {
    template
        .replace("{source_language}", source_language)
        .replace("{target_language}", target_language)
}

/// Frame texts with entry markers
pub fn encode_batch(texts: &[String]) -> String {
    let mut prompt = String::new();
    for (i, text) in texts.iter().enumerate() {
        prompt.push_str(&format!("<<ENTRY_{}>>\n{}\n", i, text));
    }
    prompt.push_str("<<END>>");
    prompt
}

/// Extract up to `expected` translations from a framed response.
///
/// Decoding stops at the first missing marker, so a malformed response yields
/// fewer items than expected instead of shifted ones.
pub fn decode_batch(response: &str, expected: usize) -> Vec<String> {
    let mut results = Vec::with_capacity(expected);

    for i in 0..expected {
        let marker = format!("<<ENTRY_{}>>", i);
        let Some(position) = response.find(&marker) else {
            break;
        };

        let rest = &response[position + marker.len()..];
        let body_end = NEXT_MARKER_REGEX
            .find(rest)
            .map(|m| m.start())
            .unwrap_or(rest.len());
        results.push(rest[..body_end].trim().to_string());
    }

    results
}

/// Tidy a single-text answer
pub fn clean_single_response(response: &str) -> String {
    response.trim().to_string()
}
