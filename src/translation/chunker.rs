/*!
 * Word-bounded text chunking.
 *
 * Long text is split into pieces of at most `word_limit` words so each piece
 * fits a single backend request. Pieces never span a line break, prefer to end
 * right after a sentence mark, and remember whether a line break followed them
 * so the translated pieces can be stitched back together.
 */

/// Default maximum number of words per chunk
pub const DEFAULT_WORD_LIMIT: usize = 250;

/// A bounded fragment of a larger text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Words of the fragment joined by single spaces
    pub text: String,

    /// Whether a line break followed this fragment in the source text
    pub ends_with_paragraph_break: bool,
}

impl TextChunk {
    fn new(text: String, ends_with_paragraph_break: bool) -> Self {
        Self { text, ends_with_paragraph_break }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Number of whitespace separated words in `text`
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split `text` into chunks of at most `word_limit` words.
///
/// A word limit of zero is treated as one.
pub fn split_text(text: &str, word_limit: usize) -> Vec<TextChunk> {
    let limit = word_limit.max(1);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();

        if words.is_empty() {
            if !current.is_empty() {
                chunks.push(TextChunk::new(current.join(" "), true));
                current.clear();
            }
            chunks.push(TextChunk::new(String::new(), true));
            continue;
        }

        let mut start = 0;
        while start < words.len() {
            let remaining = limit - current.len();
            let mut end = (start + remaining).min(words.len());

            if let Some(cut) = sentence_cut(&words[start..end]) {
                if start + cut < words.len() {
                    end = start + cut;
                }
            }

            current.extend_from_slice(&words[start..end]);

            if current.len() >= limit || end == words.len() {
                chunks.push(TextChunk::new(current.join(" "), end == words.len()));
                current.clear();
            }

            start = end;
        }
    }

    if !current.is_empty() {
        chunks.push(TextChunk::new(current.join(" "), false));
    }

    chunks
}

// Number of words up to and including the first one that ends a sentence,
// ignoring the window's last word.
fn sentence_cut(window: &[&str]) -> Option<usize> {
    let candidates = window.len().saturating_sub(1);
    window[..candidates]
        .iter()
        .position(|word| word.ends_with(['.', '!', '?']))
        .map(|index| index + 1)
}

/// Join chunks back into one text.
///
/// A chunk followed by a line break gets a `\n`, consecutive chunks of the same
/// line are separated by one space, and trailing whitespace is dropped.
pub fn reassemble(chunks: &[TextChunk]) -> String {
    let mut text = String::new();

    for (i, chunk) in chunks.iter().enumerate() {
        text.push_str(&chunk.text);
        if chunk.ends_with_paragraph_break {
            text.push('\n');
        } else if i + 1 < chunks.len() {
            text.push(' ');
        }
    }

    text.truncate(text.trim_end().len());
    text
}
