/*!
 * Tests for word-bounded text chunking
 */

use subtran::translation::chunker::{reassemble, split_text, word_count, TextChunk};

fn texts(chunks: &[TextChunk]) -> Vec<&str> {
    chunks.iter().map(|c| c.text.as_str()).collect()
}

#[test]
fn test_split_text_withOneWordLimit_shouldSplitEverySentence() {
    let chunks = split_text("A. B. C.", 1);

    assert_eq!(texts(&chunks), vec!["A.", "B.", "C."]);
    assert!(!chunks[0].ends_with_paragraph_break);
    assert!(!chunks[1].ends_with_paragraph_break);
    assert!(chunks[2].ends_with_paragraph_break);
}

#[test]
fn test_split_text_withShortText_shouldReturnSingleChunk() {
    let chunks = split_text("Just a few words here", 250);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Just a few words here");
    assert!(chunks[0].ends_with_paragraph_break);
}

#[test]
fn test_split_text_withSentenceInsideWindow_shouldStillFillChunk() {
    let chunks = split_text("One two. Three four five six", 4);

    assert_eq!(texts(&chunks), vec!["One two. Three four", "five six"]);
    assert!(!chunks[0].ends_with_paragraph_break);
    assert!(chunks[1].ends_with_paragraph_break);
}

#[test]
fn test_split_text_withParagraphs_shouldNotSpanLineBreaks() {
    let chunks = split_text("First paragraph here\nSecond one", 10);

    assert_eq!(texts(&chunks), vec!["First paragraph here", "Second one"]);
    assert!(chunks.iter().all(|c| c.ends_with_paragraph_break));
}

#[test]
fn test_split_text_withBlankLine_shouldEmitEmptyBreakChunk() {
    let chunks = split_text("a\n\nb", 5);

    assert_eq!(texts(&chunks), vec!["a", "", "b"]);
    assert_eq!(reassemble(&chunks), "a\n\nb");
}

#[test]
fn test_split_text_withEmptyInput_shouldYieldOnlyEmptyChunk() {
    let chunks = split_text("", 5);

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "");
    assert_eq!(reassemble(&chunks), "");
}

#[test]
fn test_split_text_shouldRespectWordLimit() {
    let text = "The quick brown fox jumps over the lazy dog. It was not amused! \
                Why would it be? Dogs rarely enjoy that kind of thing\n\
                A new line begins here and keeps going for a while without stopping";

    for limit in 1..=12 {
        for chunk in split_text(text, limit) {
            assert!(
                chunk.word_count() <= limit,
                "chunk {:?} exceeds limit {}",
                chunk.text,
                limit
            );
        }
    }
}

#[test]
fn test_reassemble_shouldRebuildInput() {
    let inputs = [
        "A. B. C.",
        "Hello world. This is a longer sentence that will need splitting.\nAnd a second paragraph!",
        "one\n\ntwo three four five six seven\nend.",
        "No punctuation at all in this rather long line of words",
    ];

    for input in inputs {
        for limit in 1..=6 {
            let chunks = split_text(input, limit);
            assert_eq!(reassemble(&chunks), input.trim_end(), "limit {}", limit);
        }
    }
}

#[test]
fn test_split_text_shouldKeepEveryWord() {
    let text = "alpha beta. gamma delta epsilon! zeta eta theta iota kappa";
    let chunks = split_text(text, 3);

    let total: usize = chunks.iter().map(|c| c.word_count()).sum();
    assert_eq!(total, word_count(text));
}
