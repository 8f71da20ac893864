/*!
 * Tests for SRT parsing and serialization
 */

use anyhow::Result;
use subtran::errors::SubtitleError;
use subtran::subtitle_processor::{SubtitleCollection, SubtitleEntry, TimeRange, Timestamp};

use crate::common;

#[test]
fn test_timestamp_withValidText_shouldConvertBothWays() -> Result<()> {
    let ts = Timestamp::parse("01:23:45,678")?;
    assert_eq!(ts.to_millis(), 5025678);
    assert_eq!(Timestamp::from_millis(5025678), ts);
    assert_eq!(ts.to_string(), "01:23:45,678");
    Ok(())
}

#[test]
fn test_timestamp_withInvalidText_shouldFail() {
    for bad in ["1:23:45,678", "01:23:45.678", "", "01:23:45,67"] {
        assert!(
            matches!(Timestamp::parse(bad), Err(SubtitleError::InvalidTimestamp(_))),
            "{:?} should be rejected",
            bad
        );
    }
}

#[test]
fn test_parse_withItalicTags_shouldStripThem() {
    let entries = SubtitleCollection::parse_srt_string(
        "1\n00:00:01,000 --> 00:00:02,000\nHello <i>world</i>\n\n",
    );

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].seq_num, 1);
    assert_eq!(entries[0].timing.start.as_str(), "00:00:01,000");
    assert_eq!(entries[0].timing.end.as_str(), "00:00:02,000");
    assert_eq!(entries[0].text, "Hello world");
}

#[test]
fn test_parse_withMultilineText_shouldJoinLinesWithNewline() {
    let entries = SubtitleCollection::parse_srt_string(
        "7\n00:01:00,000 --> 00:01:03,500\nFirst line\nSecond line\n",
    );

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].seq_num, 7);
    assert_eq!(entries[0].text, "First line\nSecond line");
}

#[test]
fn test_parse_withCrlfAndBom_shouldMatchUnixInput() {
    let unix = SubtitleCollection::parse_srt_string(common::SAMPLE_SRT);
    let windows = format!("\u{feff}{}", common::SAMPLE_SRT.replace('\n', "\r\n"));
    let parsed = SubtitleCollection::parse_srt_string(&windows);

    assert_eq!(parsed, unix);
    assert_eq!(parsed.len(), 3);
}

#[test]
fn test_parse_withMalformedBlock_shouldSkipOnlyThatBlock() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nKept\n\n\
                   not a number\nnot a timing\n\n\
                   3\n00:00:05,000 --> 00:00:06,000\nAlso kept\n";
    let entries = SubtitleCollection::parse_srt_string(content);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "Kept");
    assert_eq!(entries[1].seq_num, 3);
    assert_eq!(entries[1].text, "Also kept");
}

#[test]
fn test_parse_withGarbage_shouldReturnNoEntries() {
    assert!(SubtitleCollection::parse_srt_string("").is_empty());
    assert!(SubtitleCollection::parse_srt_string("just some text\nand more").is_empty());
}

#[test]
fn test_parse_withEmptyCue_shouldKeepIt() {
    let entries = SubtitleCollection::parse_srt_string(
        "1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\nText\n",
    );

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].text, "");
    assert_eq!(entries[1].text, "Text");
}

#[test]
fn test_parse_withOutOfOrderIndices_shouldKeepDocumentOrder() {
    let entries = SubtitleCollection::parse_srt_string(
        "5\n00:00:05,000 --> 00:00:06,000\nFive\n\n2\n00:00:01,000 --> 00:00:02,000\nTwo\n",
    );

    let seq: Vec<usize> = entries.iter().map(|e| e.seq_num).collect();
    assert_eq!(seq, vec![5, 2]);
}

#[test]
fn test_entry_display_shouldProduceSrtBlock() {
    let entry = SubtitleEntry::new(1, 5000, 10000, "Test subtitle".to_string());
    assert_eq!(
        entry.to_string(),
        "1\n00:00:05,000 --> 00:00:10,000\nTest subtitle\n\n"
    );
}

#[test]
fn test_timeRange_withEndBeforeStart_shouldBeInverted() -> Result<()> {
    let range = TimeRange::new(Timestamp::parse("00:00:05,000")?, Timestamp::parse("00:00:04,000")?);
    assert!(range.is_inverted());
    Ok(())
}

#[test]
fn test_roundTrip_withMultilineText_shouldReproduceEntries() {
    let entries = vec![
        SubtitleEntry::new(1, 1000, 2000, "Line one\nLine two".to_string()),
        SubtitleEntry::new(2, 2500, 4000, "Single".to_string()),
        SubtitleEntry::new(3, 3_600_000, 3_601_000, "An hour in".to_string()),
    ];

    let serialized = SubtitleCollection::to_srt_string(&entries);
    let reparsed = SubtitleCollection::parse_srt_string(&serialized);

    assert_eq!(reparsed, entries);
    assert_eq!(reparsed[0].text, "Line one\nLine two");
}

#[test]
fn test_read_srt_file_withMissingFile_shouldReportUnreadable() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let missing = temp_dir.path().join("missing.srt");

    let err = SubtitleCollection::read_srt_file(&missing).unwrap_err();
    assert!(matches!(err, SubtitleError::UnreadableFile { ref path, .. } if *path == missing));
    Ok(())
}

#[test]
fn test_write_to_srt_withFileAsParent_shouldReportUnwritable() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let blocker = common::create_test_file(temp_dir.path(), "blocker", "x")?;

    let mut collection = SubtitleCollection::new(temp_dir.path().join("in.srt"));
    collection.entries.push(SubtitleEntry::new(1, 0, 1000, "Hi".to_string()));

    let err = collection.write_to_srt(blocker.join("out.srt")).unwrap_err();
    assert!(matches!(err, SubtitleError::UnwritableFile { .. }));
    Ok(())
}

#[test]
fn test_write_then_read_shouldPreserveCollection() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "sample.srt")?;

    let collection = SubtitleCollection::read_srt_file(&input)?;
    let output = temp_dir.path().join("nested").join("copy.srt");
    collection.write_to_srt(&output)?;

    let reread = SubtitleCollection::read_srt_file(&output)?;
    assert_eq!(reread.entries, collection.entries);
    assert_eq!(reread.source_file, output);
    Ok(())
}
