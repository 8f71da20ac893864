use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::SubtitleError;
use crate::file_utils::FileManager;
use crate::translation::formatting::strip_italic_tags;

// @module: SRT cue model, parsing and serialization

// @const: Full timestamp line, matched against a trimmed line
static TIMESTAMP_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}:\d{2}:\d{2},\d{3}) --> (\d{2}:\d{2}:\d{2},\d{3})$").unwrap()
});

// @const: Single SRT timestamp
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}:\d{2}:\d{2},\d{3}$").unwrap()
});

/// An SRT timestamp (`HH:MM:SS,mmm`).
///
/// The text is kept exactly as it appeared in the source document so that
/// writing a parsed file back reproduces the original timing lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timestamp(String);

impl Timestamp {
    /// Parse a timestamp, rejecting anything that is not `HH:MM:SS,mmm`
    pub fn parse(text: &str) -> Result<Self, SubtitleError> {
        if TIMESTAMP_REGEX.is_match(text) {
            Ok(Self(text.to_string()))
        } else {
            Err(SubtitleError::InvalidTimestamp(text.to_string()))
        }
    }

    /// Largest offset a two-digit hour field can hold (`99:59:59,999`)
    pub const MAX_MILLIS: u64 = 359_999_999;

    /// Build a timestamp from a millisecond offset.
    ///
    /// Offsets past `MAX_MILLIS` are clamped so the result always parses.
    pub fn from_millis(ms: u64) -> Self {
        let ms = ms.min(Self::MAX_MILLIS);
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        Self(format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis))
    }

    /// Millisecond offset of this timestamp
    pub fn to_millis(&self) -> u64 {
        let fields: Vec<u64> = self
            .0
            .split([':', ','])
            .map(|part| {
                part.bytes()
                    .filter(u8::is_ascii_digit)
                    .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'))
            })
            .collect();

        match fields.as_slice() {
            [hours, minutes, seconds, millis] => {
                hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis
            }
            _ => 0,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display interval of a cue. `start <= end` is not enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// True when the range ends before it starts
    pub fn is_inverted(&self) -> bool {
        self.end.to_millis() < self.start.to_millis()
    }
}

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Sequence number, as found in the source
    pub seq_num: usize,

    // @field: Display interval
    pub timing: TimeRange,

    // @field: Caption text, lines joined with '\n'
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new cue from millisecond offsets
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        Self {
            seq_num,
            timing: TimeRange::new(
                Timestamp::from_millis(start_time_ms),
                Timestamp::from_millis(end_time_ms),
            ),
            text,
        }
    }

    /// Creates a new cue from an already parsed time range
    pub fn with_timing(seq_num: usize, timing: TimeRange, text: String) -> Self {
        Self { seq_num, timing, text }
    }

    pub fn start_time_ms(&self) -> u64 {
        self.timing.start.to_millis()
    }

    pub fn end_time_ms(&self) -> u64 {
        self.timing.end.to_millis()
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.timing.start, self.timing.end)?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Ordered cues of one subtitle document
#[derive(Debug, Clone)]
pub struct SubtitleCollection {
    /// File the cues were read from
    pub source_file: PathBuf,

    /// Cues in document order
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Create an empty collection
    pub fn new(source_file: PathBuf) -> Self {
        Self {
            source_file,
            entries: Vec::new(),
        }
    }

    /// Read and parse an SRT file
    pub fn read_srt_file<P: AsRef<Path>>(path: P) -> Result<Self, SubtitleError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SubtitleError::UnreadableFile {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            source_file: path.to_path_buf(),
            entries: Self::parse_srt_string(&content),
        })
    }

    /// Parse SRT content into cues.
    ///
    /// Blocks that do not contain an index line followed by a timing line are
    /// skipped with a warning. A document without any cue yields an empty
    /// vector; callers decide whether that is a problem.
    pub fn parse_srt_string(content: &str) -> Vec<SubtitleEntry> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let normalized = content.replace("\r\n", "\n").replace('\r', "\n");

        let mut entries: Vec<SubtitleEntry> = Vec::new();
        let mut block: Vec<&str> = Vec::new();
        let mut block_start_line = 1;

        for (line_no, line) in normalized.split('\n').enumerate() {
            if line.trim().is_empty() {
                if !block.is_empty() {
                    if let Some(entry) = Self::parse_block(&block, block_start_line) {
                        Self::check_chronology(entries.last(), &entry);
                        entries.push(entry);
                    }
                    block.clear();
                }
                continue;
            }

            if block.is_empty() {
                block_start_line = line_no + 1;
            }
            block.push(line);
        }

        if !block.is_empty() {
            if let Some(entry) = Self::parse_block(&block, block_start_line) {
                Self::check_chronology(entries.last(), &entry);
                entries.push(entry);
            }
        }

        if entries.is_empty() {
            warn!("No subtitle entries found");
        } else {
            debug!("Parsed {} subtitle entries", entries.len());
        }

        entries
    }

    fn parse_block(lines: &[&str], first_line: usize) -> Option<SubtitleEntry> {
        let header = (0..lines.len().saturating_sub(1)).find_map(|i| {
            let index = lines[i].trim();
            if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let seq_num = index.parse::<usize>().ok()?;
            let caps = TIMESTAMP_LINE_REGEX.captures(lines[i + 1].trim())?;
            let timing = TimeRange::new(
                Timestamp(caps[1].to_string()),
                Timestamp(caps[2].to_string()),
            );
            Some((i, seq_num, timing))
        });

        let Some((header_at, seq_num, timing)) = header else {
            warn!("Skipping malformed subtitle block at line {}", first_line);
            return None;
        };

        if header_at > 0 {
            warn!(
                "Ignoring {} stray line(s) before subtitle {} at line {}",
                header_at, seq_num, first_line
            );
        }

        let raw_text = lines[header_at + 2..].join("\n");
        let text = strip_italic_tags(&raw_text).trim().to_string();

        Some(SubtitleEntry::with_timing(seq_num, timing, text))
    }

    fn check_chronology(previous: Option<&SubtitleEntry>, entry: &SubtitleEntry) {
        if entry.timing.is_inverted() {
            warn!(
                "Subtitle {} ends before it starts ({} --> {})",
                entry.seq_num, entry.timing.start, entry.timing.end
            );
        }
        if let Some(previous) = previous {
            if previous.end_time_ms() > entry.start_time_ms() {
                warn!("Subtitle {} overlaps subtitle {}", entry.seq_num, previous.seq_num);
            }
        }
    }

    /// Serialize cues back into SRT text
    pub fn to_srt_string(entries: &[SubtitleEntry]) -> String {
        entries.iter().map(|entry| entry.to_string()).collect()
    }

    /// Write the collection to an SRT file.
    ///
    /// The content goes to a temporary file next to `path` which is then
    /// renamed over it, so a failed write never leaves a partial document.
    pub fn write_to_srt<P: AsRef<Path>>(&self, path: P) -> Result<(), SubtitleError> {
        let path = path.as_ref();
        let content = Self::to_srt_string(&self.entries);

        FileManager::write_atomic(path, &content).map_err(|source| SubtitleError::UnwritableFile {
            path: path.to_path_buf(),
            source,
        })
    }
}
