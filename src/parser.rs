use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::{
    diff_file::{DiffFile, DiffHunk, DiffLine, LineType},
    error::ParseError,
    word_diff::align_hunk,
};

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(.*)$")
        .expect("hunk header pattern is valid")
});

const DEV_NULL: &str = "/dev/null";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Run the word-level alignment pass after parsing.
    pub word_diff: bool,
    /// Leave a deletion/addition pair unaligned when either side has more
    /// tokens than this.
    pub max_align_tokens: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            word_diff: true,
            max_align_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not a line the parser knows about (`index ...`, mode lines, prose).
    Unrecognized,
    /// Starts with `@@` but is not a valid hunk header.
    MalformedHunkHeader,
    /// A file-level line (`---`, `+++`, `@@`, rename, binary) before any
    /// `diff --git`.
    NoActiveFile,
    /// A `+`, `-` or context line outside of a hunk.
    NoActiveHunk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedLine {
    pub line_number: usize,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport {
    pub files: Vec<DiffFile>,
    pub skipped: Vec<SkippedLine>,
}

pub fn parse_diff(diff_text: &str) -> Vec<DiffFile> {
    parse_diff_with(diff_text, &ParseOptions::default())
}

pub fn parse_diff_with(diff_text: &str, options: &ParseOptions) -> Vec<DiffFile> {
    parse_diff_report(diff_text, options).files
}

/// Lenient parse that also lists every line it dropped.
pub fn parse_diff_report(diff_text: &str, options: &ParseOptions) -> ParseReport {
    let mut parser = DiffParser::new(Mode::Lenient);
    for (i, line) in diff_text.lines().enumerate() {
        // Lenient mode never produces an error.
        let _ = parser.feed(i + 1, line);
    }
    parser.finish(options)
}

/// Validating parse. Fails on malformed hunk headers, on `+`/`-` and
/// file-level lines outside of a file or hunk, and on hunks whose body does
/// not match the counts in their header.
pub fn parse_diff_strict(
    diff_text: &str,
    options: &ParseOptions,
) -> Result<Vec<DiffFile>, ParseError> {
    let mut parser = DiffParser::new(Mode::Strict);
    for (i, line) in diff_text.lines().enumerate() {
        parser.feed(i + 1, line)?;
    }
    parser.check_open_hunk()?;
    Ok(parser.finish(options).files)
}

struct HunkRange {
    old_start: u32,
    old_count: u32,
    new_start: u32,
    new_count: u32,
}

/// Every line shape the parser distinguishes, in priority order.
enum Classified<'a> {
    GitHeader { old_path: &'a str, new_path: &'a str },
    OldPath(Option<&'a str>),
    NewPath(Option<&'a str>),
    HunkHeader(HunkRange),
    MalformedHunkHeader,
    Binary,
    RenameFrom(&'a str),
    RenameTo(&'a str),
    Added,
    Removed,
    Context,
    NoNewlineMarker,
    Unrecognized,
}

fn classify(line: &str) -> Classified<'_> {
    if let Some(rest) = line.strip_prefix("diff --git ") {
        let (old_path, new_path) = split_git_paths(rest);
        Classified::GitHeader { old_path, new_path }
    } else if let Some(path) = line.strip_prefix("--- ") {
        Classified::OldPath(file_path(path, "a/"))
    } else if let Some(path) = line.strip_prefix("+++ ") {
        Classified::NewPath(file_path(path, "b/"))
    } else if line.starts_with("@@") {
        parse_hunk_header(line).map_or(Classified::MalformedHunkHeader, Classified::HunkHeader)
    } else if line.starts_with("Binary files ") && line.ends_with(" differ") {
        Classified::Binary
    } else if let Some(path) = line.strip_prefix("rename from ") {
        Classified::RenameFrom(path)
    } else if let Some(path) = line.strip_prefix("rename to ") {
        Classified::RenameTo(path)
    } else if line.starts_with('+') && !line.starts_with("+++") {
        Classified::Added
    } else if line.starts_with('-') && !line.starts_with("---") {
        Classified::Removed
    } else if line.starts_with(' ') || line.is_empty() {
        Classified::Context
    } else if line.starts_with('\\') {
        Classified::NoNewlineMarker
    } else {
        Classified::Unrecognized
    }
}

/// Splits the `a/X b/Y` part of a git header. Output of
/// `git diff --no-prefix` has no prefixes and is split on the first space.
fn split_git_paths(rest: &str) -> (&str, &str) {
    if let Some(old) = rest.strip_prefix("a/")
        && let Some(idx) = old.find(" b/")
    {
        return (&old[..idx], &old[idx + 3..]);
    }
    rest.split_once(' ').unwrap_or((rest, rest))
}

/// `None` means `/dev/null`.
fn file_path<'a>(raw: &'a str, prefix: &str) -> Option<&'a str> {
    // Drop the timestamp `diff -u` appends after a tab.
    let path = raw.split('\t').next().unwrap_or(raw);
    if path == DEV_NULL {
        None
    } else {
        Some(path.strip_prefix(prefix).unwrap_or(path))
    }
}

fn parse_hunk_header(line: &str) -> Option<HunkRange> {
    let caps = HUNK_HEADER.captures(line)?;
    let number = |idx: usize| -> Option<u32> {
        match caps.get(idx) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(1),
        }
    };

    Some(HunkRange {
        old_start: number(1)?,
        old_count: number(2)?,
        new_start: number(3)?,
        new_count: number(4)?,
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Lenient,
    Strict,
}

struct DiffParser {
    mode: Mode,
    files: Vec<DiffFile>,
    current_file: Option<usize>,
    current_hunk: Option<usize>,
    hunk_line_number: usize,
    old_line: u32,
    new_line: u32,
    skipped: Vec<SkippedLine>,
}

impl DiffParser {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            files: Vec::new(),
            current_file: None,
            current_hunk: None,
            hunk_line_number: 0,
            old_line: 0,
            new_line: 0,
            skipped: Vec::new(),
        }
    }

    fn feed(&mut self, line_number: usize, line: &str) -> Result<(), ParseError> {
        match classify(line) {
            Classified::GitHeader { old_path, new_path } => {
                self.check_open_hunk()?;
                self.files.push(DiffFile::new(old_path, new_path));
                self.current_file = Some(self.files.len() - 1);
                self.current_hunk = None;
            }
            Classified::OldPath(path) => {
                if let Some(file) = self.file_mut(line_number, line)? {
                    match path {
                        Some(path) => file.old_path = path.to_string(),
                        None => file.new_file = true,
                    }
                }
            }
            Classified::NewPath(path) => {
                if let Some(file) = self.file_mut(line_number, line)? {
                    match path {
                        Some(path) => file.new_path = path.to_string(),
                        None => file.deleted_file = true,
                    }
                }
            }
            Classified::HunkHeader(range) => {
                self.check_open_hunk()?;
                let Some(file) = self.file_mut(line_number, line)? else {
                    return Ok(());
                };
                file.hunks.push(DiffHunk {
                    header: line.to_string(),
                    old_start: range.old_start,
                    old_count: range.old_count,
                    new_start: range.new_start,
                    new_count: range.new_count,
                    lines: Vec::new(),
                    collapsed: false,
                });
                let hunk_idx = file.hunks.len() - 1;
                self.current_hunk = Some(hunk_idx);
                self.hunk_line_number = line_number;
                self.old_line = range.old_start;
                self.new_line = range.new_start;
            }
            Classified::MalformedHunkHeader => {
                if self.mode == Mode::Strict {
                    return Err(ParseError::MalformedHunkHeader {
                        line_number,
                        text: line.to_string(),
                    });
                }
                self.skip(line_number, SkipReason::MalformedHunkHeader);
            }
            Classified::Binary => {
                if let Some(file) = self.file_mut(line_number, line)? {
                    file.binary = true;
                }
            }
            Classified::RenameFrom(path) => {
                if let Some(file) = self.file_mut(line_number, line)? {
                    file.old_path = path.to_string();
                    file.renamed = true;
                }
            }
            Classified::RenameTo(path) => {
                if let Some(file) = self.file_mut(line_number, line)? {
                    file.new_path = path.to_string();
                    file.renamed = true;
                }
            }
            Classified::Added => {
                let diff_line = DiffLine::new_added(line, self.new_line);
                if self.push_line(line_number, line, diff_line)? {
                    self.new_line = self.new_line.saturating_add(1);
                }
            }
            Classified::Removed => {
                let diff_line = DiffLine::new_removed(line, self.old_line);
                if self.push_line(line_number, line, diff_line)? {
                    self.old_line = self.old_line.saturating_add(1);
                }
            }
            Classified::Context => {
                // Prose around a diff (commit messages, blank separators)
                // looks like context, so it is never a strict-mode error.
                let diff_line = DiffLine::new_context(line, self.old_line, self.new_line);
                let Some(hunk) = self.hunk_mut() else {
                    let reason = self.missing_hunk_reason();
                    self.skip(line_number, reason);
                    return Ok(());
                };
                hunk.lines.push(diff_line);
                self.old_line = self.old_line.saturating_add(1);
                self.new_line = self.new_line.saturating_add(1);
            }
            Classified::NoNewlineMarker => {}
            Classified::Unrecognized => self.skip(line_number, SkipReason::Unrecognized),
        }

        Ok(())
    }

    /// The active file. `None` means the line was out of context and has
    /// been recorded as skipped.
    fn file_mut(
        &mut self,
        line_number: usize,
        line: &str,
    ) -> Result<Option<&mut DiffFile>, ParseError> {
        match self.current_file {
            Some(idx) => Ok(self.files.get_mut(idx)),
            None => {
                self.orphan(line_number, line, SkipReason::NoActiveFile)?;
                Ok(None)
            }
        }
    }

    fn hunk_mut(&mut self) -> Option<&mut DiffHunk> {
        let file = self.files.get_mut(self.current_file?)?;
        file.hunks.get_mut(self.current_hunk?)
    }

    fn missing_hunk_reason(&self) -> SkipReason {
        if self.current_file.is_some() {
            SkipReason::NoActiveHunk
        } else {
            SkipReason::NoActiveFile
        }
    }

    /// Appends to the active hunk. Returns whether the line was kept.
    fn push_line(
        &mut self,
        line_number: usize,
        line: &str,
        diff_line: DiffLine,
    ) -> Result<bool, ParseError> {
        if let Some(hunk) = self.hunk_mut() {
            hunk.lines.push(diff_line);
            return Ok(true);
        }
        let reason = self.missing_hunk_reason();
        self.orphan(line_number, line, reason)?;
        Ok(false)
    }

    /// Out-of-context line: an error in strict mode, a skip otherwise.
    fn orphan(
        &mut self,
        line_number: usize,
        line: &str,
        reason: SkipReason,
    ) -> Result<(), ParseError> {
        if self.mode == Mode::Strict {
            return Err(ParseError::OrphanLine {
                line_number,
                text: line.to_string(),
                context: if reason == SkipReason::NoActiveFile {
                    "file"
                } else {
                    "hunk"
                },
            });
        }
        self.skip(line_number, reason);
        Ok(())
    }

    fn skip(&mut self, line_number: usize, reason: SkipReason) {
        trace!(line_number, ?reason, "skipping diff line");
        self.skipped.push(SkippedLine {
            line_number,
            reason,
        });
    }

    /// In strict mode, verifies the hunk being closed matches its header.
    fn check_open_hunk(&mut self) -> Result<(), ParseError> {
        if self.mode != Mode::Strict {
            return Ok(());
        }
        let line_number = self.hunk_line_number;
        let Some(hunk) = self.hunk_mut() else {
            return Ok(());
        };

        let mut actual_old = 0u32;
        let mut actual_new = 0u32;
        for line in &hunk.lines {
            match line.line_type {
                LineType::Context => {
                    actual_old += 1;
                    actual_new += 1;
                }
                LineType::Deletion => actual_old += 1,
                LineType::Addition => actual_new += 1,
                LineType::Header | LineType::FileHeader => {}
            }
        }

        if actual_old != hunk.old_count || actual_new != hunk.new_count {
            return Err(ParseError::HunkLengthMismatch {
                line_number,
                header: hunk.header.clone(),
                expected_old: hunk.old_count,
                expected_new: hunk.new_count,
                actual_old,
                actual_new,
            });
        }
        Ok(())
    }

    fn finish(mut self, options: &ParseOptions) -> ParseReport {
        if options.word_diff {
            for hunk in self.files.iter_mut().flat_map(|file| file.hunks.iter_mut()) {
                align_hunk(hunk, options.max_align_tokens);
            }
        }

        debug!(
            files = self.files.len(),
            hunks = self.files.iter().map(|f| f.hunks.len()).sum::<usize>(),
            skipped = self.skipped.len(),
            "parsed diff"
        );

        ParseReport {
            files: self.files,
            skipped: self.skipped,
        }
    }
}
