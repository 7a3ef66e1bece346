/// The parsed diff: every file, in the order it appeared in the input.
pub type Document = Vec<DiffFile>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffFile {
    pub old_path: String,
    pub new_path: String,
    pub hunks: Vec<DiffHunk>,
    pub collapsed: bool,
    pub binary: bool,
    pub new_file: bool,
    pub deleted_file: bool,
    pub renamed: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffHunk {
    /// Raw `@@ -a,b +c,d @@ section` text.
    pub header: String,
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub lines: Vec<DiffLine>,
    pub collapsed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiffLine {
    pub line_type: LineType,
    pub old_line: Option<u32>,
    pub new_line: Option<u32>,
    pub content: String,
    pub word_changes: Vec<WordChange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Context,
    Addition,
    Deletion,
    Header,
    FileHeader,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Addition,
    Deletion,
}

/// A changed token inside a line. `start` and `len` are byte offsets into
/// [`DiffLine::content`] and always fall on char boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordChange {
    pub start: usize,
    pub len: usize,
    pub kind: ChangeKind,
}

impl WordChange {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

impl DiffFile {
    pub fn new(old_path: &str, new_path: &str) -> Self {
        Self {
            old_path: old_path.to_string(),
            new_path: new_path.to_string(),
            ..Self::default()
        }
    }

    pub fn additions(&self) -> usize {
        self.hunks.iter().map(DiffHunk::additions).sum()
    }

    pub fn deletions(&self) -> usize {
        self.hunks.iter().map(DiffHunk::deletions).sum()
    }

    pub fn line_count(&self) -> usize {
        self.hunks.iter().map(|hunk| hunk.lines.len()).sum()
    }

    /// Path to show for this file. Renames show both sides, deleted files
    /// keep their old name, everything else prefers the new path.
    pub fn display_path(&self) -> String {
        if self.renamed {
            format!("{} → {}", self.old_path, self.new_path)
        } else if self.deleted_file {
            self.old_path.clone()
        } else if !self.new_path.is_empty() {
            self.new_path.clone()
        } else {
            self.old_path.clone()
        }
    }

    pub fn status(&self) -> char {
        if self.renamed {
            'R'
        } else if self.new_file {
            'A'
        } else if self.deleted_file {
            'D'
        } else if self.binary {
            'B'
        } else {
            'M'
        }
    }

    pub fn header_line(&self) -> DiffLine {
        DiffLine::new_file_header(&self.display_path())
    }
}

impl DiffHunk {
    pub fn additions(&self) -> usize {
        self.count(LineType::Addition)
    }

    pub fn deletions(&self) -> usize {
        self.count(LineType::Deletion)
    }

    /// Text following the closing `@@`, usually the enclosing function.
    pub fn section(&self) -> Option<&str> {
        let rest = self.header.strip_prefix("@@")?;
        let (_, section) = rest.split_once("@@")?;
        let section = section.trim();
        (!section.is_empty()).then_some(section)
    }

    pub fn header_line(&self) -> DiffLine {
        DiffLine::new_header(&self.header)
    }

    fn count(&self, line_type: LineType) -> usize {
        self.lines
            .iter()
            .filter(|line| line.line_type == line_type)
            .count()
    }
}

impl DiffLine {
    pub fn new_header(line: &str) -> Self {
        Self::bare(LineType::Header, line)
    }

    pub fn new_file_header(line: &str) -> Self {
        Self::bare(LineType::FileHeader, line)
    }

    /// `line` is the raw diff line; its `+` prefix is dropped.
    pub fn new_added(line: &str, line_number: u32) -> Self {
        Self {
            new_line: Some(line_number),
            ..Self::bare(LineType::Addition, strip_marker(line))
        }
    }

    pub fn new_removed(line: &str, line_number: u32) -> Self {
        Self {
            old_line: Some(line_number),
            ..Self::bare(LineType::Deletion, strip_marker(line))
        }
    }

    /// Accepts both ` text` and the empty line some tools emit for blank
    /// context.
    pub fn new_context(line: &str, old_line: u32, new_line: u32) -> Self {
        Self {
            old_line: Some(old_line),
            new_line: Some(new_line),
            ..Self::bare(LineType::Context, strip_marker(line))
        }
    }

    fn bare(line_type: LineType, content: &str) -> Self {
        Self {
            line_type,
            old_line: None,
            new_line: None,
            content: content.to_string(),
            word_changes: Vec::new(),
        }
    }
}

fn strip_marker(line: &str) -> &str {
    let mut chars = line.chars();
    chars.next();
    chars.as_str()
}

pub fn total_additions(files: &[DiffFile]) -> usize {
    files.iter().map(DiffFile::additions).sum()
}

pub fn total_deletions(files: &[DiffFile]) -> usize {
    files.iter().map(DiffFile::deletions).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hunk(lines: Vec<DiffLine>) -> DiffHunk {
        DiffHunk {
            header: "@@ -1,3 +1,3 @@ fn main()".to_string(),
            old_start: 1,
            old_count: 3,
            new_start: 1,
            new_count: 3,
            lines,
            collapsed: false,
        }
    }

    #[test]
    fn test_counts_sum_over_hunks() {
        let mut file = DiffFile::new("src/lib.rs", "src/lib.rs");
        file.hunks.push(hunk(vec![
            DiffLine::new_removed("-a", 1),
            DiffLine::new_added("+b", 1),
            DiffLine::new_added("+c", 2),
            DiffLine::new_context(" d", 2, 3),
        ]));
        file.hunks.push(hunk(vec![DiffLine::new_removed("-e", 10)]));

        assert_eq!(file.hunks[0].additions(), 2);
        assert_eq!(file.hunks[0].deletions(), 1);
        assert_eq!(file.additions(), 2);
        assert_eq!(file.deletions(), 2);
        assert_eq!(file.line_count(), 5);

        let other = file.clone();
        let files = vec![file, other];
        assert_eq!(total_additions(&files), 4);
        assert_eq!(total_deletions(&files), 4);
    }

    #[test]
    fn test_display_path_priority() {
        let mut file = DiffFile::new("old.rs", "new.rs");
        assert_eq!(file.display_path(), "new.rs");

        file.deleted_file = true;
        assert_eq!(file.display_path(), "old.rs");

        file.renamed = true;
        assert_eq!(file.display_path(), "old.rs → new.rs");

        let only_old = DiffFile::new("gone.rs", "");
        assert_eq!(only_old.display_path(), "gone.rs");
    }

    #[test]
    fn test_status() {
        let mut file = DiffFile::new("a", "a");
        assert_eq!(file.status(), 'M');
        file.binary = true;
        assert_eq!(file.status(), 'B');
        file.deleted_file = true;
        assert_eq!(file.status(), 'D');
        file.new_file = true;
        assert_eq!(file.status(), 'A');
        file.renamed = true;
        assert_eq!(file.status(), 'R');
    }

    #[test]
    fn test_line_constructors() {
        let added = DiffLine::new_added("+let x = 1;", 7);
        assert_eq!(added.content, "let x = 1;");
        assert_eq!(added.new_line, Some(7));
        assert_eq!(added.old_line, None);

        let blank = DiffLine::new_context("", 3, 4);
        assert_eq!(blank.content, "");
        assert_eq!((blank.old_line, blank.new_line), (Some(3), Some(4)));
    }

    #[test]
    fn test_hunk_section() {
        let h = hunk(Vec::new());
        assert_eq!(h.section(), Some("fn main()"));
        assert_eq!(h.header_line().line_type, LineType::Header);

        let bare = DiffHunk {
            header: "@@ -1 +1 @@".to_string(),
            ..DiffHunk::default()
        };
        assert_eq!(bare.section(), None);
    }
}
