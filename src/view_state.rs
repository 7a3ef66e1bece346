//! Collapse, selection and scrolling over a parsed diff.
//!
//! Every index here addresses the flat row space: one row per file header,
//! then (for an expanded file) one row per hunk header, then (for an expanded
//! hunk) one row per line. [`rows`], [`total_rows`], [`locate`] and
//! [`item_at_index`] all walk in that order, so a renderer painting from
//! [`rows`] shows exactly what the indices refer to.

use crate::diff_file::{DiffFile, DiffHunk, DiffLine};

/// A row of the flat row space, borrowed from the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiffItem<'a> {
    File(&'a DiffFile),
    Hunk(&'a DiffHunk),
    Line(&'a DiffLine),
}

/// Position of a row in the document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRef {
    File { file: usize },
    Hunk { file: usize, hunk: usize },
    Line { file: usize, hunk: usize, line: usize },
}

impl RowRef {
    pub fn resolve(self, files: &[DiffFile]) -> Option<DiffItem<'_>> {
        match self {
            RowRef::File { file } => files.get(file).map(DiffItem::File),
            RowRef::Hunk { file, hunk } => files.get(file)?.hunks.get(hunk).map(DiffItem::Hunk),
            RowRef::Line { file, hunk, line } => files
                .get(file)?
                .hunks
                .get(hunk)?
                .lines
                .get(line)
                .map(DiffItem::Line),
        }
    }

    pub fn file_index(self) -> usize {
        match self {
            RowRef::File { file } | RowRef::Hunk { file, .. } | RowRef::Line { file, .. } => file,
        }
    }
}

pub fn total_rows(files: &[DiffFile]) -> usize {
    files
        .iter()
        .map(|file| {
            if file.collapsed {
                return 1;
            }
            1 + file
                .hunks
                .iter()
                .map(|hunk| if hunk.collapsed { 1 } else { 1 + hunk.lines.len() })
                .sum::<usize>()
        })
        .sum()
}

/// Finds the row at flat index `index` without visiting skipped lines.
pub fn locate(files: &[DiffFile], index: usize) -> Option<RowRef> {
    let mut remaining = index;

    for (file_idx, file) in files.iter().enumerate() {
        if remaining == 0 {
            return Some(RowRef::File { file: file_idx });
        }
        remaining -= 1;
        if file.collapsed {
            continue;
        }

        for (hunk_idx, hunk) in file.hunks.iter().enumerate() {
            if remaining == 0 {
                return Some(RowRef::Hunk {
                    file: file_idx,
                    hunk: hunk_idx,
                });
            }
            remaining -= 1;
            if hunk.collapsed {
                continue;
            }
            if remaining < hunk.lines.len() {
                return Some(RowRef::Line {
                    file: file_idx,
                    hunk: hunk_idx,
                    line: remaining,
                });
            }
            remaining -= hunk.lines.len();
        }
    }

    None
}

pub fn item_at_index(files: &[DiffFile], index: usize) -> Option<DiffItem<'_>> {
    locate(files, index)?.resolve(files)
}

/// Flips the collapsed flag of the file or hunk at `index`. Lines and
/// out-of-range indices are ignored.
pub fn toggle(files: &mut [DiffFile], index: usize) {
    match locate(files, index) {
        Some(RowRef::File { file }) => {
            let file = &mut files[file];
            file.collapsed = !file.collapsed;
        }
        Some(RowRef::Hunk { file, hunk }) => {
            let hunk = &mut files[file].hunks[hunk];
            hunk.collapsed = !hunk.collapsed;
        }
        Some(RowRef::Line { .. }) | None => {}
    }
}

pub fn collapse_all(files: &mut [DiffFile]) {
    set_collapsed(files, true);
}

pub fn expand_all(files: &mut [DiffFile]) {
    set_collapsed(files, false);
}

fn set_collapsed(files: &mut [DiffFile], collapsed: bool) {
    for file in files.iter_mut() {
        file.collapsed = collapsed;
        for hunk in file.hunks.iter_mut() {
            hunk.collapsed = collapsed;
        }
    }
}

/// Iterator over the visible rows, in flat index order.
pub fn rows(files: &[DiffFile]) -> Rows<'_> {
    Rows {
        files,
        next: Some(RowRef::File { file: 0 }),
    }
}

pub struct Rows<'a> {
    files: &'a [DiffFile],
    next: Option<RowRef>,
}

impl<'a> Rows<'a> {
    /// First visible row after everything under `file` (inclusive of `hunk`
    /// when given).
    fn after(&self, file: usize, hunk: Option<usize>) -> Option<RowRef> {
        let next_hunk = hunk.map_or(0, |h| h + 1);
        match &self.files[file] {
            f if !f.collapsed && next_hunk < f.hunks.len() => Some(RowRef::Hunk {
                file,
                hunk: next_hunk,
            }),
            _ if file + 1 < self.files.len() => Some(RowRef::File { file: file + 1 }),
            _ => None,
        }
    }

    fn successor(&self, row: RowRef) -> Option<RowRef> {
        match row {
            RowRef::File { file } => self.after(file, None),
            RowRef::Hunk { file, hunk } => {
                let h = &self.files[file].hunks[hunk];
                if !h.collapsed && !h.lines.is_empty() {
                    Some(RowRef::Line { file, hunk, line: 0 })
                } else {
                    self.after(file, Some(hunk))
                }
            }
            RowRef::Line { file, hunk, line } => {
                if line + 1 < self.files[file].hunks[hunk].lines.len() {
                    Some(RowRef::Line {
                        file,
                        hunk,
                        line: line + 1,
                    })
                } else {
                    self.after(file, Some(hunk))
                }
            }
        }
    }
}

impl<'a> Iterator for Rows<'a> {
    type Item = (RowRef, DiffItem<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.next?;
        let item = row.resolve(self.files)?;
        self.next = self.successor(row);
        Some((row, item))
    }
}

/// Flat index of the next row after `from` matching `pred`.
fn find_forward(files: &[DiffFile], from: usize, pred: impl Fn(RowRef) -> bool) -> Option<usize> {
    rows(files)
        .enumerate()
        .skip(from + 1)
        .find(|(_, (row, _))| pred(*row))
        .map(|(idx, _)| idx)
}

fn find_backward(files: &[DiffFile], from: usize, pred: impl Fn(RowRef) -> bool) -> Option<usize> {
    rows(files)
        .enumerate()
        .take(from)
        .filter(|(_, (row, _))| pred(*row))
        .map(|(idx, _)| idx)
        .last()
}

fn is_file(row: RowRef) -> bool {
    matches!(row, RowRef::File { .. })
}

fn is_hunk(row: RowRef) -> bool {
    matches!(row, RowRef::Hunk { .. })
}

pub fn next_file_row(files: &[DiffFile], from: usize) -> Option<usize> {
    find_forward(files, from, is_file)
}

pub fn prev_file_row(files: &[DiffFile], from: usize) -> Option<usize> {
    find_backward(files, from, is_file)
}

pub fn next_hunk_row(files: &[DiffFile], from: usize) -> Option<usize> {
    find_forward(files, from, is_hunk)
}

pub fn prev_hunk_row(files: &[DiffFile], from: usize) -> Option<usize> {
    find_backward(files, from, is_hunk)
}

/// Selection and scroll position for one open diff view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewState {
    pub selected_index: usize,
    pub scroll_offset: usize,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to the first row, used whenever a new document replaces the
    /// old one.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Moves by `delta` rows, holding at either end.
    pub fn move_selection(&mut self, delta: isize, total_rows: usize) {
        let last = total_rows.saturating_sub(1);
        let target = self.selected_index.saturating_add_signed(delta);
        self.selected_index = target.min(last);
    }

    pub fn page_down(&mut self, viewport_height: usize, total_rows: usize) {
        let step = viewport_height.saturating_sub(1);
        self.move_selection(isize::try_from(step).unwrap_or(isize::MAX), total_rows);
    }

    pub fn page_up(&mut self, viewport_height: usize, total_rows: usize) {
        let step = viewport_height.saturating_sub(1);
        self.move_selection(-isize::try_from(step).unwrap_or(isize::MAX), total_rows);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self, total_rows: usize) {
        self.selected_index = total_rows.saturating_sub(1);
    }

    pub fn select(&mut self, index: usize, total_rows: usize) {
        self.selected_index = index.min(total_rows.saturating_sub(1));
    }

    /// Pulls the selection back inside the row space after it shrank.
    pub fn clamp(&mut self, total_rows: usize) {
        self.move_selection(0, total_rows);
    }

    /// Scrolls as little as possible so the selected row is on screen.
    pub fn ensure_visible(&mut self, viewport_height: usize) {
        if self.selected_index < self.scroll_offset {
            self.scroll_offset = self.selected_index;
        } else if viewport_height > 0 && self.selected_index >= self.scroll_offset + viewport_height
        {
            self.scroll_offset = self.selected_index + 1 - viewport_height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_diff;

    const TWO_FILES: &str = "\
diff --git a/a.txt b/a.txt
--- a/a.txt
+++ b/a.txt
@@ -1,2 +1,2 @@
-one
+uno
 two
@@ -10,1 +10,2 @@
 ten
+eleven
diff --git a/b.txt b/b.txt
--- a/b.txt
+++ b/b.txt
@@ -1 +1 @@
-x
+y
";

    fn doc() -> Vec<DiffFile> {
        parse_diff(TWO_FILES)
    }

    #[test]
    fn test_total_rows_expanded() {
        // 2 files + 3 hunks + 7 lines
        assert_eq!(total_rows(&doc()), 12);
        assert_eq!(total_rows(&[]), 0);
    }

    #[test]
    fn test_item_at_index_walk_order() {
        let files = doc();
        assert!(matches!(item_at_index(&files, 0), Some(DiffItem::File(f)) if f.new_path == "a.txt"));
        assert!(matches!(item_at_index(&files, 1), Some(DiffItem::Hunk(h)) if h.old_start == 1));
        assert!(matches!(item_at_index(&files, 2), Some(DiffItem::Line(l)) if l.content == "one"));
        assert!(matches!(item_at_index(&files, 5), Some(DiffItem::Hunk(h)) if h.old_start == 10));
        assert!(matches!(item_at_index(&files, 8), Some(DiffItem::File(f)) if f.new_path == "b.txt"));
        assert!(matches!(item_at_index(&files, 11), Some(DiffItem::Line(l)) if l.content == "y"));
        assert_eq!(item_at_index(&files, 12), None);
    }

    #[test]
    fn test_rows_agree_with_item_at_index() {
        let mut files = doc();
        for toggled in [None, Some(1), Some(0), Some(8)] {
            if let Some(i) = toggled {
                toggle(&mut files, i);
            }
            let walked: Vec<_> = rows(&files).collect();
            assert_eq!(walked.len(), total_rows(&files));
            for (i, (row, item)) in walked.iter().enumerate() {
                assert_eq!(locate(&files, i), Some(*row));
                assert_eq!(item_at_index(&files, i), Some(*item));
            }
        }
    }

    #[test]
    fn test_collapse_file_removes_hunks_and_lines() {
        let mut files = doc();
        let before = total_rows(&files);
        toggle(&mut files, 0);
        assert!(files[0].collapsed);
        // 2 hunks + 5 lines disappear
        assert_eq!(total_rows(&files), before - 7);

        toggle(&mut files, 0);
        assert_eq!(total_rows(&files), before);
    }

    #[test]
    fn test_collapse_hunk_removes_its_lines() {
        let mut files = doc();
        let before = total_rows(&files);
        toggle(&mut files, 1);
        assert!(files[0].hunks[0].collapsed);
        assert_eq!(total_rows(&files), before - 3);
        assert!(matches!(item_at_index(&files, 2), Some(DiffItem::Hunk(h)) if h.old_start == 10));
    }

    #[test]
    fn test_toggle_line_is_noop() {
        let mut files = doc();
        let before = files.clone();
        toggle(&mut files, 2);
        toggle(&mut files, 999);
        assert_eq!(files, before);
    }

    #[test]
    fn test_collapse_and_expand_all() {
        let mut files = doc();
        collapse_all(&mut files);
        assert_eq!(total_rows(&files), 2);
        assert!(files.iter().all(|f| f.hunks.iter().all(|h| h.collapsed)));

        // Expanding a file keeps its hunks collapsed.
        toggle(&mut files, 0);
        assert_eq!(total_rows(&files), 4);

        expand_all(&mut files);
        assert_eq!(total_rows(&files), 12);
    }

    #[test]
    fn test_move_selection_clamps() {
        let mut view = ViewState::new();
        view.move_selection(-3, 10);
        assert_eq!(view.selected_index, 0);
        view.move_selection(4, 10);
        assert_eq!(view.selected_index, 4);
        view.move_selection(100, 10);
        assert_eq!(view.selected_index, 9);
        view.move_selection(1, 10);
        assert_eq!(view.selected_index, 9);

        view.move_selection(5, 0);
        assert_eq!(view.selected_index, 0);
    }

    #[test]
    fn test_paging() {
        let mut view = ViewState::new();
        view.page_down(5, 20);
        assert_eq!(view.selected_index, 4);
        view.page_down(5, 20);
        assert_eq!(view.selected_index, 8);
        view.page_up(5, 20);
        assert_eq!(view.selected_index, 4);
        view.page_up(5, 20);
        view.page_up(5, 20);
        assert_eq!(view.selected_index, 0);
    }

    #[test]
    fn test_ensure_visible() {
        let mut view = ViewState::new();
        view.select(12, 30);
        view.ensure_visible(5);
        assert_eq!(view.scroll_offset, 8);

        view.select(10, 30);
        view.ensure_visible(5);
        assert_eq!(view.scroll_offset, 8);

        view.select(3, 30);
        view.ensure_visible(5);
        assert_eq!(view.scroll_offset, 3);
    }

    #[test]
    fn test_clamp_after_collapse_all() {
        let mut files = doc();
        let mut view = ViewState::new();
        view.select_last(total_rows(&files));
        assert_eq!(view.selected_index, 11);

        collapse_all(&mut files);
        view.clamp(total_rows(&files));
        assert_eq!(view.selected_index, 1);
    }

    #[test]
    fn test_file_and_hunk_jumps() {
        let files = doc();
        assert_eq!(next_file_row(&files, 0), Some(8));
        assert_eq!(next_file_row(&files, 8), None);
        assert_eq!(prev_file_row(&files, 8), Some(0));
        assert_eq!(prev_file_row(&files, 0), None);

        assert_eq!(next_hunk_row(&files, 0), Some(1));
        assert_eq!(next_hunk_row(&files, 1), Some(5));
        assert_eq!(next_hunk_row(&files, 5), Some(9));
        assert_eq!(prev_hunk_row(&files, 9), Some(5));
    }
}
