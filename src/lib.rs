//! Unified diff engine: a lenient parser, a File → Hunk → Line model with
//! word-level change spans, and collapsible view state addressed by flat
//! row index.

pub mod diff_file;
pub mod error;
pub mod parser;
pub mod view_state;
pub mod word_diff;


pub use diff_file::{
    ChangeKind, DiffFile, DiffHunk, DiffLine, Document, LineType, WordChange, total_additions,
    total_deletions,
};
pub use error::ParseError;
pub use parser::{
    ParseOptions, ParseReport, SkipReason, SkippedLine, parse_diff, parse_diff_report,
    parse_diff_strict, parse_diff_with,
};
pub use view_state::{
    DiffItem, RowRef, ViewState, collapse_all, expand_all, item_at_index, locate, rows, toggle,
    total_rows,
};
