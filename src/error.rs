use thiserror::Error;

/// Reasons [`crate::parser::parse_diff_strict`] rejects its input.
/// Line numbers are 1-based positions in the diff text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line_number}: malformed hunk header `{text}`")]
    MalformedHunkHeader { line_number: usize, text: String },

    #[error("line {line_number}: `{text}` appears outside of any {context}")]
    OrphanLine {
        line_number: usize,
        text: String,
        context: &'static str,
    },

    #[error(
        "line {line_number}: hunk `{header}` declares {expected_old} old / {expected_new} new lines but contains {actual_old} / {actual_new}"
    )]
    HunkLengthMismatch {
        line_number: usize,
        header: String,
        expected_old: u32,
        expected_new: u32,
        actual_old: u32,
        actual_new: u32,
    },
}
