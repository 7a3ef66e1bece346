use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
};

use difftree::{DiffLine, LineType, WordChange};

pub const ADDED_BG: Color = Color::Rgb(0, 100, 0);
pub const ADDED_DIM_BG: Color = Color::Rgb(0, 60, 0);
pub const REMOVED_BG: Color = Color::Rgb(139, 0, 0);
pub const REMOVED_DIM_BG: Color = Color::Rgb(80, 0, 0);

/// Splits `content` into spans, giving the bytes covered by `changes` the
/// `highlight` style and everything else `base`.
///
/// `changes` must be sorted and non-overlapping, which the parser
/// guarantees.
pub fn highlight_changes<'a>(
    content: &'a str,
    changes: &[WordChange],
    base: Style,
    highlight: Style,
) -> Vec<Span<'a>> {
    if changes.is_empty() {
        return vec![Span::styled(content, base)];
    }

    let mut spans = Vec::new();
    let mut last_processed = 0;

    for change in changes {
        let range = change.range();
        if range.end > content.len() || range.start < last_processed {
            continue;
        }

        if range.start > last_processed {
            spans.push(Span::styled(&content[last_processed..range.start], base));
        }

        // Neighbouring changed tokens read better as one span.
        match spans.last_mut() {
            Some(last) if last.style == highlight && range.start == last_processed => {
                let merged_start = range.start - last.content.len();
                *last = Span::styled(&content[merged_start..range.end], highlight);
            }
            _ => spans.push(Span::styled(&content[range.clone()], highlight)),
        }

        last_processed = range.end;
    }

    if last_processed < content.len() {
        spans.push(Span::styled(&content[last_processed..], base));
    }

    spans
}

/// Prefix and styles for a line body: (prefix, base, changed-word).
pub fn line_styles(line: &DiffLine) -> (&'static str, Style, Style) {
    let paired = !line.word_changes.is_empty();
    match line.line_type {
        LineType::Addition => {
            let base_bg = if paired { ADDED_DIM_BG } else { ADDED_BG };
            (
                "+ ",
                Style::default().fg(Color::White).bg(base_bg),
                Style::default()
                    .fg(Color::White)
                    .bg(ADDED_BG)
                    .add_modifier(Modifier::BOLD),
            )
        }
        LineType::Deletion => {
            let base_bg = if paired { REMOVED_DIM_BG } else { REMOVED_BG };
            (
                "- ",
                Style::default().fg(Color::White).bg(base_bg),
                Style::default()
                    .fg(Color::White)
                    .bg(REMOVED_BG)
                    .add_modifier(Modifier::BOLD),
            )
        }
        LineType::Context => ("  ", Style::default(), Style::default()),
        LineType::Header => {
            let style = Style::default().fg(Color::Cyan);
            ("@ ", style, style)
        }
        LineType::FileHeader => {
            let style = Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD);
            ("", style, style)
        }
    }
}
