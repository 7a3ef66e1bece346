use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};

use difftree::{DiffFile, DiffHunk, DiffItem, DiffLine, rows, total_additions, total_deletions};

use crate::{
    app::App,
    ui::diff_utils::{highlight_changes, line_styles},
};

const GUTTER_WIDTH: usize = 10;

pub fn render_unified_diff(f: &mut Frame, area: Rect, app: &App) {
    let visible_lines = area.height.saturating_sub(2) as usize; // Account for borders
    let total_lines = app.total_rows();

    let lines: Vec<Line> = rows(&app.files)
        .enumerate()
        .skip(app.view.scroll_offset)
        .take(visible_lines)
        .map(|(index, (_, item))| {
            let line = match item {
                DiffItem::File(file) => render_file_row(file),
                DiffItem::Hunk(hunk) => render_hunk_row(hunk),
                DiffItem::Line(diff_line) => render_diff_line(diff_line),
            };
            if index == app.view.selected_index {
                line.patch_style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                line
            }
        })
        .collect();

    let title = format!(
        "Diff  +{} -{}",
        total_additions(&app.files),
        total_deletions(&app.files)
    );
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((0, u16::try_from(app.horizontal_scroll_offset).unwrap_or(u16::MAX)));

    f.render_widget(paragraph, area);

    // Render scrollbar
    if total_lines > visible_lines {
        let mut scrollbar_state =
            ScrollbarState::new(total_lines).position(app.view.selected_index);

        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));

        f.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn fold_marker(collapsed: bool) -> &'static str {
    if collapsed { "▸ " } else { "▾ " }
}

fn render_file_row(file: &DiffFile) -> Line<'_> {
    let header = file.header_line();
    let (_, style, _) = line_styles(&header);

    let mut spans = vec![
        Span::styled(fold_marker(file.collapsed), style),
        Span::styled(header.content, style),
        Span::styled(
            format!("  +{}", file.additions()),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            format!(" -{}", file.deletions()),
            Style::default().fg(Color::Red),
        ),
    ];

    let flags = [
        (file.new_file, " [new]"),
        (file.deleted_file, " [deleted]"),
        (file.renamed, " [renamed]"),
        (file.binary, " [binary]"),
    ];
    for (_, label) in flags.iter().filter(|(set, _)| *set) {
        spans.push(Span::styled(*label, Style::default().fg(Color::DarkGray)));
    }

    Line::from(spans)
}

fn render_hunk_row(hunk: &DiffHunk) -> Line<'_> {
    let header = hunk.header_line();
    let (_, style, _) = line_styles(&header);

    Line::from(vec![
        Span::raw("  "),
        Span::styled(fold_marker(hunk.collapsed), style),
        Span::styled(header.content, style),
    ])
}

fn render_diff_line(diff_line: &DiffLine) -> Line<'_> {
    let line_num_text = match (diff_line.old_line, diff_line.new_line) {
        (Some(old), Some(new)) => format!("{:4}:{:4} ", old, new),
        (Some(old), None) => format!("{:4}:     ", old),
        (None, Some(new)) => format!("     {:4} ", new),
        (None, None) => " ".repeat(GUTTER_WIDTH),
    };

    let (prefix, base, highlight) = line_styles(diff_line);

    let mut spans = vec![
        Span::raw("    "),
        Span::styled(line_num_text, Style::default().fg(Color::DarkGray)),
        Span::styled(prefix, base),
    ];
    spans.extend(highlight_changes(
        &diff_line.content,
        &diff_line.word_changes,
        base,
        highlight,
    ));

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use difftree::parse_diff;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_row_rendering() {
        let files = parse_diff(
            "diff --git a/x.rs b/x.rs\n--- /dev/null\n+++ b/x.rs\n@@ -0,0 +1 @@\n+fn x() {}\n",
        );

        assert_eq!(text(&render_file_row(&files[0])), "▾ x.rs  +1 -0 [new]");
        assert_eq!(text(&render_hunk_row(&files[0].hunks[0])), "  ▾ @@ -0,0 +1 @@");
        assert_eq!(
            text(&render_diff_line(&files[0].hunks[0].lines[0])),
            "            1 + fn x() {}"
        );
    }
}
