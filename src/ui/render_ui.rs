use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

use difftree::locate;

use crate::{
    app::App,
    ui::{footer::render_footer, unified_diff::render_unified_diff},
};

struct Areas {
    files: Rect,
    diff: Rect,
    footer: Option<Rect>,
}

fn split_areas(size: Rect, show_shortcuts: bool) -> Areas {
    // Main layout with optional footer
    let (content_area, footer_area) = if show_shortcuts {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(size);
        (main_chunks[0], Some(main_chunks[1]))
    } else {
        (size, None)
    };

    // Content layout (file list and diff)
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(0)])
        .split(content_area);

    Areas {
        files: chunks[0],
        diff: chunks[1],
        footer: footer_area,
    }
}

/// Number of diff rows visible inside the bordered diff panel.
pub fn diff_viewport_height(size: Rect, show_shortcuts: bool) -> usize {
    split_areas(size, show_shortcuts).diff.height.saturating_sub(2) as usize
}

pub fn ui(f: &mut Frame, app: &App) {
    let areas = split_areas(f.area(), app.show_shortcuts);

    // File list
    let files: Vec<ListItem> = app
        .files
        .iter()
        .map(|file| {
            let status_color = match file.status() {
                'A' => Color::Green,
                'D' => Color::Red,
                'M' => Color::Yellow,
                'R' => Color::Magenta,
                _ => Color::White,
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", file.status()),
                    Style::default()
                        .fg(status_color)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(file.display_path()),
            ]))
        })
        .collect();

    let files_list = List::new(files)
        .block(Block::default().borders(Borders::ALL).title("Files"))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    let mut file_list_state = ListState::default();
    file_list_state.select(locate(&app.files, app.view.selected_index).map(|row| row.file_index()));
    f.render_stateful_widget(files_list, areas.files, &mut file_list_state);

    render_unified_diff(f, areas.diff, app);

    // Footer with keyboard shortcuts (if enabled)
    if let Some(footer_area) = areas.footer {
        render_footer(f, footer_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_height_accounts_for_footer_and_borders() {
        let size = Rect::new(0, 0, 120, 40);
        assert_eq!(diff_viewport_height(size, true), 35);
        assert_eq!(diff_viewport_height(size, false), 38);
        assert_eq!(diff_viewport_height(Rect::new(0, 0, 10, 1), false), 0);
    }
}
