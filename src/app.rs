use std::{io::Read, path::PathBuf, process::Command};

use anyhow::{Context, Result, bail};
use difftree::{
    DiffFile, ParseOptions, ViewState, collapse_all, expand_all, parse_diff_report, toggle,
    total_rows,
    view_state::{next_file_row, next_hunk_row, prev_file_row, prev_hunk_row},
};
use tracing::{debug, info};

/// Where the diff text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffSource {
    /// Arguments for `git diff`, split on whitespace.
    Git(String),
    File(PathBuf),
    Stdin,
    /// Already in memory; reloading keeps the same text.
    Text(String),
}

impl DiffSource {
    fn read(&self) -> Result<String> {
        match self {
            DiffSource::Git(args) => {
                let mut cmd = Command::new("git");
                cmd.arg("diff").arg("--no-color");

                for arg in args.split_whitespace() {
                    cmd.arg(arg);
                }

                let output = cmd.output().context("failed to run git diff")?;
                if !output.status.success() {
                    bail!(
                        "git diff exited with {}: {}",
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    );
                }
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            DiffSource::File(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read diff from {}", path.display())),
            DiffSource::Stdin => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .context("failed to read diff from stdin")?;
                Ok(text)
            }
            DiffSource::Text(text) => Ok(text.clone()),
        }
    }
}

pub struct App {
    pub files: Vec<DiffFile>,
    pub view: ViewState,
    pub viewport_height: usize,
    pub horizontal_scroll_offset: usize,
    pub show_shortcuts: bool,
    pub start_collapsed: bool,
    options: ParseOptions,
    source: DiffSource,
}

impl App {
    pub fn new(source: DiffSource, options: ParseOptions) -> Self {
        Self {
            files: Vec::new(),
            view: ViewState::new(),
            viewport_height: 1,
            horizontal_scroll_offset: 0,
            show_shortcuts: true,
            start_collapsed: false,
            options,
            source,
        }
    }

    pub fn load_diff(&mut self) -> Result<()> {
        let diff_text = self.source.read()?;
        self.set_document(&diff_text);
        if self.source == DiffSource::Stdin {
            // stdin can only be read once; reloads reuse the text.
            self.source = DiffSource::Text(diff_text);
        }
        info!(
            files = self.files.len(),
            rows = self.total_rows(),
            "loaded diff"
        );
        Ok(())
    }

    pub fn reload(&mut self) -> Result<()> {
        debug!("reloading diff");
        self.load_diff()
    }

    /// Replaces the document and resets selection and scrolling.
    pub fn set_document(&mut self, diff_text: &str) {
        let report = parse_diff_report(diff_text, &self.options);
        if !report.skipped.is_empty() {
            debug!(skipped = report.skipped.len(), "ignored lines while parsing");
        }

        self.files = report.files;
        if self.start_collapsed {
            collapse_all(&mut self.files);
        }
        self.view.reset();
        self.horizontal_scroll_offset = 0;
    }

    pub fn total_rows(&self) -> usize {
        total_rows(&self.files)
    }

    pub fn move_selection(&mut self, delta: isize) {
        let total = self.total_rows();
        self.view.move_selection(delta, total);
    }

    pub fn page_down(&mut self) {
        let total = self.total_rows();
        self.view.page_down(self.viewport_height, total);
    }

    pub fn page_up(&mut self) {
        let total = self.total_rows();
        self.view.page_up(self.viewport_height, total);
    }

    pub fn select_first(&mut self) {
        self.view.select_first();
    }

    pub fn select_last(&mut self) {
        let total = self.total_rows();
        self.view.select_last(total);
    }

    pub fn toggle_selected(&mut self) {
        toggle(&mut self.files, self.view.selected_index);
        let total = self.total_rows();
        self.view.clamp(total);
    }

    pub fn collapse_all(&mut self) {
        collapse_all(&mut self.files);
        let total = self.total_rows();
        self.view.clamp(total);
    }

    pub fn expand_all(&mut self) {
        expand_all(&mut self.files);
        let total = self.total_rows();
        self.view.clamp(total);
    }

    pub fn next_file(&mut self) {
        if let Some(row) = next_file_row(&self.files, self.view.selected_index) {
            self.view.selected_index = row;
        }
    }

    pub fn previous_file(&mut self) {
        if let Some(row) = prev_file_row(&self.files, self.view.selected_index) {
            self.view.selected_index = row;
        }
    }

    pub fn next_hunk(&mut self) {
        if let Some(row) = next_hunk_row(&self.files, self.view.selected_index) {
            self.view.selected_index = row;
        }
    }

    pub fn previous_hunk(&mut self) {
        if let Some(row) = prev_hunk_row(&self.files, self.view.selected_index) {
            self.view.selected_index = row;
        }
    }

    pub fn scroll_right(&mut self, amount: usize) {
        self.horizontal_scroll_offset = self.horizontal_scroll_offset.saturating_add(amount);
    }

    pub fn scroll_left(&mut self, amount: usize) {
        self.horizontal_scroll_offset = self.horizontal_scroll_offset.saturating_sub(amount);
    }

    pub fn toggle_shortcuts(&mut self) {
        self.show_shortcuts = !self.show_shortcuts;
    }

    /// Keeps the selection on screen for the given number of diff rows.
    pub fn sync_viewport(&mut self, viewport_height: usize) {
        self.viewport_height = viewport_height.max(1);
        self.view.ensure_visible(self.viewport_height);
    }
}
