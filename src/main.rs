use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::{
    fs::File,
    io::{self, Write},
    path::PathBuf,
    sync::Mutex,
};
use tracing_subscriber::EnvFilter;

use difftree::{ParseOptions, total_additions, total_deletions};

use crate::app::{App, DiffSource};

mod app;
mod ui;

const HORIZONTAL_STEP: usize = 4;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Git diff arguments (e.g., "HEAD~1", "main..feature")
    #[arg(default_value = "")]
    diff_args: String,

    /// Read the diff from a file instead of running git
    #[arg(short, long, conflicts_with = "stdin")]
    file: Option<PathBuf>,

    /// Read the diff from standard input
    #[arg(long)]
    stdin: bool,

    /// Start with every file and hunk collapsed
    #[arg(long)]
    collapsed: bool,

    /// Disable word-level highlighting of changed lines
    #[arg(long)]
    no_word_diff: bool,

    /// Skip word-level alignment for lines with more tokens than this
    #[arg(long, value_name = "N")]
    max_align_tokens: Option<usize>,

    /// Print per-file addition/deletion counts and exit
    #[arg(long)]
    stat: bool,

    /// Write log output to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn source(&self) -> DiffSource {
        if let Some(path) = &self.file {
            DiffSource::File(path.clone())
        } else if self.stdin {
            DiffSource::Stdin
        } else {
            DiffSource::Git(self.diff_args.clone())
        }
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            word_diff: !self.no_word_diff,
            max_align_tokens: self.max_align_tokens,
        }
    }
}

/// The TUI owns the terminal, so logs go to `--log-file` when running
/// interactively and to stderr only in `--stat` mode.
fn init_logging(args: &Args) -> Result<()> {
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("difftree={level}")));

    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if args.stat {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }

    Ok(())
}

fn print_stat(app: &App) -> Result<()> {
    let mut stdout = io::stdout().lock();
    for file in &app.files {
        writeln!(
            stdout,
            "{} {:>5} {:>5}  {}",
            file.status(),
            format!("+{}", file.additions()),
            format!("-{}", file.deletions()),
            file.display_path()
        )?;
    }
    writeln!(
        stdout,
        "{} files changed, {} insertions(+), {} deletions(-)",
        app.files.len(),
        total_additions(&app.files),
        total_deletions(&app.files)
    )?;
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    loop {
        let size = terminal.size()?;
        let area = ratatui::layout::Rect::new(0, 0, size.width, size.height);
        app.sync_viewport(ui::diff_viewport_height(area, app.show_shortcuts));

        terminal.draw(|f| ui::ui(f, &app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('j') | KeyCode::Down => app.move_selection(1),
                KeyCode::Char('k') | KeyCode::Up => app.move_selection(-1),
                KeyCode::Char('d') | KeyCode::PageDown => app.page_down(),
                KeyCode::Char('u') | KeyCode::PageUp => app.page_up(),
                KeyCode::Char('g') | KeyCode::Home => app.select_first(),
                KeyCode::Char('G') | KeyCode::End => app.select_last(),
                KeyCode::Enter | KeyCode::Char(' ') => app.toggle_selected(),
                KeyCode::Char('c') => app.collapse_all(),
                KeyCode::Char('e') => app.expand_all(),
                KeyCode::Char('n') => app.next_file(),
                KeyCode::Char('p') => app.previous_file(),
                KeyCode::Char(']') => app.next_hunk(),
                KeyCode::Char('[') => app.previous_hunk(),
                KeyCode::Char('l') | KeyCode::Right => app.scroll_right(HORIZONTAL_STEP),
                KeyCode::Char('h') | KeyCode::Left => app.scroll_left(HORIZONTAL_STEP),
                KeyCode::Char('L') => app.scroll_right(HORIZONTAL_STEP * 10),
                KeyCode::Char('H') => app.scroll_left(HORIZONTAL_STEP * 10),
                KeyCode::Char('r') => app.reload()?,
                KeyCode::Char('?') => app.toggle_shortcuts(),
                _ => {}
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let mut app = App::new(args.source(), args.parse_options());
    app.start_collapsed = args.collapsed;
    app.load_diff()?;

    if args.stat {
        return print_stat(&app);
    }

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}
