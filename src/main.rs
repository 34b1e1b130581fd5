//! incident-feed — page through a remote incidents endpoint in the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌────────────┐ LoaderEvent ┌────────────┐  draw()  ┌──────────┐
//! │ fetch task │ ──────────► │  loader/   │ ───────► │  ui.rs   │
//! │ retry timer│  (channel)  │ (in app.rs)│          │ (render) │
//! └────────────┘             └────────────┘          └──────────┘
//!                                  ▲
//!                                  │ handle_key_event()
//!                             ┌──────────┐
//!                             │ input.rs │
//!                             └──────────┘
//! ```
//!
//! * **`source/`** — the `PageSource` trait, the `Incident` record, and the
//!   reqwest-backed HTTP source.
//! * **`loader/`** — the incremental loader: feed state, single-flight
//!   dispatch, and the empty-feed retry timer.
//! * **`app`** — presentation state (selection, detail, status line).
//! * **`ui`** — pure rendering: reads `App` state and draws widgets.
//! * **`input`** — maps key events to `App` mutations.
//! * **`main`** — parses args, sets up logging, the runtime and the terminal,
//!   and runs the event loop.

mod app;
mod error;
mod input;
mod loader;
mod source;
mod ui;

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use app::App;
use loader::{IncidentFeedLoader, LoaderConfig};
use source::HttpIncidentSource;

/// Browse incidents from a paginated REST backend
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the backend API
    #[arg(long, default_value = "http://localhost:3333")]
    api: String,
    /// Collection to page through
    #[arg(long, default_value = "incidents")]
    resource: String,
    /// Seconds between retries while the feed is empty
    #[arg(long, default_value_t = 30)]
    retry_secs: u64,
    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
    /// Write logs here (the terminal is taken over by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Terminal lifetime
// ---------------------------------------------------------------------------

/// Owns the ratatui terminal for the session; the screen is given back when
/// this is dropped, whether the loop quit or panicked.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// A panic message printed inside the alternate screen would vanish with it,
/// so leave raw mode first and then defer to the default hook.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Logs go to `log_file` when given; otherwise they are off unless
/// `RUST_LOG` asks for them.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let default_filter = if log_file.is_some() { "info" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = log_file {
        builder.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
    }
    builder.init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    install_panic_hook();

    // Fetches and the retry timer run here; the UI loop stays on this thread.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;
    let _runtime_guard = runtime.enter();

    let source = HttpIncidentSource::new(&args.api, &args.resource);
    log::info!("paging {}", source.url());
    let config = LoaderConfig {
        retry_interval: Duration::from_secs(args.retry_secs),
        request_timeout: Duration::from_secs(args.timeout_secs),
    };
    let mut app = App::new(IncidentFeedLoader::new(source, config));
    app.start();

    let mut guard = TerminalGuard::new()?;

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Apply settled fetches and retry ticks.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        app.tick();

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    // Dropping `app` cancels the retry timer; `guard` restores the terminal.
    Ok(())
}
