use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pulsar_watch::api::ConnectClient;
use pulsar_watch::app::{App, View};
use pulsar_watch::config::{Overrides, PushSource, Settings};
use pulsar_watch::data::{DashboardSession, ThresholdMonitor};
use pulsar_watch::events;
use pulsar_watch::fetch::Fetcher;
use pulsar_watch::source::{EventSource, FileSource, StreamSource, WsSource};
use pulsar_watch::store::{JsonFileStore, MemoryStore, PreferenceStore};
use pulsar_watch::ui::{self, Theme};

#[derive(Parser, Debug)]
#[command(name = "pulsar-watch")]
#[command(about = "Terminal dashboard for Pulsar uptime probes and host metrics")]
struct Args {
    /// Config file (TOML). Defaults to ./pulsar-watch.toml if present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pulsar API address
    #[arg(short, long)]
    api_url: Option<String>,

    /// Push channel address (defaults to <api-url>/ws)
    #[arg(long, conflicts_with_all = ["tcp", "replay"])]
    ws_url: Option<String>,

    /// Read push frames from a TCP relay (host:port)
    #[arg(long, conflicts_with_all = ["ws_url", "replay"])]
    tcp: Option<String>,

    /// Replay a capture of push frames, one JSON frame per line
    #[arg(long, conflicts_with_all = ["ws_url", "tcp"])]
    replay: Option<PathBuf>,

    /// Target list refresh interval (e.g. "10s", "1m")
    #[arg(short, long)]
    refresh: Option<String>,

    /// File holding alert limits
    #[arg(long)]
    preferences: Option<PathBuf>,

    /// Log file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            ws_url: self.ws_url.clone(),
            tcp: self.tcp.clone(),
            replay: self.replay.clone(),
            refresh: self.refresh.clone(),
            preferences: self.preferences.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings =
        Settings::load(args.config.as_deref(), &args.overrides()).context("Invalid configuration")?;
    let refresh = settings.refresh_interval()?;

    init_logging(&settings)?;
    info!(api = %settings.api_url, "Starting pulsar-watch");

    // Network I/O runs here; the UI stays on the main thread
    let rt = Runtime::new()?;

    let source = open_source(&rt, &settings.push_source())?;
    let client = ConnectClient::builder()
        .base_url(settings.api_url.as_str())
        .build()?;
    let fetcher = Fetcher::new(Arc::new(client), rt.handle().clone());

    let mut thresholds = ThresholdMonitor::new(open_store(&settings.preferences));
    thresholds.load_all();
    let session = DashboardSession::new(thresholds);

    let app = App::new(source, session)
        .with_fetcher(fetcher)
        .with_refresh_interval(refresh)
        .with_theme(Theme::auto_detect());

    let result = run_tui(app);
    rt.shutdown_timeout(Duration::from_millis(500));
    result
}

/// Log to a file: the terminal belongs to the UI.
fn init_logging(settings: &Settings) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
        .with_context(|| format!("Failed to open log file {}", settings.log_file.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Build the push source on the runtime.
fn open_source(rt: &Runtime, push: &PushSource) -> Result<Box<dyn EventSource>> {
    let source: Box<dyn EventSource> = match push {
        PushSource::WebSocket(url) => {
            let _guard = rt.enter();
            Box::new(WsSource::spawn(url))
        }
        PushSource::Tcp(addr) => {
            println!("Connecting to {}...", addr);
            let source = rt
                .block_on(StreamSource::connect(addr))
                .with_context(|| format!("Failed to connect to {}", addr))?;
            Box::new(source)
        }
        PushSource::Replay(path) => Box::new(FileSource::new(path)),
    };
    info!(source = %source.description(), "Push source ready");
    Ok(source)
}

/// Alert limits live in a JSON file; fall back to memory if it is unreadable.
fn open_store(path: &Path) -> Box<dyn PreferenceStore> {
    match JsonFileStore::open(path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Preferences unavailable, limits will not persist");
            Box::new(MemoryStore::new())
        }
    }
}

/// Run the TUI until the user quits
fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    app.start();

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        app.tick();

        // Draw UI
        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(0, area.height / 2 - 2, area.width, 5);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::System => ui::system::render(frame, app, chunks[2]),
                View::Targets => ui::targets::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_detail_overlay {
                ui::detail::render_overlay(frame, app, area);
            }
            if app.input.is_some() {
                ui::common::render_input(frame, app, area);
            }
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }
    }

    Ok(())
}
