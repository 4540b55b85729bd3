//! Research Canvas Entry Point
//!
//! Usage:
//!   research-canvas [OPTIONS]
//!
//! Options:
//!   --backend-url <URL>     Research backend (default: http://localhost:8000)
//!   --config <PATH>         Config file (default: ~/.config/research-canvas/canvas.toml)
//!   --timeout-ms <MS>       Per-request timeout
//!   --no-carry-input        Drop text typed before a conversation exists
//!   --log-file <PATH>       Where tracing output goes (the screen belongs to the UI)

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canvas_core::{load_config_from_path, ConfigOverrides};
use canvas_tui::{App, ControllerClient};

/// Terminal client for the research assistant
#[derive(Parser, Debug)]
#[command(name = "research-canvas")]
#[command(about = "Terminal client for the research assistant")]
#[command(version)]
struct Args {
    /// Research backend base URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Drop text typed before a conversation exists instead of sending it
    #[arg(long)]
    no_carry_input: bool,

    /// Log file path
    #[arg(long, env = "CANVAS_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(url) = &self.backend_url {
            overrides = overrides.with_backend_url(url.clone());
        }
        if let Some(ms) = self.timeout_ms {
            overrides = overrides.with_request_timeout_ms(ms);
        }
        if self.no_carry_input {
            overrides = overrides.with_carry_pending_text(false);
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to a file; stdout is the alternate screen
    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("research-canvas.log"));
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = load_config_from_path(args.config.clone())?;
    let overrides = args.overrides();
    if !overrides.is_empty() {
        overrides.apply(&mut config);
        config.validate()?;
    }
    tracing::info!(
        backend = %config.backend_url,
        source = %config.source(),
        log = %log_path.display(),
        "Starting research canvas"
    );

    // Check if we have a TTY before attempting initialization
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: research-canvas requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means:");
        eprintln!("  - Running in a non-interactive environment (CI, container)");
        eprintln!("  - SSH without -t flag");
        eprintln!("  - Piped stdin/stdout");
        std::process::exit(1);
    }

    let client = ControllerClient::from_config(config)?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let mut app = App::new(client);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Research canvas exited with an error");
    }
    result
}
