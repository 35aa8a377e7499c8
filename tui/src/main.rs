//! HAL Monitor Entry Point
//!
//! Launches the terminal activity monitor.
//!
//! Usage:
//!   hal-monitor [OPTIONS]
//!
//! Options:
//!   --server <URL>      Monitor server (default: http://localhost:8080)
//!   --user <NAME>       Only show this user's entries
//!   --no-boot           Skip the boot sequence
//!   --audio <FILE>      Boot sound
//!   --config <FILE>     Configuration file
//!   --log-file <FILE>   Where logs go (default: $TMPDIR/hal-monitor.log)

use std::fs::File;
use std::io::{self, IsTerminal};
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use hal_monitor_tui::App;
use monitor_core::{default_config_path, load_config_from_path, ConfigOverrides};

/// HAL Monitor - live activity log with a HAL 9000 boot console
#[derive(Parser, Debug)]
#[command(name = "hal-monitor")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Monitor server base URL
    #[arg(short = 's', long, value_name = "URL")]
    server: Option<String>,

    /// Only show this user's entries
    #[arg(short = 'u', long, value_name = "NAME")]
    user: Option<String>,

    /// Skip the boot sequence
    #[arg(long)]
    no_boot: bool,

    /// Boot sound file
    #[arg(long, value_name = "FILE")]
    audio: Option<PathBuf>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "HAL_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log file path
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(server) = &self.server {
            overrides = overrides.with_base_url(server.clone());
        }
        if let Some(user) = &self.user {
            overrides = overrides.with_user(user.clone());
        }
        if self.no_boot {
            overrides = overrides.with_no_boot();
        }
        if let Some(audio) = &self.audio {
            overrides = overrides.with_audio_path(audio.clone());
        }
        overrides
    }
}

/// Log to a file so the alternate screen stays clean
fn init_logging(path: &PathBuf) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file: {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("monitor_core=info,hal_monitor_tui=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("hal-monitor.log"));
    init_logging(&log_path)?;

    let config_path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(config_path).context("Failed to load configuration")?;
    args.overrides()
        .apply(&mut config)
        .context("Invalid command-line option")?;
    tracing::info!(source = %config.source(), server = %config.base_url, "Configuration loaded");

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: hal-monitor requires a terminal (TTY)");
        std::process::exit(1);
    }

    // Restore the terminal before the panic message prints
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(config);
    let result = app.run(&mut terminal).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Monitor exited with an error");
    }
    result
}
