use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

mod api;
mod app;
mod config;
mod editor;
mod handler;
mod i18n;
mod markup;
mod preferences;
mod state;
mod studio;
mod tui;
mod ui;
mod view;

use app::App;
use config::Config;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "code-studio")]
#[command(version, about = "Terminal code studio: run Python and ask an AI assistant about it")]
struct Cli {
    /// Backend base URL (overrides config and environment)
    #[arg(short, long)]
    server: Option<String>,

    /// Path to an alternative config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_logging() {
    // Log to a file; stdout/stderr belong to the terminal UI
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("code-studio");
    std::fs::create_dir_all(&log_dir).ok();

    #[cfg(unix)]
    let null_device = "/dev/null";
    #[cfg(windows)]
    let null_device = "NUL";

    let log_file = match std::fs::File::create(log_dir.join("code-studio.log"))
        .or_else(|_| std::fs::File::create(null_device))
    {
        Ok(file) => file,
        Err(_) => return,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let server_url = config.resolve_server_url(cli.server.as_deref());
    tracing::info!("Starting code-studio against {}", server_url);

    let prefs = preferences::open_default();
    let mut app = App::new(config, server_url, prefs);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let tx = events.sender();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            let Some(event) = events.next().await else {
                break;
            };
            handler::handle_event(&mut app, event, &tx)?;
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    if let Err(e) = &result {
        tracing::error!("Event loop failed: {:#}", e);
    }
    result
}
