use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod client;
mod config;
mod handler;
mod tui;
mod ui;

use app::App;
use client::AnswerClient;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = Config::from_env();
    info!(base_url = %config.base_url, "starting");

    let client = AnswerClient::new(&config.base_url);
    let mut app = App::new(client);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut tui::EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event).await?;
    }
    Ok(())
}

/// Diagnostics go to a file so the alternate screen stays clean.
fn init_logging() -> Result<()> {
    let dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("pergunta");
    std::fs::create_dir_all(&dir)?;
    let file = std::fs::File::create(dir.join("pergunta.log"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();
    Ok(())
}
