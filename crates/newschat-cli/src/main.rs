use anyhow::Result;
use clap::Parser;
use newschat_cli::app;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "newschat")]
#[command(about = "newschat - ask a news backend about recent news")]
#[command(version)]
struct Cli {
    /// Send a single message, print the reply and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Backend base URL (e.g. http://localhost:3001/api)
    #[arg(long)]
    api_url: Option<String>,

    /// Stream replies as they are generated
    #[arg(long)]
    stream: bool,

    /// Color theme (dark, tokyo-night, dracula)
    #[arg(long)]
    theme: Option<String>,

    /// Clear the conversation and start a new session first
    #[arg(long)]
    reset: bool,
}

fn log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("newschat")
        .join("newschat.log")
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Interactive sessions log to a file, prompt mode to stderr.
fn init_tracing(interactive: bool) {
    if interactive {
        let path = log_path();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
            return;
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.prompt.is_none());

    let mut settings = newschat_core::Settings::load();

    if let Some(ref url) = cli.api_url {
        settings.backend.base_url = url.clone();
    }
    if cli.stream {
        settings.backend.streaming = true;
    }
    if let Some(ref theme) = cli.theme {
        settings.ui.theme = theme.clone();
    }

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&settings, &prompt, cli.reset).await?;
    } else {
        let theme = settings.ui.theme.clone();
        app::run_tui(settings, &theme, cli.reset).await?;
    }

    Ok(())
}
