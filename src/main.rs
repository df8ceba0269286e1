use std::io::{self, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mathchat::render;
use mathchat::repl::Repl;
use mathchat::{ApiError, ChatController, ClientConfig, ConfigError, HttpMathApi, MathApi};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("backend error: {0}")]
    Api(#[from] ApiError),
    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "mathchat", about = "Chat with a math question-answering backend")]
struct Cli {
    /// Backend base URL, e.g. http://localhost:8000
    #[arg(long, env = "MATH_API_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive session (default).
    Chat,
    /// Ask a single question and print the answer.
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// List recent conversations stored by the backend.
    History,
    /// Show backend usage statistics.
    Stats,
    /// Check backend health.
    Health,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(raw) = cli.base_url.as_deref() {
        config = config.with_base_url(raw)?;
    }
    info!(base_url = %config.base_url, recent_limit = config.recent_limit, "client configured");

    let api: Arc<dyn MathApi> = Arc::new(HttpMathApi::from_config(&config)?);
    let mut controller = ChatController::new(Arc::clone(&api), config.recent_limit);
    let mut stdout = io::stdout();

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            controller.load_recent().await;
            let mut repl = Repl::new(io::stdin().lock(), stdout.lock());
            repl.run(&mut controller).await?;
        }
        Command::Ask { question } => {
            controller.send_message(&question.join(" ")).await;
            if let Some(conv) = controller.state().active_conversation() {
                write!(stdout, "{}", render::transcript(conv, false))?;
            }
        }
        Command::History => {
            controller.load_recent().await;
            writeln!(stdout, "{}", render::conversation_list(controller.state()).trim_end())?;
        }
        Command::Stats => {
            let stats = api.stats().await?;
            write!(stdout, "{}", render::stats_report(&stats))?;
        }
        Command::Health => {
            let body = api.health().await?;
            writeln!(stdout, "{}", render::health_report(&body))?;
        }
    }
    Ok(())
}
