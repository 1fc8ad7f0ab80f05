use anyhow::Result;
use dotenvy::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;

use teracore::core::{config, init_logger, log_pipeline_configuration, AppError};
use teracore::download::resolve::{build_resolver, ResolverBackend};
use teracore::download::HttpSource;
use teracore::{ConsumerId, LinkMatcher, Pipeline, PipelineSettings, Resolver, Task, TaskQueue};

mod cli;
mod local;
mod telegram;

use cli::{Cli, Commands};
use local::LocalRelay;
use telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramRelay};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, configuration, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // .env first so LOG_LEVEL and LOG_FILE_PATH can come from it
    dotenv().ok();

    // Panics inside a task are caught by the queue; this only makes sure they reach the log file.
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {}", panic_info);
    }));

    init_logger(&config::LOG_FILE_PATH, &config::LOG_LEVEL)?;

    match cli.command {
        Some(Commands::Run) => run_bot().await,
        Some(Commands::Resolve { url }) => run_resolve(&url).await,
        Some(Commands::Fetch { url, output }) => run_fetch(url, output).await,
        None => {
            log::info!("No command specified, running bot in default mode");
            run_bot().await
        }
    }
}

fn configured_resolver() -> Result<Arc<dyn Resolver>> {
    let backend: ResolverBackend = config::resolver::BACKEND.parse()?;
    let resolver = build_resolver(backend, &config::resolver::CHROME_BIN, config::resolver::timeout())?;
    Ok(resolver)
}

/// Run the bot with long polling until Ctrl-C
async fn run_bot() -> Result<()> {
    if config::BOT_TOKEN.is_empty() {
        return Err(AppError::Config("BOT_TOKEN (or TELOXIDE_TOKEN) environment variable not set".to_string()).into());
    }

    let settings = PipelineSettings::from_env()?;
    log_pipeline_configuration(&settings, &config::LINK_HOSTS);

    let bot = create_bot()?;
    let pipeline = Arc::new(Pipeline::new(
        settings,
        configured_resolver()?,
        Arc::new(HttpSource::new()?),
        Arc::new(TelegramRelay::new(bot.clone())),
    ));
    let queue = TaskQueue::new(pipeline);
    let matcher = LinkMatcher::from_config()?;

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let deps = HandlerDeps::new(queue, matcher);
    log::info!("Bot started, waiting for messages");

    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

/// Resolve one link and print the direct URL
async fn run_resolve(url: &str) -> Result<()> {
    let resolver = configured_resolver()?;
    let location = resolver.resolve(url).await?;
    println!("{}", location.url);
    Ok(())
}

/// Resolve, size-check and download one link into a local directory
async fn run_fetch(url: String, output: Option<PathBuf>) -> Result<()> {
    let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
    tokio::fs::create_dir_all(&output_dir).await?;

    let settings = PipelineSettings::from_env()?;
    log_pipeline_configuration(&settings, &config::LINK_HOSTS);

    let relay = Arc::new(LocalRelay::new(output_dir));
    let pipeline = Pipeline::new(settings, configured_resolver()?, Arc::new(HttpSource::new()?), relay.clone());

    let task = Task::new(ConsumerId(0), url);
    let bytes = pipeline.run(&task).await?;
    log::info!("Fetched {} bytes from {}", bytes, task.reference);

    for path in relay.saved().await {
        println!("{}", path.display());
    }
    Ok(())
}
