mod cli;
mod commands;
mod handler;
mod markdown;
mod poller;
mod reply;
mod telegram;

#[cfg(test)]
mod test_support;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use gemi_ai::prompts::seed_history;
use gemi_ai::tools::{ImageChain, TavilyClient, VoiceEngine};
use gemi_ai::{
    GeminiClient, GeminiConfig, Interpreter, MemoryStore, PromptAssembler, SessionRegistry,
    ToolInvoker,
};
use gemi_common::GemiError;
use gemi_config::schema::{GemiConfig, LoggingConfig};

use crate::handler::Handler;
use crate::poller::Poller;
use crate::telegram::TelegramClient;

/// Split one `.env` line into a key and value. Blank lines, comments and
/// lines without `=` yield `None`; an `export ` prefix and matching quotes
/// around the value are stripped.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q)?.strip_suffix(*q))
        .unwrap_or(value);
    Some((key, value))
}

/// Export entries of the first `.env` found (working directory, then the
/// workspace root) that are not already set. Must run before any threads
/// are spawned.
fn load_dotenv() {
    let workspace = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../.env");
    let Some(contents) = [PathBuf::from(".env"), workspace]
        .iter()
        .find_map(|path| std::fs::read_to_string(path).ok())
    else {
        return;
    };
    for (key, value) in contents.lines().filter_map(parse_env_line) {
        if std::env::var_os(key).is_none() {
            std::env::set_var(key, value);
        }
    }
}

/// `RUST_LOG` wins, then `--log-level`, then `logging.filter`.
fn init_logging(cli_filter: Option<&str>, config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = cli_filter.unwrap_or(&config.filter);
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("gemi=info"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .init();
}

/// Build the tool invoker from whichever providers are configured.
fn build_tools(config: &GemiConfig) -> Result<(ToolInvoker, Option<Arc<VoiceEngine>>), GemiError> {
    let mut tools = ToolInvoker::new()
        .with_default_max_results(config.search.default_max_results)
        .with_image_count(config.image.count);

    if let Some(search) = TavilyClient::from_config(&config.search)? {
        info!("Web search enabled");
        tools = tools.with_search(Arc::new(search));
    }
    if let Some(images) = ImageChain::from_config(&config.image)? {
        info!(providers = config.image.providers.len(), "Image generation enabled");
        tools = tools.with_image(Arc::new(images));
    }

    let voice = VoiceEngine::from_config(&config.voice)?.map(Arc::new);
    if let Some(voice) = &voice {
        info!(voice = %config.voice.tts_voice, "Voice output enabled");
        tools = tools.with_voice(voice.clone());
    }
    Ok((tools, voice))
}

fn spawn_reaper(registry: &Arc<SessionRegistry>, idle_ttl_secs: u64) {
    if idle_ttl_secs == 0 {
        return;
    }
    let registry = Arc::clone(registry);
    let ttl = Duration::from_secs(idle_ttl_secs);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let removed = registry.reap_idle(ttl).await;
            let count = registry.count().await;
            debug!(removed, sessions = count, "Reaper tick");
        }
    });
}

async fn run(config: GemiConfig) -> Result<(), GemiError> {
    gemi_config::require_secrets(&config)?;

    let (tools, voice) = build_tools(&config)?;
    if let Some(voice) = &voice {
        voice.spawn_readiness_probe();
    }

    let model = GeminiClient::new(GeminiConfig::from_model_config(&config.model))?
        .with_tools(tools.definitions());
    info!(model = %config.model.model, "Model client ready");

    let interpreter = Arc::new(
        Interpreter::new(Arc::new(model), Arc::new(tools))
            .with_max_tool_rounds(config.session.max_tool_rounds),
    );
    let registry = Arc::new(SessionRegistry::new(
        interpreter,
        Arc::new(MemoryStore::new()),
        seed_history(),
    ));
    spawn_reaper(&registry, config.session.idle_ttl_secs);

    let telegram = Arc::new(TelegramClient::from_config(&config.bot)?);
    let assembler = PromptAssembler::new(telegram.clone(), &config.prompt);
    let handler = Arc::new(Handler::from_config(
        telegram.clone(),
        registry,
        assembler,
        &config.bot,
    ));
    let poller = Poller::new(telegram, handler, &config.bot);

    info!("Polling for updates");
    tokio::select! {
        () = poller.run() => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown requested");
        }
    }
    Ok(())
}

fn main() {
    load_dotenv();
    let args = cli::parse();

    let config = gemi_config::load_config(args.config.as_deref());
    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_logging(args.log_level.as_deref(), &logging);

    info!("Gemi v{} starting...", env!("CARGO_PKG_VERSION"));
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(run(config)) {
        error!("{e}");
        std::process::exit(1);
    }
    info!("Shutdown complete");
}
