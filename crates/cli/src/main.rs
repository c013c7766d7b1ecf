mod config_commands;
mod provider_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    secrecy::Secret,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use chatbox_config::{Environment, JsonFileStore, UserConfig, default_config, load_user_config};

#[derive(Parser)]
#[command(name = "chatbox", about = "Chatbox provider config migration and resolution")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config store file (overrides the per-user default location).
    #[arg(long, global = true, env = "CHATBOX_CONFIG")]
    config: Option<PathBuf>,

    /// UI language used to derive defaults.
    #[arg(long, global = true, env = "CHATBOX_LANGUAGE", default_value = "en")]
    language: String,

    /// Derive defaults for a mobile device.
    #[arg(long, global = true, default_value_t = false)]
    mobile: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upgrade the stored config and print the keys that change.
    Migrate {
        /// Print the patch without writing it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the loaded config with secrets redacted.
    Show,
    /// List built-in and custom providers.
    Providers,
    /// Resolve a chat mode into its request target.
    Resolve(provider_commands::ResolveArgs),
    /// Validate a chat completions URL and derive its completions sibling.
    CheckUrl { url: String },
    /// Store the API key for a provider.
    SetKey {
        provider_id: String,
        #[arg(env = "CHATBOX_API_KEY", hide_env_values = true)]
        api_key: String,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output; logs go to stderr.
    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn open_store(path: Option<&PathBuf>) -> anyhow::Result<JsonFileStore> {
    let store = match path {
        Some(path) => JsonFileStore::new(path),
        None => JsonFileStore::open_default()?,
    };
    debug!(path = %store.path().display(), "using config store");
    Ok(store)
}

fn load(store: &JsonFileStore, defaults: &UserConfig) -> anyhow::Result<UserConfig> {
    Ok(load_user_config(store, defaults)?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "chatbox starting");

    let store = || open_store(cli.config.as_ref());
    let defaults = default_config(&Environment::new(cli.language.as_str(), cli.mobile));
    match cli.command {
        Commands::CheckUrl { ref url } => provider_commands::handle_check_url(url),
        Commands::Migrate { dry_run } => config_commands::handle_migrate(&store()?, dry_run),
        Commands::Show => config_commands::handle_show(&store()?, &defaults),
        Commands::Providers => {
            provider_commands::handle_providers(&load(&store()?, &defaults)?);
            Ok(())
        },
        Commands::Resolve(ref args) => {
            provider_commands::handle_resolve(&load(&store()?, &defaults)?, args)
        },
        Commands::SetKey {
            ref provider_id,
            ref api_key,
        } => config_commands::handle_set_key(
            &store()?,
            &defaults,
            provider_id,
            Secret::new(api_key.clone()),
        ),
    }
}
