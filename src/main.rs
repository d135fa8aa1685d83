// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, Context};
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use log::{debug, error, warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use helptrans::app_config::{self, Config, TranslationProvider};
use helptrans::app_controller::Controller;
use helptrans::fetch::HttpFetcher;
use helptrans::translation::TranslationService;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download help pages listed in the YAML manifest
    Download {
        /// Download only the page with this id (always overwrites)
        #[arg(value_name = "ID")]
        id: Option<String>,

        /// List the manifest grouped by category instead of downloading
        #[arg(long, conflicts_with = "id")]
        list: bool,
    },

    /// Translate downloaded pages into the translated directory
    Translate,

    /// Point the JSON manifest's detailUrl fields at the translated pages
    RewriteUrls {
        /// Write the result here instead of overwriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions for helptrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// helptrans - download, repair and translate Japanese help pages
#[derive(Parser, Debug)]
#[command(name = "helptrans")]
#[command(version)]
#[command(about = "Download and translate Japanese help pages")]
#[command(long_about = "helptrans downloads the help pages listed in a YAML manifest, repairs their \
character encoding, translates the Japanese text inside the content region while keeping \
the markup intact, and rewrites manifest URLs to point at the translated copies.

EXAMPLES:
    helptrans download                           # Download every page in the manifest
    helptrans download achievement-achievement  # Download a single page
    helptrans download --list                    # List pages by category
    helptrans -f translate                       # Translate, overwriting existing output
    helptrans -p anthropic -m claude-3-haiku-20240307 translate
    helptrans rewrite-urls -o HelpContent.new.json
    helptrans completions bash > helptrans.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Force overwrite of existing output files
    #[arg(short, long, global = true, visible_alias = "force")]
    force_overwrite: bool,

    /// API key for the translation provider
    #[arg(long, global = true, env = "HELPTRANS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Translation provider to use
    #[arg(short, long, global = true, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long, global = true)]
    model: Option<String>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger itself accepts everything; log::set_max_level does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let emoji = Self::get_emoji_for_level(record.level());
            let color = Self::get_color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "helptrans", &mut std::io::stdout());
        return Ok(());
    }

    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &cli.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(config_log_level.to_level_filter());
    }

    let config = load_config(&cli)?;

    // If log level was not set via command line, update it from config now
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)
        .context("Configuration validation failed")?;

    match cli.command {
        Commands::Download { list: true, .. } => {
            print!("{}", controller.list_pages()?);
        }
        Commands::Download { id: Some(id), .. } => {
            let fetcher = HttpFetcher::new(&controller.config().download)?;
            controller.download_single(&fetcher, &id).await?;
        }
        Commands::Download { id: None, .. } => {
            let fetcher = HttpFetcher::new(&controller.config().download)?;
            controller.run_download(&fetcher, cli.force_overwrite).await?;
        }
        Commands::Translate => {
            let config = controller.config();
            config.validate_for_translation()
                .context("Translation settings are incomplete")?;
            let service = TranslationService::new(
                config.translation.clone(),
                &config.source_language,
                &config.target_language,
            )?;
            info!(
                "Translating with {} ({})",
                config.translation.provider.display_name(),
                config.translation.get_model()
            );
            let sample = service.test_connection().await?;
            debug!("Provider answered the connection check with '{}'", sample);
            controller.run_translate(&service, cli.force_overwrite).await?;
        }
        Commands::RewriteUrls { output } => {
            let outcome = controller.run_rewrite_urls(output.as_deref())?;
            info!("Rewrote {} URLs in {}", outcome.changes.len(), outcome.output_path.display());
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Load or create the configuration file, then apply CLI overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let config_path = &cli.config_path;
    let mut config = if Path::new(config_path).exists() {
        Config::load(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config.save(config_path)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    // Override config with CLI options if provided
    if let Some(provider) = &cli.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &cli.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }

    if let Some(api_key) = &cli.api_key {
        config.translation.active_provider_config_mut().api_key = api_key.clone();
    }

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}
