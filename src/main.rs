// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;

use loctrans::app_config::{Config, LogLevel, TranslationProvider};
use loctrans::app_controller::Controller;
use loctrans::translation::pipeline::PipelineStage;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    OpenAI,
    OpenRouter,
    Anthropic,
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::OpenRouter => TranslationProvider::OpenRouter,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
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

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for PipelineStage to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliStage {
    Extract,
    Glossary,
    Translate,
}

impl From<CliStage> for PipelineStage {
    fn from(stage: CliStage) -> Self {
        match stage {
            CliStage::Extract => PipelineStage::Extract,
            CliStage::Glossary => PipelineStage::Glossary,
            CliStage::Translate => PipelineStage::Translate,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import a flat {key: text} JSON file into the project
    Import {
        /// Source texts as a JSON object
        #[arg(value_name = "SOURCE_JSON")]
        source: PathBuf,

        /// File name recorded on the imported units (defaults to the source file name)
        #[arg(long)]
        file: Option<String>,

        /// Existing translations as a {key: translation} JSON object
        #[arg(long)]
        translations: Option<PathBuf>,

        /// Let existing translations replace translated units
        #[arg(long, requires = "translations")]
        overwrite: bool,
    },

    /// Run the extraction, glossary and translation stages
    Run {
        /// Skip term extraction
        #[arg(long)]
        skip_extract: bool,

        /// Skip glossary translation
        #[arg(long)]
        skip_glossary: bool,

        /// Concurrent requests for every stage
        #[arg(long)]
        threads: Option<usize>,
    },

    /// Retry only the failed entries of one stage
    RetryFailed {
        #[arg(value_enum)]
        stage: CliStage,
    },

    /// Validate the translations of the project
    Validate,

    /// Show project progress and failure counts
    Status {
        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the translations as a {key: translation} JSON file
    Export {
        #[arg(value_name = "OUTPUT_JSON")]
        output: PathBuf,
    },

    /// Generate shell completions for loctrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct GlobalOptions {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Project directory
    #[arg(short = 'd', long, global = true)]
    project_dir: Option<String>,

    /// Translation provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, global = true)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, global = true)]
    target_language: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

/// loctrans - batch AI translation for game localization
#[derive(Parser, Debug)]
#[command(name = "loctrans")]
#[command(version)]
#[command(about = "AI-powered batch translation for game localization")]
#[command(long_about = "loctrans translates localization projects with AI providers in three stages:
term extraction, glossary translation and content translation. Every stage
persists after each batch and can be rerun for its failed entries only.

EXAMPLES:
    loctrans import strings_en.json                 # Create or update the project
    loctrans import strings_en.json --translations strings_uk.json
    loctrans run                                    # Run all three stages
    loctrans run --skip-extract --skip-glossary     # Translate with the existing glossary
    loctrans -p openai -m gpt-4o run                # Use a specific provider and model
    loctrans retry-failed translate                 # Retry failed units only
    loctrans validate                               # Check placeholders, tags and entities
    loctrans status                                 # Show progress
    loctrans export strings_uk.json                 # Write the translations
    loctrans completions bash > loctrans.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    options: GlobalOptions,
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Load the config file and apply the command line overrides
fn load_config(options: &GlobalOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        // Find the provider config and update the model
        let provider_str = config.translation.provider.to_lowercase_string();
        if let Some(provider_config) = config
            .translation
            .available_providers
            .iter_mut()
            .find(|p| p.provider_type == provider_str)
        {
            provider_config.model = model.clone();
        }
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(project_dir) = &options.project_dir {
        config.project_dir = project_dir.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "loctrans", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = load_config(&cli.options)?;
    log::set_max_level(config.log_level.to_level_filter());

    match cli.command {
        Commands::Import {
            source,
            file,
            translations,
            overwrite,
        } => {
            check_languages(&config)?;
            let controller = Controller::with_config(config)?;
            controller.import(&source, file.as_deref(), translations.as_deref(), overwrite)?;
        }
        Commands::Run {
            skip_extract,
            skip_glossary,
            threads,
        } => {
            config.pipeline.skip_extract |= skip_extract;
            config.pipeline.skip_glossary |= skip_glossary;
            if threads.is_some() {
                config.pipeline.extract.threads = threads;
                config.pipeline.glossary.threads = threads;
                config.pipeline.translate.threads = threads;
            }

            let report = Controller::with_config(config)?.run().await?;
            println!("{}", report.summary());
        }
        Commands::RetryFailed { stage } => {
            let report = Controller::with_config(config)?
                .retry_failed(stage.into())
                .await?;
            println!("{}", report.summary());
            if report.failed > 0 {
                warn!("{} entries are still failing", report.failed);
            }
        }
        Commands::Validate => {
            let report = Controller::with_config(config)?.validate()?;
            println!(
                "{}, quality {:.1} ({})",
                report.summary(),
                report.quality_score(),
                report.grade()
            );
        }
        Commands::Status { json } => {
            let status = Controller::with_config(config)?.status()?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&status).context("Failed to serialize status")?
                );
            } else {
                println!("{}", status.summary());
            }
        }
        Commands::Export { output } => {
            let count = Controller::with_config(config)?.export(&output)?;
            info!("{} translations written", count);
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Language codes are checked before a project is created with them
fn check_languages(config: &Config) -> Result<()> {
    loctrans::validate_language_code(&config.source_language)
        .context("Invalid source language")?;
    loctrans::validate_language_code(&config.target_language)
        .context("Invalid target language")?;
    Ok(())
}
