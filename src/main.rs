#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{Read, Write};
use std::path::PathBuf;

use subtran::app_config::{self, Config, ProcessingMode, TranslationProvider};
use subtran::file_utils::FileManager;
use subtran::Controller;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
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
    /// Translate a subtitle file or every subtitle file of a directory (default command)
    Translate(TranslateArgs),

    /// Translate free text read from a file or stdin
    Text(TextArgs),

    /// Generate shell completions for subtran
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by every translating command
#[derive(Args, Debug)]
struct CommonArgs {
    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Input subtitle file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output file or directory (single file input only)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Send several subtitles per request
    #[arg(long)]
    batch: bool,

    /// Subtitles per request in batch mode
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct TextArgs {
    /// Read the text from this file instead of stdin
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Translate each non-empty line separately, in one request
    #[arg(long)]
    per_line: bool,

    #[command(flatten)]
    common: CommonArgs,
}

/// subtran - subtitle translation through local or hosted LLMs
#[derive(Parser, Debug)]
#[command(name = "subtran")]
#[command(version)]
#[command(about = "Translate SRT subtitles with AI providers")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "subtran translates SRT subtitle files cue by cue, or in batches, and writes a translated SRT next to the source.

EXAMPLES:
    subtran movie.srt                          # Translate using default config
    subtran -f movie.srt                       # Force overwrite existing output
    subtran -p anthropic -m claude-3-haiku-20240307 movie.srt
    subtran -s en -t es movie.srt              # Translate from English to Spanish
    subtran --batch --batch-size 10 movie.srt  # Ten subtitles per request
    subtran --log-level debug /subtitles/      # Process a whole directory
    subtran text < notes.txt                   # Translate free text
    subtran text --per-line -i lines.txt       # One request for every line
    subtran completions bash > subtran.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. Use --config-path to pick
    another file. A default one is written when the file does not exist.

SUPPORTED PROVIDERS:
    ollama    - Local Ollama server (default)
    anthropic - Anthropic API (requires API key)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Colored stderr logger
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and prefix for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", ""),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (color, prefix) = Self::style_for_level(record.level());
        let _ = writeln!(
            std::io::stderr(),
            "\x1B[{}m{} {}{}\x1B[0m",
            color,
            now,
            prefix,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subtran", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        Some(Commands::Text(args)) => run_text(args).await,
        None => run_translate(cli.translate).await,
    }
}

// Load the config file and apply command line overrides
fn load_config(common: &CommonArgs) -> Result<Config> {
    if let Some(level) = &common.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&common.config_path)?;

    if let Some(provider) = &common.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &common.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(source_language) = &common.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &common.target_language {
        config.target_language = target_language.clone();
    }
    match &common.log_level {
        Some(level) => config.log_level = level.clone().into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    Ok(config)
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let input_path = args
        .input_path
        .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

    let mut config = load_config(&args.common)?;
    if args.batch {
        config.translation.common.processing_mode = ProcessingMode::Batch;
    }
    if let Some(batch_size) = args.batch_size {
        config.translation.common.batch_size = batch_size;
    }
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;

    if FileManager::file_exists(&input_path) {
        controller
            .run(input_path, args.output, args.force_overwrite)
            .await?;
    } else if FileManager::dir_exists(&input_path) {
        if args.output.is_some() {
            warn!("--output is ignored for directories, outputs are written next to each source file");
        }
        let summary = controller.run_folder(input_path, args.force_overwrite).await?;
        if summary.failed > 0 {
            return Err(anyhow!("{} file(s) could not be translated", summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}

async fn run_text(args: TextArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    config.validate().context("Configuration validation failed")?;

    let text = match &args.input {
        Some(path) => FileManager::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read text from stdin")?;
            buffer
        }
    };

    let controller = Controller::with_config(config)?;
    if args.per_line {
        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        for translated in controller.translate_free_texts(&lines).await? {
            println!("{}", translated);
        }
    } else {
        let translated = controller.translate_free_text(&text).await;
        println!("{}", translated);
    }

    Ok(())
}
