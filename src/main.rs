// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, Context};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use captrans::app_config::{Config, LogLevel};
use captrans::app_controller::{Controller, RunOptions};
use captrans::speaker::SpeakerMode;
use captrans::CaptionError;

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

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::Error,
        LogLevel::Warn => LevelFilter::Warn,
        LogLevel::Info => LevelFilter::Info,
        LogLevel::Debug => LevelFilter::Debug,
        LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a recording (default command)
    Translate(TranslateArgs),

    /// Generate shell completions for captrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Recording with an embedded caption track
    #[arg(value_name = "INPUT_FILE")]
    input_file: Option<PathBuf>,

    /// Freetext context to help the translation, useful for teaching phrases/acronyms
    #[arg(short, long)]
    context: Option<String>,

    /// Use this SRT file instead of the recording's caption track
    #[arg(long, value_name = "SRT_FILE")]
    captions: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, env = "CAPTRANS_CONFIG", default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// How speakers are read from the captions (first-line, marker, required)
    #[arg(short, long, value_parser = SpeakerMode::from_str)]
    speaker_mode: Option<SpeakerMode>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Maximum characters per output caption
    #[arg(long)]
    max_caption_length: Option<usize>,

    /// Retries per utterance after a failed or timed out call
    #[arg(short, long)]
    retries: Option<u32>,

    /// Language tag for the muxed subtitle stream (e.g. 'en', 'eng')
    #[arg(long)]
    language: Option<String>,

    /// Only write the caption file, do not produce a translated video
    #[arg(long)]
    no_mux: bool,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,
}

/// captrans - translate meeting recordings into English captions
///
/// Reads the speaker-labelled caption track of a recording, sends each
/// speaker's stretch of audio to a speech translation service and writes
/// the results back as timed captions.
#[derive(Parser, Debug)]
#[command(name = "captrans")]
#[command(version)]
#[command(about = "Translate meeting recordings into timed English captions")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "captrans extracts the caption track of a recording, groups it by speaker, \
translates each speaker's audio and writes {INPUT}.srt plus {INPUT}.translated.mp4.

Requires ffmpeg on the PATH and an OpenAI API key in conf.json or $OPENAI_API_KEY.

EXAMPLES:
    captrans meeting.mp4                            # Translate using default config
    captrans -c \"Acronyms: OKR, ARR\" meeting.mp4    # Add context to the prompt
    captrans --captions fixed.srt meeting.mp4       # Use an external caption file
    captrans -s required --no-mux meeting.mp4       # Strict speaker markers, captions only
    captrans completions bash > captrans.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation
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

    // @returns: ANSI color and short tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
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
        let (color, tag) = Self::style_for_level(record.level());
        let _ = writeln!(
            std::io::stderr(),
            "\x1B[{}m{} {} {}\x1B[0m",
            color, now, tag, record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Info until the config says otherwise
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "captrans", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Load the config file, creating it with defaults if it does not exist
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .with_context(|| format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", config_path))
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", config_path))?;

        Ok(config)
    }
}

/// Override config with CLI options if provided
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
    if let Some(mode) = options.speaker_mode {
        config.captions.speaker_mode = mode;
    }
    if let Some(model) = &options.model {
        config.translation.model = model.clone();
    }
    if let Some(length) = options.max_caption_length {
        config.captions.max_caption_length = length;
    }
    if let Some(retries) = options.retries {
        config.translation.retry_count = retries;
    }
    if let Some(language) = &options.language {
        config.output.subtitle_language = language.clone();
    }
    if options.no_mux {
        config.output.mux_video = false;
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // Apply the CLI log level before anything logs
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let input_file = options.input_file.clone().ok_or_else(|| {
        anyhow::anyhow!("INPUT_FILE is required when no subcommand is specified")
    })?;

    if !input_file.exists() {
        return Err(CaptionError::MissingInput(input_file).into());
    }

    let mut config = load_or_create_config(&options.config_path)?;
    apply_overrides(&mut config, &options);
    log::set_max_level(level_filter(&config.log_level));

    config.validate()
        .context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    controller.run(RunOptions {
        input_file,
        captions_file: options.captions,
        context: options.context,
        force_overwrite: options.force_overwrite,
    }).await?;

    Ok(())
}
