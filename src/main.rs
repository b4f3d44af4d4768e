use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use neurolora::PromptTemplateId;
use neurolora::cli::commands::{self, analyze::AnalyzeArgs};
use neurolora::cli::{CommandOptions, Output};

#[derive(Parser)]
#[command(name = "neurolora")]
#[command(
    version,
    about = "Collect source code and get improvement suggestions from an LLM"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short = 'p', global = true, help = "Project root (default: current directory)")]
    project: Option<PathBuf>,

    #[arg(long, short = 'm', global = true, help = "Model to use (overrides config and AI_MODEL)")]
    model: Option<String>,

    #[arg(long, short = 't', global = true, help = "Request timeout in seconds")]
    timeout: Option<u64>,

    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect code into a markdown document without calling a model
    Collect {
        #[arg(help = "Files or directories to collect (default: project root)")]
        paths: Vec<PathBuf>,
    },

    /// Ask the model for improvement suggestions
    Improve {
        #[arg(help = "Files or directories to analyze (default: project root)")]
        paths: Vec<PathBuf>,
    },

    /// Ask the model how to implement a feature request
    Request {
        #[arg(help = "Feature request text")]
        text: String,
        #[arg(help = "Files or directories to analyze (default: project root)")]
        paths: Vec<PathBuf>,
    },

    /// Write a project structure report with per-file size, lines and tokens
    #[command(visible_alias = "showtree")]
    Report {
        #[arg(help = "Directory to report on (default: project root)")]
        path: Option<PathBuf>,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// List supported models
    Models {
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// Create project configuration and ignore file
    Init {
        #[arg(long, short, help = "Overwrite existing initialization")]
        force: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'f', long, default_value = "toml", help = "Output format: toml, json, yaml")]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mneurolora encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(code) => code,
        Err(e) => {
            Output::default().error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let opts = CommandOptions {
        project: cli.project,
        model: cli.model,
        timeout_secs: cli.timeout,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Collect { paths } => commands::collect::run(&opts, paths)?,
        Commands::Improve { paths } => {
            return analyze(
                &opts,
                AnalyzeArgs {
                    inputs: paths,
                    template: PromptTemplateId::Improve,
                    request_text: None,
                },
            );
        }
        Commands::Request { text, paths } => {
            return analyze(
                &opts,
                AnalyzeArgs {
                    inputs: paths,
                    template: PromptTemplateId::Request,
                    request_text: Some(text),
                },
            );
        }
        Commands::Report { path, format } => {
            commands::report::run(&opts, path, &format)?;
        }
        Commands::Models { format } => commands::models::run(&opts, &format)?,
        Commands::Init { force } => commands::init::run(&opts, force)?,
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(&opts, &format)?,
            ConfigAction::Path => commands::config::path(&opts)?,
            ConfigAction::Init { global, force } => commands::config::init(&opts, global, force)?,
        },
    }

    Ok(ExitCode::SUCCESS)
}

/// Succeeded exits 0; timed out, failed, or unwritable artifacts exit 1
fn analyze(opts: &CommandOptions, args: AnalyzeArgs) -> anyhow::Result<ExitCode> {
    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(commands::analyze::run(opts, args))?;

    if report.is_success() && report.storage_error().is_none() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
