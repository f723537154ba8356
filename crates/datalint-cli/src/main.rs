//! CLI entry point for datalint.
//!
//! This module is intentionally thin: it handles argument parsing, logging, I/O, and exit
//! codes. All business logic lives in the `datalint-app` crate.

mod process_engine;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use datalint_app::{
    InitOutcome, LintParams, OutputFormat, exit_code, lint_with_config, load_config,
    render_outputs, run_init,
};
use datalint_domain::{CancelToken, RunContext};
use datalint_modules::HttpFetcher;
use process_engine::ProcessEngine;
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "datalint",
    version,
    about = "Lint structured data files with versioned, shareable Jsonnet rules"
)]
struct Cli {
    /// Log filter for stderr (error|warn|info|debug|trace, or an EnvFilter directive).
    #[arg(long, global = true, env = "DATALINT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Colored log output on stderr.
    #[arg(
        long,
        global = true,
        env = "DATALINT_LOG_COLOR",
        value_enum,
        default_value_t = LogColor::Auto
    )]
    log_color: LogColor,

    /// Config file. Defaults to datalint.toml or .datalint.toml in the working directory.
    #[arg(long, short = 'c', global = true, env = "DATALINT_CONFIG")]
    config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate every rule against every data file.
    Lint {
        /// Findings at or above this level fail the run (debug|info|warn|error).
        #[arg(long, short = 'e', env = "DATALINT_ERROR_LEVEL")]
        error_level: Option<String>,

        /// Module cache directory.
        #[arg(long, env = "DATALINT_ROOT_DIR")]
        root_dir: Option<Utf8PathBuf>,

        /// Report format on stdout; repeatable.
        #[arg(long, short = 'o', value_enum)]
        output: Vec<OutputArg>,

        /// Print the report even when the run passes.
        #[arg(long)]
        output_success: bool,

        /// Lint only these data files.
        files: Vec<Utf8PathBuf>,
    },

    /// Scaffold a configuration file in the working directory.
    Init,

    /// Print a shell completion script to stdout.
    ///
    /// e.g. `source <(datalint completion bash)` in .bash_profile, or
    /// `datalint completion fish > ~/.config/fish/completions/datalint.fish`.
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print the version.
    Version,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogColor {
    /// Color when stderr is a terminal.
    Auto,
    Always,
    Never,
}

impl LogColor {
    fn enabled(self) -> bool {
        match self {
            LogColor::Auto => io::stderr().is_terminal(),
            LogColor::Always => true,
            LogColor::Never => false,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputArg {
    Text,
    Json,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Text => OutputFormat::Text,
            OutputArg::Json => OutputFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_color);

    let code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("datalint error: {err:#}");
            1
        }
    };
    std::process::exit(code);
}

fn init_logging(level: &str, color: LogColor) {
    let (filter, invalid) = match EnvFilter::try_new(level) {
        Ok(filter) => (filter, false),
        Err(_) => (EnvFilter::new("info"), true),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(color.enabled())
        .with_target(false)
        .try_init();
    if invalid {
        tracing::warn!(filter = level, "invalid log level, using info");
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Commands::Lint {
            error_level,
            root_dir,
            output,
            output_success,
            files,
        } => cmd_lint(LintParams {
            error_level,
            root_dir: match root_dir {
                Some(dir) => dir,
                None => default_root_dir()?,
            },
            config_file_path: cli.config,
            work_dir: current_dir()?,
            file_paths: files,
            outputs: output.into_iter().map(OutputFormat::from).collect(),
            output_success,
        }),
        Commands::Init => cmd_init(),
        Commands::Completion { shell } => {
            generate(shell, &mut Cli::command(), "datalint", &mut io::stdout());
            Ok(0)
        }
        Commands::Version => {
            println!("datalint {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

fn cmd_lint(params: LintParams) -> anyhow::Result<i32> {
    let loaded = load_config(
        &params.work_dir,
        params.config_file_path.as_deref(),
        params.error_level.as_deref(),
    )?;
    let engine = ProcessEngine::new(&loaded.effective.engine_command)?;
    let token = std::env::var("GITHUB_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());
    let fetcher = HttpFetcher::new(token).context("build HTTP client")?;
    let ctx = RunContext::new(
        CancelToken::new(),
        tracing::info_span!("lint", config = %loaded.path),
    );

    let out = lint_with_config(&loaded, &params, &engine, &fetcher, &ctx)?;
    for (_, text) in render_outputs(&out.report, &params.outputs, params.output_success)? {
        print!("{text}");
    }
    Ok(exit_code(out.failed))
}

fn cmd_init() -> anyhow::Result<i32> {
    match run_init(&current_dir()?)? {
        InitOutcome::Created(path) => eprintln!("datalint: created {path}"),
        InitOutcome::Exists(path) => eprintln!("datalint: {path} already exists; not modified"),
    }
    Ok(0)
}

fn current_dir() -> anyhow::Result<Utf8PathBuf> {
    let dir = std::env::current_dir().context("read working directory")?;
    Utf8PathBuf::from_path_buf(dir)
        .map_err(|p| anyhow::anyhow!("working directory is not UTF-8: {}", p.display()))
}

fn default_root_dir() -> anyhow::Result<Utf8PathBuf> {
    let base = dirs::data_dir().context("no data directory on this platform; pass --root-dir")?;
    let dir = Utf8PathBuf::from_path_buf(base.join("datalint"))
        .map_err(|p| anyhow::anyhow!("data directory is not UTF-8: {}", p.display()))?;
    Ok(dir)
}
