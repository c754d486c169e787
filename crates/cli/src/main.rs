mod batch_commands;
mod config_commands;
mod convert_commands;

use std::path::{Path, PathBuf};

use {
    canon_formats::{Format, FormatConfig, InclusionMode},
    canon_model::Subtype,
    clap::{Args, Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "canon",
    version,
    about = "Convert AI assistant configuration files between formats"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of ./canon.toml and ~/.config/canon/).
    #[arg(long, global = true, env = "CANON_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported formats and what they can represent.
    Formats {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Parse a document and print the canonical package as JSON.
    Parse {
        file: PathBuf,
        #[arg(long)]
        from: Format,
        /// Package id (defaults to the file name).
        #[arg(long)]
        id: Option<String>,
        /// Force the package subtype instead of inferring it.
        #[arg(long)]
        subtype: Option<Subtype>,
        /// Write JSON here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render a canonical package (JSON) into a target format.
    Render {
        package: PathBuf,
        #[arg(long)]
        to: Format,
        #[command(flatten)]
        options: GenerateArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse a document and render it into another format.
    Convert {
        file: PathBuf,
        #[arg(long)]
        from: Format,
        #[arg(long)]
        to: Format,
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        options: GenerateArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert every markdown file under a directory.
    Batch {
        dir: PathBuf,
        #[arg(long)]
        from: Format,
        #[arg(long)]
        to: Format,
        /// Where converted files are written. Without it nothing is written.
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Files converted at the same time (overrides `[batch] concurrency`).
        #[arg(long)]
        concurrency: Option<usize>,
        /// Stop after the first failed file (overrides `[batch] fail_fast`).
        #[arg(long)]
        fail_fast: bool,
        #[command(flatten)]
        options: GenerateArgs,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Generator options given on the command line. Set values win over the
/// config file.
#[derive(Args, Debug, Default)]
struct GenerateArgs {
    /// Path glob scoping the output (Cursor `globs`, Copilot `applyTo`). Repeatable.
    #[arg(long = "glob")]
    globs: Vec<String>,
    /// Cursor `alwaysApply`.
    #[arg(long)]
    always_apply: Option<bool>,
    /// Kiro inclusion mode: always, fileMatch or manual.
    #[arg(long)]
    inclusion: Option<InclusionMode>,
    /// Kiro `fileMatchPattern`.
    #[arg(long)]
    file_match_pattern: Option<String>,
    /// Claude `model`.
    #[arg(long)]
    model: Option<String>,
}

impl GenerateArgs {
    fn into_config(self) -> FormatConfig {
        FormatConfig {
            globs: self.globs,
            always_apply: self.always_apply,
            inclusion: self.inclusion,
            file_match_pattern: self.file_match_pattern,
            model: self.model,
        }
    }
}

/// Initialise tracing. `RUST_LOG` wins over `--log-level`; logs go to stderr.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

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

fn load_config(path: Option<&Path>) -> anyhow::Result<canon_config::CanonConfig> {
    match path {
        Some(path) => canon_config::load_config(path),
        None => Ok(canon_config::discover_and_load()),
    }
}

/// Config-file options for `format` with command-line options merged on top.
fn generator_options(
    config: &canon_config::CanonConfig,
    format: Format,
    args: GenerateArgs,
) -> FormatConfig {
    config.options_for(format).merged_with(&args.into_config())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_telemetry(&cli);
    debug!(version = env!("CARGO_PKG_VERSION"), "canon starting");

    let config_path = cli.config.clone();
    let config_path = config_path.as_deref();

    match cli.command {
        Commands::Formats { json } => convert_commands::list_formats(json),
        Commands::Parse {
            file,
            from,
            id,
            subtype,
            output,
        } => convert_commands::parse(&file, from, id, subtype, output.as_deref()),
        Commands::Render {
            package,
            to,
            options,
            output,
        } => {
            let options = generator_options(&load_config(config_path)?, to, options);
            convert_commands::render(&package, to, &options, output.as_deref())
        },
        Commands::Convert {
            file,
            from,
            to,
            id,
            options,
            output,
        } => {
            let options = generator_options(&load_config(config_path)?, to, options);
            convert_commands::convert(&file, from, to, id, &options, output.as_deref())
        },
        Commands::Batch {
            dir,
            from,
            to,
            out_dir,
            concurrency,
            fail_fast,
            options,
        } => {
            let config = load_config(config_path)?;
            let job = batch_commands::BatchJob {
                from,
                to,
                options: generator_options(&config, to, options),
                out_dir,
                concurrency: concurrency.unwrap_or(config.batch.concurrency),
                fail_fast: fail_fast || config.batch.fail_fast,
            };
            batch_commands::handle_batch(&dir, job).await
        },
        Commands::Config { action } => config_commands::handle_config(action, config_path),
    }
}
