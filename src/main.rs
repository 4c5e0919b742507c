use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::AsyncReadExt;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use commit_history::commit::{self, Provider};
use commit_history::patch::split_patch;
use commit_history::reports::{self, ReportFormat};
use commit_history::{Config, DiffParserRegistry};

#[derive(Parser)]
#[command(name = "commit-history")]
#[command(about = "Classify dependency changes in commit diffs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
    Summary,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ReportFormat::Json,
            OutputFormat::Markdown => ReportFormat::Markdown,
            OutputFormat::Summary => ReportFormat::Summary,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProviderType {
    Github,
    Gitlab,
}

impl From<ProviderType> for Provider {
    fn from(provider: ProviderType) -> Self {
        match provider {
            ProviderType::Github => Provider::Github,
            ProviderType::Gitlab => Provider::Gitlab,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the dependency changes in a patch
    Scan {
        /// Patch file produced by `git diff` or `git format-patch` (stdin if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "summary")]
        output: OutputFormat,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Decode a commit list from a hosting API and flag dependency changes
    Commits {
        /// Payload format
        #[arg(short, long, value_enum)]
        provider: ProviderType,

        /// JSON array of commits as returned by the provider API
        #[arg(short, long)]
        file: PathBuf,

        /// JSON object mapping commit SHA to the paths it changed
        #[arg(long)]
        changed_files: Option<PathBuf>,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Profile diff parsing (for use with cargo-flamegraph)
    ProfileParse {
        /// Patch file to parse
        #[arg(short, long)]
        file: PathBuf,

        /// Number of iterations (for meaningful profiling)
        #[arg(short, long, default_value = "1000")]
        iterations: usize,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Scan {
            file,
            output,
            config,
        } => run_scan(file, output, config).await,
        Commands::Commits {
            provider,
            file,
            changed_files,
            config,
        } => run_commits(provider, file, changed_files, config).await,
        Commands::ProfileParse { file, iterations } => run_profile_parse(file, iterations).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = Config::resolve(path)?;
    Ok(config)
}

async fn read_file(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

async fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => read_file(path).await,
        None => {
            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("reading patch from stdin")?;
            Ok(input)
        }
    }
}

async fn run_scan(
    file: Option<PathBuf>,
    output: OutputFormat,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config.as_deref())?;
    let patch = read_input(file.as_deref()).await?;

    let diffs = split_patch(&patch);
    if diffs.is_empty() {
        tracing::warn!("No file diffs found in input");
    }

    let registry = DiffParserRegistry::from_config(&config);
    let changes = registry.parse_all(&diffs);

    let report = reports::render(output.into(), &changes).context("rendering report")?;
    println!("{report}");
    Ok(())
}

async fn run_commits(
    provider: ProviderType,
    file: PathBuf,
    changed_files: Option<PathBuf>,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config.as_deref())?;
    let payload = read_file(&file).await?;
    let commits = commit::parse_commits(provider.into(), &payload)?;

    let commits = match changed_files {
        Some(path) => {
            let text = read_file(&path).await?;
            let changed: HashMap<String, Vec<String>> = serde_json::from_str(&text)
                .with_context(|| format!("parsing changed files from {}", path.display()))?;
            commit::flag_dependency_changes(&commits, &changed, &config)
        }
        None => commits,
    };

    let json = serde_json::to_string_pretty(&commits).context("serializing commits")?;
    println!("{json}");
    Ok(())
}

async fn run_profile_parse(file: PathBuf, iterations: usize) -> anyhow::Result<()> {
    let patch = read_file(&file).await?;
    let diffs = split_patch(&patch);
    if diffs.is_empty() {
        anyhow::bail!("no file diffs found in {}", file.display());
    }

    let registry = DiffParserRegistry::new();

    eprintln!("Profiling parse operations for: {}", file.display());
    eprintln!("Files: {}", diffs.len());
    eprintln!("Iterations: {iterations}");
    eprintln!("Patch size: {} bytes", patch.len());

    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(registry.parse_all(&diffs));
    }

    let elapsed = start.elapsed();
    eprintln!("\nProfiling complete!");
    eprintln!("Total time: {elapsed:?}");
    eprintln!(
        "Average per iteration: {:?}",
        elapsed / iterations.max(1) as u32
    );

    Ok(())
}
