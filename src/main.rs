/// Version injected at compile time via OCI_TF_BOOTSTRAP_VERSION (set by
/// CI/CD), or the crate version for local builds.
pub const VERSION: &str = match option_env!("OCI_TF_BOOTSTRAP_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// Commit and build date, injected the same way as [`VERSION`]
pub const COMMIT: &str = match option_env!("OCI_TF_BOOTSTRAP_COMMIT") {
    Some(v) => v,
    None => "unknown",
};
pub const BUILD_DATE: &str = match option_env!("OCI_TF_BOOTSTRAP_BUILD_DATE") {
    Some(v) => v,
    None => "unknown",
};

/// Text printed by `--version`
fn long_version() -> String {
    format!("{}\ncommit: {}\nbuilt:  {}", VERSION, COMMIT, BUILD_DATE)
}

use anyhow::{Context, Result};
use clap::{CommandFactory, FromArgMatches, Parser, ValueEnum};
use oci_tf_bootstrap::config::{self, OciConfig};
use oci_tf_bootstrap::discovery::{self, Scope};
use oci_tf_bootstrap::oci::{format_oci_error, OciClient};
use oci_tf_bootstrap::render::{self, Options, SnapshotFormat};
use oci_tf_bootstrap::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Discover an OCI tenancy and bootstrap Terraform from what is already there
#[derive(Parser, Debug)]
#[command(name = "oci-tf-bootstrap", version = VERSION, about, long_about = None)]
struct Args {
    /// OCI config profile name (default: $OCI_CLI_PROFILE or DEFAULT)
    #[arg(long)]
    profile: Option<String>,

    /// OCI config directory containing a `config` file
    #[arg(long, value_name = "DIR")]
    config: Option<PathBuf>,

    /// OCI config file path (default: $OCI_CLI_CONFIG_FILE or ~/.oci/config)
    #[arg(long, value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Output directory for generated Terraform files
    #[arg(short, long, default_value = "./terraform")]
    output: PathBuf,

    /// Override the profile's region
    #[arg(long)]
    region: Option<String>,

    /// Print the raw discovery snapshot as JSON instead of writing Terraform
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Print the raw discovery snapshot in this format instead of writing Terraform
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Restrict output to always-free tier eligible resources
    #[arg(long)]
    always_free: bool,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

impl From<OutputFormat> for SnapshotFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => SnapshotFormat::Json,
            OutputFormat::Yaml => SnapshotFormat::Yaml,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> Option<&'static str> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some("error"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Info => Some("info"),
            LogLevel::Debug => Some("debug"),
            LogLevel::Trace => Some("trace"),
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(directive) = level.as_filter() else {
        return Ok(None);
    };
    let filter = || EnvFilter::new(format!("oci_tf_bootstrap={}", directive));

    let Some(log_path) = log_file else {
        // Synchronous so log lines interleave with the banner in order
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("oci-tf-bootstrap {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Args::command().long_version(long_version()).get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    let _log_guard = setup_logging(args.log_level, args.log_file.as_deref())?;

    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let config_path = config::resolve_config_path(args.config_file.as_deref(), args.config.as_deref());
    let profile_name = config::resolve_profile(args.profile.as_deref());
    let snapshot_format = if args.json {
        Some(SnapshotFormat::Json)
    } else {
        args.format.map(SnapshotFormat::from)
    };

    eprintln!("oci-tf-bootstrap");
    eprintln!("  Profile:    {}", profile_name);
    eprintln!("  Config:     {}", config_path.display());
    if snapshot_format.is_none() {
        eprintln!("  Output:     {}", args.output.display());
    }
    if args.always_free {
        eprintln!("  Mode:       always-free tier");
    }

    if !config_path.exists() {
        eprintln!("\nError: OCI config file not found at {}\n", config_path.display());
        eprintln!("{}", config::setup_help(&config_path));
        return Err(Error::configuration(format!(
            "OCI config file not found at {}",
            config_path.display()
        ))
        .into());
    }

    let profile = match OciConfig::load(&config_path).and_then(|c| c.profile(&profile_name)) {
        Ok(profile) => profile.with_region_override(args.region.as_deref()),
        Err(err) => {
            eprintln!("\nFailed to initialize OCI context: {}\n", err);
            eprintln!("{}", config::setup_help(&config_path));
            return Err(err.into());
        }
    };

    let credentials = profile.credentials()?;
    let client = OciClient::new(credentials, &profile.region)?;

    eprintln!("  Tenancy:    {}", profile.tenancy);
    eprintln!("  Region:     {}", profile.region);
    eprintln!();

    let options = Options {
        always_free: args.always_free,
    };
    let scope = Scope::new(&profile.tenancy, &profile.region);
    let snapshot = match discovery::run(Arc::new(client), &scope).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            if let Error::FatalDiscovery { source, .. } = &err {
                eprintln!("Hint: {}", format_oci_error(source));
            }
            return Err(err).context("Discovery failed");
        }
    };
    let snapshot = options.narrow(snapshot);

    if let Some(format) = snapshot_format {
        let stdout = std::io::stdout();
        render::write_snapshot(&snapshot, format, stdout.lock())
            .context("Failed to output snapshot")?;
        return Ok(());
    }

    let written = render::write_terraform(&snapshot, &args.output, &options)
        .context("Failed to render terraform")?;

    eprintln!("Generated terraform files in {}", args.output.display());
    for path in written {
        eprintln!("  {}", path.display());
    }

    Ok(())
}
