//! imgbb Uploadr - image upload client and ES module test generator

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use imgbb_uploadr::codegen::Codegen;
use imgbb_uploadr::config::Config;
use imgbb_uploadr::telemetry::{init_subscriber, LogFormat};
use imgbb_uploadr::upload::{ImageSource, ImageUploader, ImgbbClient, UploadRequest};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// imgbb Uploadr - upload images to imgbb and generate ESM test suites
#[derive(Parser, Debug)]
#[command(name = "imgbb-uploadr")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (optional)
    #[arg(short, long, global = true, default_value = "imgbb-uploadr.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Print Prometheus metrics to stderr before exiting
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload one image
    Upload(UploadArgs),
    /// Generate ES module tests from CommonJS tests
    Codegen(CodegenArgs),
}

#[derive(Args, Debug)]
struct UploadArgs {
    /// Image file to upload
    #[arg(required_unless_present = "url", conflicts_with = "url")]
    image: Option<PathBuf>,

    /// Remote image URL for imgbb to fetch instead of a local file
    #[arg(long)]
    url: Option<String>,

    /// imgbb API key
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Image name
    #[arg(long)]
    name: Option<String>,

    /// Seconds until the image is deleted (60 to 15552000)
    #[arg(long)]
    expiration: Option<u64>,

    /// Override the upload endpoint
    #[arg(long)]
    endpoint: Option<String>,
}

#[derive(Args, Debug)]
struct CodegenArgs {
    /// Directory holding the CommonJS tests
    #[arg(long)]
    tests_dir: Option<PathBuf>,

    /// Output directory name, created under the tests directory
    #[arg(long)]
    output_dir: Option<String>,

    /// Jest config providing testPathIgnorePatterns
    #[arg(long)]
    jest_config: Option<PathBuf>,

    /// Extra file names to skip (repeatable)
    #[arg(long = "ignore")]
    ignore: Vec<String>,

    /// Maximum number of files processed at once
    #[arg(long)]
    max_concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_subscriber(&cli.log_level, cli.log_format)?;

    info!("Starting imgbb-uploadr v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let result = match cli.command {
        Command::Upload(args) => run_upload(config, args).await,
        Command::Codegen(args) => run_codegen(config, args).await,
    };

    if cli.print_metrics {
        #[cfg(feature = "metrics")]
        eprintln!("{}", imgbb_uploadr::metrics::gather_text());
    }

    result
}

async fn run_upload(config: Config, args: UploadArgs) -> anyhow::Result<()> {
    let uploader = config.uploader;

    let image = match (args.image, args.url) {
        (Some(path), _) => Some(ImageSource::Path(path)),
        (None, Some(url)) => Some(ImageSource::Url(url)),
        (None, None) => None,
    };

    let request = UploadRequest {
        api_key: args.api_key.or(uploader.api_key),
        image,
        name: args.name,
        expiration: args.expiration.or(uploader.default_expiration),
    };

    let client = ImgbbClient::builder()
        .endpoint(args.endpoint.as_deref().unwrap_or(&uploader.endpoint))
        .timeout(Duration::from_secs(uploader.timeout_seconds))
        .build()?;

    let response = client.upload_request(request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn run_codegen(config: Config, args: CodegenArgs) -> anyhow::Result<()> {
    let mut codegen_config = config.codegen;
    if let Some(tests_dir) = args.tests_dir {
        codegen_config.tests_dir = tests_dir;
    }
    if let Some(output_dir) = args.output_dir {
        codegen_config.output_dir = output_dir;
    }
    if let Some(jest_config) = args.jest_config {
        codegen_config.jest_config = Some(jest_config);
    }
    if let Some(max_concurrency) = args.max_concurrency {
        anyhow::ensure!(max_concurrency > 0, "--max-concurrency must be greater than zero");
        codegen_config.max_concurrency = max_concurrency;
    }
    codegen_config.ignore.extend(args.ignore);

    let codegen = Codegen::new(codegen_config)?;
    let report = codegen.run().await?;

    println!(
        "Done rewriting '{}' tests!\nFiles: {}\nLongest LOC: {}",
        codegen.output_path().display(),
        report.files.len(),
        report.longest_loc
    );
    Ok(())
}
