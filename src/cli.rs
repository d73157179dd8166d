use clap::{Args as ClapArgs, Parser};
use std::path::PathBuf;

/// Settings shared by every command that talks to the completion API.
#[derive(ClapArgs, Debug, Clone)]
pub struct ApiArgs {
    /// API key for the completion endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model identifier
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_API_BASE", default_value = "https://api.openai.com/v1")]
    pub api_base_url: String,

    /// Sampling temperature
    #[arg(long, env = "TEMPERATURE", default_value = "0.1")]
    pub temperature: f32,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value = "60")]
    pub request_timeout: u64,

    /// Attempts per API call before giving up
    #[arg(long, env = "MAX_RETRIES", default_value = "3")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds, doubled on each retry
    #[arg(long, default_value = "1000")]
    pub retry_delay_ms: u64,

    /// Seconds to wait between consecutive API calls
    #[arg(long, env = "REQUEST_DELAY", default_value = "1.0")]
    pub request_delay: f64,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "case-defendant-extractor")]
#[command(about = "Extract defendant companies from legal case PDFs")]
#[command(version)]
pub struct Args {
    /// Directory containing the case PDFs
    #[arg(short, long, env = "PDF_DIRECTORY", default_value = "./pdfs")]
    pub input_dir: PathBuf,

    /// JSON file receiving the case records
    #[arg(short, long, env = "OUTPUT_FILE", default_value = "./analysis_results.json")]
    pub output: PathBuf,

    /// Write a failure log to this file when some cases fail
    #[arg(long, env = "FAILURE_LOG_FILE")]
    pub failure_log: Option<PathBuf>,

    /// Maximum tokens in the model's answer
    #[arg(long, env = "MAX_TOKENS", default_value = "1000")]
    pub max_tokens: u32,

    /// Also search subdirectories for PDFs
    #[arg(long)]
    pub recursive: bool,

    /// Append to an existing output file instead of overwriting it
    #[arg(long)]
    pub append: bool,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "case-json-analyzer")]
#[command(about = "Analyze pre-extracted case JSON files for defendant companies")]
#[command(version)]
pub struct JsonArgs {
    /// Directory containing the case JSON files
    #[arg(short, long, env = "JSON_DIRECTORY", default_value = "./json_files")]
    pub input_dir: PathBuf,

    /// JSON file receiving the case records
    #[arg(short, long, env = "OUTPUT_FILE", default_value = "./analysis_results_json.json")]
    pub output: PathBuf,

    /// Failure log file
    #[arg(long, env = "FAILURE_LOG_FILE", default_value = "./failure_log.json")]
    pub failure_log: PathBuf,

    /// Maximum tokens in the model's answer
    #[arg(long, env = "MAX_TOKENS", default_value = "4000")]
    pub max_tokens: u32,

    /// Number of leading cases to skip in each file
    #[arg(long, default_value = "50")]
    pub skip: usize,

    /// Cases between longer pauses
    #[arg(long, default_value = "10")]
    pub batch_size: usize,

    /// Length of the pause after each batch, in seconds
    #[arg(long, default_value = "5.0")]
    pub batch_pause: f64,

    /// Append to an existing output file instead of overwriting it
    #[arg(long)]
    pub append: bool,

    #[command(flatten)]
    pub api: ApiArgs,
}

/// Logs at info (debug with `--verbose`) unless RUST_LOG says otherwise.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}
