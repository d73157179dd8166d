use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{ApiArgs, Args, JsonArgs};
use crate::client::{CompletionSettings, RetryPolicy};

const PLACEHOLDER_KEY: &str = "your_api_key_here";

/// Validated run settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub completion: CompletionSettings,
    pub input_dir: PathBuf,
    pub output_file: PathBuf,
    pub failure_log: Option<PathBuf>,
    pub request_delay: Duration,
    pub recursive: bool,
    pub append: bool,
}

impl Config {
    pub fn from_pdf_args(args: &Args) -> Result<Self> {
        let config = Self {
            completion: completion_settings(&args.api, args.max_tokens)?,
            input_dir: args.input_dir.clone(),
            output_file: args.output.clone(),
            failure_log: args.failure_log.clone(),
            request_delay: seconds(args.api.request_delay, "--request-delay")?,
            recursive: args.recursive,
            append: args.append,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_args(args: &JsonArgs) -> Result<Self> {
        let config = Self {
            completion: completion_settings(&args.api, args.max_tokens)?,
            input_dir: args.input_dir.clone(),
            output_file: args.output.clone(),
            failure_log: Some(args.failure_log.clone()),
            request_delay: seconds(args.api.request_delay, "--request-delay")?,
            recursive: false,
            append: args.append,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.input_dir.is_dir() {
            bail!("Input directory does not exist: {}", self.input_dir.display());
        }
        if self.completion.max_tokens == 0 {
            bail!("--max-tokens must be positive");
        }
        Ok(())
    }
}

fn completion_settings(api: &ApiArgs, max_tokens: u32) -> Result<CompletionSettings> {
    let api_key = match api.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() && key != PLACEHOLDER_KEY => key.to_string(),
        _ => bail!("Set your OpenAI API key with --api-key or OPENAI_API_KEY"),
    };
    if !(0.0..=2.0).contains(&api.temperature) {
        bail!("--temperature must be between 0.0 and 2.0, got {}", api.temperature);
    }
    if api.max_retries == 0 {
        bail!("--max-retries must be at least 1");
    }

    Ok(CompletionSettings {
        api_key,
        model: api.model.clone(),
        api_base_url: api.api_base_url.clone(),
        max_tokens,
        temperature: api.temperature,
        request_timeout: Duration::from_secs(api.request_timeout),
        retry: RetryPolicy {
            max_attempts: api.max_retries,
            initial_delay: Duration::from_millis(api.retry_delay_ms),
            ..RetryPolicy::default()
        },
    })
}

pub fn seconds(value: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value)
        .with_context(|| format!("{} must be a non-negative number of seconds, got {}", flag, value))
}
