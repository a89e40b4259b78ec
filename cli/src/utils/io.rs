use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use env_logger::{fmt::Formatter as LogFormatter, Builder as LogBuilder};
use log::{Level as LogLevel, LevelFilter as LogLevelFilter, Record as LogRecord};
use once_cell::sync::Lazy;
use std::{
    env,
    io::{self, BufRead, Write},
    ops::Deref,
};

/// Standard `env_logger` filter syntax, applied on top of the `--verbose` level.
const LOG_FILTER_ENV: &str = "RUST_LOG";

pub fn init_env_logger(verbose: bool) {
    let format = |formatter: &mut LogFormatter, record: &LogRecord<'_>| {
        writeln!(formatter, "{} {}", level_prefix(record.level()), record.args())
    };

    let level = if verbose {
        LogLevelFilter::Debug
    } else {
        LogLevelFilter::Info
    };
    let mut builder = LogBuilder::new();
    builder.format(format).filter(None, level);
    if let Ok(filters) = env::var(LOG_FILTER_ENV) {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn level_prefix(level: LogLevel) -> &'static ColoredString {
    match level {
        LogLevel::Debug => LOG_PREFIX_DEBUG.deref(),
        LogLevel::Info => LOG_PREFIX_INFO.deref(),
        LogLevel::Warn => LOG_PREFIX_WARN.deref(),
        LogLevel::Error => LOG_PREFIX_ERROR.deref(),
        LogLevel::Trace => LOG_PREFIX_TRACE.deref(),
    }
}

/// Ask on the terminal for the OAuth token used against the Google Cloud APIs.
///
/// Only reached when neither `--token`, the configuration file nor
/// `GOOGLE_OAUTH_ACCESS_TOKEN` provide one.
pub fn read_token_from_stdin() -> Result<Option<String>> {
    prompt_for_token(io::stdin().lock(), io::stderr())
}

fn prompt_for_token(mut input: impl BufRead, mut output: impl Write) -> Result<Option<String>> {
    write!(
        output,
        "{} No Google Cloud access token configured.\n{} Paste the output of \
         `gcloud auth print-access-token` (leave empty to send requests unauthenticated): ",
        LOG_PREFIX_WARN.deref(),
        LOG_PREFIX_INPUT.deref()
    )
    .and_then(|_| output.flush())
    .context("Failed to prompt for a Google Cloud access token.")?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read Google Cloud access token from stdin.")?;
    let token = line.trim();
    Ok((!token.is_empty()).then(|| token.to_owned()))
}

pub static LOG_PREFIX_DEBUG: Lazy<ColoredString> = Lazy::new(|| "D".normal());
pub static LOG_PREFIX_INFO: Lazy<ColoredString> = Lazy::new(|| "I".green());
pub static LOG_PREFIX_WARN: Lazy<ColoredString> = Lazy::new(|| "W".yellow().bold());
pub static LOG_PREFIX_ERROR: Lazy<ColoredString> = Lazy::new(|| "E".red().bold());
pub static LOG_PREFIX_TRACE: Lazy<ColoredString> = Lazy::new(|| "T".normal());
pub static LOG_PREFIX_INPUT: Lazy<ColoredString> = Lazy::new(|| "*".blue().bold());
