//! Logging setup
//!
//! `tracing-subscriber` with an env filter and a writer that masks Telegram
//! bot tokens, which otherwise leak through request URLs in error messages.

use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str =
    "subreddit_relay=info,teloxide=warn,reqwest=warn,hyper=warn,h2=error,tokio=warn";

/// Regex patterns for redacting secrets
pub struct RedactionPatterns {
    rules: Vec<(Regex, &'static str)>,
}

impl RedactionPatterns {
    /// Compile all patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            rules: vec![
                // https://api.telegram.org/bot<token>/method
                (
                    Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)")?,
                    "$1[TELEGRAM_TOKEN]",
                ),
                (
                    Regex::new(r"[0-9]{8,10}:[A-Za-z0-9_-]{35}")?,
                    "[TELEGRAM_TOKEN]",
                ),
                (
                    Regex::new(r"(TELEGRAM_TOKEN=)[^\s&]+")?,
                    "$1[MASKED]",
                ),
            ],
        })
    }

    /// Mask every secret in `input`
    #[must_use]
    pub fn redact(&self, input: &str) -> String {
        self.rules
            .iter()
            .fold(input.to_string(), |output, (pattern, replacement)| {
                pattern.replace_all(&output, *replacement).into_owned()
            })
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length even if redaction changed it
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: (self.make_inner)(),
            patterns: Arc::clone(&self.patterns),
        }
    }
}

/// Install the global subscriber writing redacted output to stderr.
///
/// `RUST_LOG` wins; otherwise `DEBUG_MODE=true|1` selects `debug`, and
/// [`DEFAULT_FILTER`] applies.
pub fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter {
        make_inner: io::stderr,
        patterns,
    };

    let debug_mode = std::env::var("DEBUG_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug_mode {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new(DEFAULT_FILTER)
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}
