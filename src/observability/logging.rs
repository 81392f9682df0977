//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (stdout, filter from env or config)
//! - Render plain lines as `<prefix><timestamp> <message>`
//! - Provide the fatal log path used right before a non-zero exit
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Plain format for terminals, JSON format for log shippers
//! - Everything goes to stdout, errors included
//! - Fatal is not a tracing level: it is an error on [`FATAL_TARGET`]

use std::fmt::{Display, Write as _};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local, TimeZone};
use thiserror::Error;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::format::{DefaultFields, Writer};
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};

/// Target for events that precede a fatal exit.
pub const FATAL_TARGET: &str = "intervald::fatal";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("logging already initialized: {0}")]
    Init(#[from] TryInitError),
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. An invalid
/// `RUST_LOG` is reported as a warning and the configured level is used.
pub fn init(config: &LogConfig) -> Result<(), LoggingError> {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, ignored) = resolve_filter(from_env.as_deref(), &config.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Plain => registry.with(plain_layer(std::io::stdout)).try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_timer(Rfc3339Extended)
                    .with_writer(std::io::stdout),
            )
            .try_init()?,
    }

    if let Some(e) = ignored {
        tracing::warn!(
            variable = EnvFilter::DEFAULT_ENV,
            error = %e,
            level = %config.level,
            "Ignoring invalid log filter from environment"
        );
    }

    Ok(())
}

/// Pick the filter: the environment directive if it parses, else `level`.
///
/// Also returns the parse error of an environment directive that was
/// rejected.
pub fn resolve_filter(
    from_env: Option<&str>,
    level: &str,
) -> Result<(EnvFilter, Option<ParseError>), ParseError> {
    match from_env.map(EnvFilter::try_new) {
        Some(Ok(filter)) => Ok((filter, None)),
        Some(Err(e)) => Ok((EnvFilter::try_new(level)?, Some(e))),
        None => Ok((EnvFilter::try_new(level)?, None)),
    }
}

/// The fmt layer behind [`LogFormat::Plain`], writing to `make_writer`.
///
/// ANSI escapes are off: lines must stay plain when stdout is a file.
pub fn plain_layer<S, W>(make_writer: W) -> fmt::Layer<S, DefaultFields, PrefixedLine, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer()
        .with_ansi(false)
        .event_format(PrefixedLine)
        .with_writer(make_writer)
}

/// Log a fatal error. The caller is expected to exit non-zero afterwards.
pub fn fatal(message: &dyn Display) {
    tracing::error!(target: FATAL_TARGET, "{}", message);
}

/// Line prefix for a given level and target.
pub fn prefix(level: &Level, target: &str) -> &'static str {
    match *level {
        Level::ERROR if target == FATAL_TARGET => "### FATAL ERROR: ",
        Level::ERROR => "### ERROR: ",
        Level::WARN => "### WARNING: ",
        _ => "",
    }
}

/// Timestamp with millisecond resolution and local offset,
/// e.g. `2023-05-01T12:00:00.123+02:00`.
pub fn timestamp() -> String {
    let precise = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|since| {
            let secs = i64::try_from(since.as_secs()).ok()?;
            DateTime::from_timestamp(secs, since.subsec_nanos())
        });

    match precise {
        Some(utc) => format_precise(&utc.with_timezone(&Local)),
        None => format_coarse(&Local::now()),
    }
}

pub fn format_precise<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()
}

/// Fallback when sub-second time is unavailable.
pub fn format_coarse<Tz>(time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    time.format("%Y-%m-%dT%H:%M:%S.000%:z").to_string()
}

/// [`FormatTime`] producing [`timestamp`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc3339Extended;

impl FormatTime for Rfc3339Extended {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        w.write_str(&timestamp())
    }
}

/// Plain line layout: `<prefix><timestamp> <message> <fields>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixedLine;

impl<S, N> FormatEvent<S, N> for PrefixedLine
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        writer.write_str(prefix(metadata.level(), metadata.target()))?;
        Rfc3339Extended.format_time(&mut writer)?;
        writer.write_char(' ')?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// In-memory writer for asserting on rendered log output.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct CaptureWriter {
    buf: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[cfg(test)]
impl CaptureWriter {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }
}

#[cfg(test)]
impl std::io::Write for CaptureWriter {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
impl<'a> MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike};

    fn sample() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2023, 5, 1, 12, 0, 7)
            .unwrap()
            .with_nanosecond(123_456_789)
            .unwrap()
    }

    #[test]
    fn test_precise_format() {
        assert_eq!(format_precise(&sample()), "2023-05-01T12:00:07.123+02:00");
    }

    #[test]
    fn test_coarse_format_uses_zero_millis() {
        assert_eq!(format_coarse(&sample()), "2023-05-01T12:00:07.000+02:00");
    }

    #[test]
    fn test_prefixes() {
        assert_eq!(prefix(&Level::INFO, "intervald::scheduler"), "");
        assert_eq!(prefix(&Level::ERROR, "intervald::scheduler"), "### ERROR: ");
        assert_eq!(prefix(&Level::ERROR, FATAL_TARGET), "### FATAL ERROR: ");
        assert_eq!(prefix(&Level::WARN, FATAL_TARGET), "### WARNING: ");
    }

    #[test]
    fn test_timestamp_has_millis() {
        let ts = timestamp();
        // 2023-05-01T12:00:07.123+02:00
        assert_eq!(ts.len(), 29);
        assert_eq!(&ts[19..20], ".");
    }

    #[test]
    fn test_plain_lines_have_no_escape_codes() {
        let capture = CaptureWriter::default();
        let subscriber = tracing_subscriber::registry().with(plain_layer(capture.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(interval = "10s", "Start.");
            tracing::error!("boom");
        });

        let output = capture.contents();
        assert!(!output.contains('\x1b'), "escape codes in {output:?}");

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        // <timestamp> <message> <fields>
        assert_eq!(&lines[0][19..20], ".");
        assert_eq!(&lines[0][29..], " Start. interval=\"10s\"");
        assert!(lines[1].starts_with("### ERROR: "));
        assert!(lines[1].ends_with(" boom"));
        assert_eq!(lines[1].len(), "### ERROR: ".len() + 29 + " boom".len());
    }

    #[test]
    fn test_env_filter_wins_when_valid() {
        let (filter, ignored) = resolve_filter(Some("debug"), "info").unwrap();
        assert!(ignored.is_none());
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_invalid_env_filter_is_reported() {
        let (filter, ignored) = resolve_filter(Some("intervald=nope"), "warn").unwrap();
        assert!(ignored.is_some());
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_level_used_without_env() {
        let (filter, ignored) = resolve_filter(None, "info").unwrap();
        assert!(ignored.is_none());
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_invalid_level_is_an_error() {
        assert!(resolve_filter(None, "intervald=nope").is_err());
    }
}
