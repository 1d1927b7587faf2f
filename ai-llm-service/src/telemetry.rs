//! Log formatting shared by the workspace binaries.
//!
//! The layer renders only events whose target starts with one of the given
//! prefixes, so third-party noise (hyper, rusqlite, ...) stays out unless the
//! global `RUST_LOG` filter asks for it through a separate layer.

use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Target prefix of this library.
pub const TARGET_PREFIX: &str = "ai_llm_service";

/// RFC3339 UTC timer, e.g. `2025-09-12T10:20:30Z`.
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let s = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Compact single-line layer for events emitted by crates in `targets`.
///
/// Span close events are logged so `#[instrument]`ed calls report their
/// duration. ANSI colors are used only when stdout is a terminal.
pub fn layer<S>(targets: &'static [&'static str]) -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();

    let only_ours = filter::filter_fn(move |meta| {
        let t = meta.target();
        targets.iter().any(|p| t.starts_with(p))
    });

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_ours)
}

/// Builds a `target=level` directive, e.g. `pr_reviewer=debug`.
pub fn level_directive(target: &str, level: Level) -> Result<Directive, ParseError> {
    format!("{target}={}", level.as_str().to_lowercase()).parse()
}

/// `EnvFilter` from `RUST_LOG` (or `default`), with `level` applied to each target.
///
/// Targets whose directive does not parse are skipped.
pub fn env_filter_with_level(default: &str, targets: &[&str], level: Level) -> EnvFilter {
    let mut base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    for t in targets {
        if let Ok(d) = level_directive(t, level) {
            base = base.add_directive(d);
        }
    }
    base
}
