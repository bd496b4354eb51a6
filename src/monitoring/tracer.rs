/*!
 * Structured Tracing
 * Subscriber setup and timed spans for simulation runs
 */

use std::time::Instant;
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Environment variable enabling JSON output
pub const ENV_TRACE_JSON: &str = "SCHED_TRACE_JSON";

/// Runs slower than this are reported at warn level
const SLOW_RUN_MS: u128 = 100;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - SCHED_TRACE_JSON: Enable JSON output (default: false)
///
/// Panics if a global subscriber is already installed.
pub fn init_tracing() {
    if !try_init_tracing() {
        panic!("global tracing subscriber already installed");
    }
}

/// Initialize structured tracing, returning false if a subscriber already exists
pub fn try_init_tracing() -> bool {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
    installed
}

/// Timed span covering one simulation run
pub struct RunSpan {
    span: tracing::Span,
    start: Instant,
    name: String,
}

impl RunSpan {
    pub fn new(name: &str) -> Self {
        let span = span!(
            Level::INFO,
            "run",
            name = name,
            events = tracing::field::Empty,
            switches = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    /// Record how many events were applied
    pub fn record_events(&self, count: usize) {
        self.span.record("events", count);
    }

    /// Record how many context switches happened
    pub fn record_switches(&self, count: u64) {
        self.span.record("switches", count);
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for RunSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros() as u64);
        let _entered = self.span.enter();

        if duration.as_millis() > SLOW_RUN_MS {
            warn!(
                name = %self.name,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow simulation run"
            );
        } else {
            debug!(
                name = %self.name,
                duration_us = duration.as_micros() as u64,
                "simulation run completed"
            );
        }
    }
}

/// Helper to create a run span
#[inline]
pub fn span_run(name: &str) -> RunSpan {
    RunSpan::new(name)
}
