//! Structured Logging Configuration
//!
//! Text output for development, JSON output for log aggregation:
//!
//! - `LOG_FORMAT`: `json` for JSON lines, anything else for text (default: text)
//! - `RUST_LOG`: standard filter directives (default: `info`)
//!   Examples: `RUST_LOG=debug`, `RUST_LOG=shop_platform=trace,tower_http=info`
//!
//! The request pipeline opens one span per dispatched request, so every log
//! line emitted by a handler carries the request name, id and correlation id.
//!
//! ```rust,ignore
//! use shop_common::logging::init_logging;
//!
//! fn main() {
//!     init_logging("shop-server");
//!     tracing::info!(port = 8080, "Listening");
//! }
//! ```

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log output format selected through `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value. Unknown values fall back to text.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("LOG_FORMAT").unwrap_or_default())
    }
}

/// Initialize the global subscriber for the given service.
///
/// Safe to call once per process; a second call is ignored with a warning
/// instead of panicking so tests and embedded servers can share a process.
pub fn init_logging(service_name: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match LogFormat::from_env() {
        LogFormat::Json => init_json_logging(env_filter),
        LogFormat::Text => init_text_logging(env_filter),
    };

    if installed {
        tracing::info!(service = service_name, "Logging initialized");
    } else {
        tracing::warn!(service = service_name, "Global subscriber already installed");
    }
}

fn init_json_logging(env_filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(false)
                .with_target(true)
                .flatten_event(true)
                .with_span_events(FmtSpan::CLOSE),
        )
        .try_init()
        .is_ok()
}

fn init_text_logging(env_filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_ansi(true),
        )
        .try_init()
        .is_ok()
}

/// Initialize logging for tests. Output is captured by the test harness.
pub fn init_test_logging() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(fmt::layer().with_test_writer())
        .try_init();
}
