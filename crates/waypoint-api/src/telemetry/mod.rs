//! Tracing initialization

use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Install the global tracing subscriber.
///
/// `LOG_FORMAT=json` switches the console output to JSON lines. Calling this
/// twice (as tests do) leaves the first subscriber in place.
pub fn init_telemetry(environment: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "waypoint=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let result = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        // Console: compact format
        let console_fmt = tracing_subscriber::fmt::layer().event_format(
            Format::default()
                .compact()
                .with_target(false)
                .without_time(),
        );
        tracing_subscriber::registry()
            .with(filter)
            .with(console_fmt)
            .try_init()
    };

    if result.is_ok() {
        tracing::info!(environment = %environment, json, "Tracing initialized");
    }
}
