use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(logging.level).into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "vetrina_renders_started_total",
            Unit::Count,
            "Total number of render attempts dispatched to a provider strategy."
        );
        describe_counter!(
            "vetrina_renders_completed_total",
            Unit::Count,
            "Total number of render attempts that reached a terminal success."
        );
        describe_counter!(
            "vetrina_renders_failed_total",
            Unit::Count,
            "Total number of render attempts that failed terminally."
        );
        describe_counter!(
            "vetrina_polls_fired_total",
            Unit::Count,
            "Total number of completion polls fired for pending renders."
        );
        describe_counter!(
            "vetrina_publish_total",
            Unit::Count,
            "Total number of publish dispatches handed to channel adapters."
        );
        describe_counter!(
            "vetrina_manifest_fallback_total",
            Unit::Count,
            "Total number of manifests built from the deterministic fallback."
        );
    });
}
