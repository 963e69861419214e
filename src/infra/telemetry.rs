use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const METRIC_EXPORT_ENTRIES: &str = "folio_export_entries_total";
pub const METRIC_IMPORT_ENTITIES: &str = "folio_import_entities_total";
pub const METRIC_IMPORT_SKIPPED: &str = "folio_import_skipped_total";
pub const METRIC_REPAIR_PASSES: &str = "folio_repair_passes";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
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
            METRIC_EXPORT_ENTRIES,
            Unit::Count,
            "Total number of entries written to export documents."
        );
        describe_counter!(
            METRIC_IMPORT_ENTITIES,
            Unit::Count,
            "Total number of posts and pages created by imports."
        );
        describe_counter!(
            METRIC_IMPORT_SKIPPED,
            Unit::Count,
            "Total number of foreign export items skipped during import."
        );
        describe_histogram!(
            METRIC_REPAIR_PASSES,
            Unit::Count,
            "Ampersand repair passes needed per foreign import."
        );
    });
}
