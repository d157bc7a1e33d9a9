use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, trace, warn};

fn main() {
    sms_relay_telemetry::TelemetryConfig::new()
        .with_default_level(LevelFilter::TRACE)
        .init();

    trace!("TRACE");
    debug!("DEBUG");
    info!("INFO");
    warn!("WARN");
    error!("ERROR");
}
