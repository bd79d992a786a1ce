//! Run metrics for sweetcat
//!
//! Counters follow the Prometheus naming conventions. Without an installed recorder the
//! macros are no-ops, so library code can record unconditionally.

use std::fmt;
use std::sync::OnceLock;
use tracing::{info, warn};

/// Environment variable holding the address for the Prometheus HTTP listener.
pub const METRICS_ADDR_ENV: &str = "SWEETCAT_METRICS_ADDR";

/// Every metric name used by the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Reconciliation
    ReconcileNewStars,
    ReconcileStaleStars,
    ReconcileMissingPositions,

    // Resolution
    ParallaxResolved,
    MassValidationFailures,
    MassCalibrationFailures,
    LookupFailures,

    // Host run
    HostsAdded,
    HostsSkipped,
    HostsManual,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ReconcileNewStars => "sweetcat_reconcile_new_stars",
            MetricName::ReconcileStaleStars => "sweetcat_reconcile_stale_stars",
            MetricName::ReconcileMissingPositions => "sweetcat_reconcile_missing_positions",
            MetricName::ParallaxResolved => "sweetcat_parallax_resolved_total",
            MetricName::MassValidationFailures => "sweetcat_mass_validation_failures_total",
            MetricName::MassCalibrationFailures => "sweetcat_mass_calibration_failures_total",
            MetricName::LookupFailures => "sweetcat_lookup_failures_total",
            MetricName::HostsAdded => "sweetcat_hosts_added_total",
            MetricName::HostsSkipped => "sweetcat_hosts_skipped_total",
            MetricName::HostsManual => "sweetcat_hosts_manual_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder.
///
/// With `SWEETCAT_METRICS_ADDR` set, an HTTP listener serves `/metrics` there (must be
/// called inside the tokio runtime). Otherwise the recorder is kept in-process so
/// [`render`] can dump the counters at the end of a run. Idempotent.
pub fn init() {
    if HANDLE.get().is_some() {
        return;
    }

    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    match std::env::var(METRICS_ADDR_ENV) {
        Ok(addr) => match addr.parse::<std::net::SocketAddr>() {
            Ok(addr) => match builder.with_http_listener(addr).install() {
                Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
                Err(e) => warn!("Failed to start Prometheus exporter: {}", e),
            },
            Err(e) => warn!("Invalid {} '{}': {}", METRICS_ADDR_ENV, addr, e),
        },
        Err(_) => match builder.install_recorder() {
            Ok(handle) => {
                let _ = HANDLE.set(handle);
            }
            Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
        },
    }
}

/// Current counters in Prometheus text format, when the in-process recorder is active.
pub fn render() -> Option<String> {
    HANDLE.get().map(|handle| handle.render())
}

pub mod reconcile {
    use super::MetricName;

    pub fn new_stars(count: usize) {
        ::metrics::gauge!(MetricName::ReconcileNewStars.as_str()).set(count as f64);
    }

    pub fn stale_stars(count: usize) {
        ::metrics::gauge!(MetricName::ReconcileStaleStars.as_str()).set(count as f64);
    }

    pub fn missing_positions(count: usize) {
        ::metrics::gauge!(MetricName::ReconcileMissingPositions.as_str()).set(count as f64);
    }
}

pub mod resolution {
    use super::MetricName;
    use crate::domain::ParallaxFlag;

    pub fn parallax_resolved(flag: ParallaxFlag) {
        ::metrics::counter!(MetricName::ParallaxResolved.as_str(), "flag" => flag.as_str())
            .increment(1);
    }

    pub fn mass_validation_failure() {
        ::metrics::counter!(MetricName::MassValidationFailures.as_str()).increment(1);
    }

    pub fn mass_calibration_failure() {
        ::metrics::counter!(MetricName::MassCalibrationFailures.as_str()).increment(1);
    }

    pub fn lookup_failure(service: &'static str) {
        ::metrics::counter!(MetricName::LookupFailures.as_str(), "service" => service)
            .increment(1);
    }
}

pub mod hosts {
    use super::MetricName;

    pub fn added() {
        ::metrics::counter!(MetricName::HostsAdded.as_str()).increment(1);
    }

    pub fn skipped() {
        ::metrics::counter!(MetricName::HostsSkipped.as_str()).increment(1);
    }

    pub fn manual() {
        ::metrics::counter!(MetricName::HostsManual.as_str()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        for name in [
            MetricName::ReconcileNewStars,
            MetricName::ParallaxResolved,
            MetricName::LookupFailures,
            MetricName::HostsManual,
        ] {
            assert!(name.as_str().starts_with("sweetcat_"));
            assert_eq!(name.to_string(), name.as_str());
        }
    }

    #[test]
    fn test_recording_without_recorder_is_a_noop() {
        resolution::parallax_resolved(crate::domain::ParallaxFlag::Gaia);
        resolution::lookup_failure("dust");
        hosts::added();
    }
}
