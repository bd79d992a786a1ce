use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::app::ports::{MassCalibrationPort, MassInputs};
use crate::constants::RESOLVED_DECIMALS;
use crate::domain::Measurement;
use crate::error::{Result, SweetCatError};
use crate::observability::metrics;

/// Check that all six calibration inputs are numeric.
pub fn validate_inputs(teff: &Measurement, logg: &Measurement, feh: &Measurement) -> Result<MassInputs> {
    let pair = |name: &str, m: &Measurement| {
        m.pair().ok_or_else(|| {
            SweetCatError::Validation(format!(
                "{} ({} ± {}) is not numeric",
                name, m.value, m.error
            ))
        })
    };
    let (teff, teff_err) = pair("Teff", teff)?;
    let (logg, logg_err) = pair("logg", logg)?;
    let (feh, feh_err) = pair("[Fe/H]", feh)?;
    Ok(MassInputs {
        teff,
        teff_err,
        logg,
        logg_err,
        feh,
        feh_err,
    })
}

/// Stellar mass from Teff, logg and [Fe/H] through an external calibration.
pub struct MassEstimator {
    calibration: Arc<dyn MassCalibrationPort>,
    timeout: Duration,
}

impl MassEstimator {
    pub fn new(calibration: Arc<dyn MassCalibrationPort>, timeout: Duration) -> Self {
        Self {
            calibration,
            timeout,
        }
    }

    /// Mass and error rounded to two decimals, or `NULL`/`NULL` when the inputs are
    /// incomplete or the calibration fails.
    pub async fn estimate(
        &self,
        star: &str,
        teff: &Measurement,
        logg: &Measurement,
        feh: &Measurement,
    ) -> Measurement {
        let inputs = match validate_inputs(teff, logg, feh) {
            Ok(inputs) => inputs,
            Err(e) => {
                warn!("Skipping mass for {}: {}", star, e);
                metrics::resolution::mass_validation_failure();
                return Measurement::unknown();
            }
        };

        match tokio::time::timeout(self.timeout, self.calibration.mass(&inputs)).await {
            Ok(Ok((mass, err))) if mass.is_finite() => {
                let estimate = Measurement::resolved(mass, err, RESOLVED_DECIMALS);
                debug!("Mass for {}: {} ± {}", star, estimate.value, estimate.error);
                estimate
            }
            Ok(Ok((mass, _))) => {
                warn!("Mass calibration for {} returned {}", star, mass);
                metrics::resolution::mass_calibration_failure();
                Measurement::unknown()
            }
            Ok(Err(e)) => {
                warn!("Mass calibration failed for {}: {}", star, e);
                metrics::resolution::mass_calibration_failure();
                Measurement::unknown()
            }
            Err(_) => {
                warn!("Mass calibration timed out for {}", star);
                metrics::resolution::mass_calibration_failure();
                Measurement::unknown()
            }
        }
    }
}
