use serde::Deserialize;

use super::sky::SkyPosition;
use crate::constants::{CONFIRMED_STATUS, TRACKED_DETECTIONS};
use crate::error::Result;
use crate::pipeline::processing::names::strip_designation;

/// One planet row of the exoplanet.eu export. Unparseable numbers deserialize as `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExoplanetRow {
    pub name: String,
    #[serde(default)]
    pub star_name: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub ra: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub dec: Option<f64>,
    #[serde(default)]
    pub detection_type: Option<String>,
    #[serde(default)]
    pub planet_status: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub mag_v: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub star_metallicity: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub star_metallicity_error_min: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub star_metallicity_error_max: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub star_teff: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub star_teff_error_min: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub star_teff_error_max: Option<f64>,
}

impl ExoplanetRow {
    /// Host name derived from the planet name (`51 Peg b` -> `51 Peg`).
    pub fn host_from_planet_name(&self) -> String {
        strip_designation(self.name.trim()).trim().to_string()
    }

    /// The `star_name` column, trimmed.
    pub fn star_name(&self) -> Option<&str> {
        self.star_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn sky_position(&self) -> Result<SkyPosition> {
        SkyPosition::from_degrees(
            self.ra.unwrap_or(f64::NAN),
            self.dec.unwrap_or(f64::NAN),
        )
    }

    pub fn is_tracked(&self, include_unconfirmed: bool) -> bool {
        let detected = self
            .detection_type
            .as_deref()
            .map(|d| TRACKED_DETECTIONS.contains(&d.trim()))
            .unwrap_or(false);
        let confirmed = match self.planet_status.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(status) => include_unconfirmed || status == CONFIRMED_STATUS,
        };
        detected && confirmed
    }

    pub fn metallicity(&self) -> (Option<f64>, Option<f64>) {
        (
            finite(self.star_metallicity),
            combined_error(self.star_metallicity_error_min, self.star_metallicity_error_max),
        )
    }

    pub fn teff(&self) -> (Option<f64>, Option<f64>) {
        (
            finite(self.star_teff),
            combined_error(self.star_teff_error_min, self.star_teff_error_max),
        )
    }

    pub fn v_mag(&self) -> Option<f64> {
        finite(self.mag_v)
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Mean of the asymmetric errors when both are published, otherwise whichever exists.
fn combined_error(min: Option<f64>, max: Option<f64>) -> Option<f64> {
    match (finite(min), finite(max)) {
        (Some(lo), Some(hi)) => Some((lo + hi) / 2.0),
        (Some(e), None) | (None, Some(e)) => Some(e),
        (None, None) => None,
    }
}
