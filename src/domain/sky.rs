//! Sky positions and the conversions between sexagesimal text and decimal degrees.
//!
//! SWEET-Cat stores coordinates as `HH MM SS.ss` / `±DD MM SS.ss` strings while the
//! exoplanet.eu export uses decimal degrees. Everything is converted to decimal degrees
//! before any distance is computed.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SweetCatError};

const ARCSEC_PER_DEGREE: f64 = 3600.0;
const MAS_PER_DEGREE: f64 = 3_600_000.0;

static SEXAGESIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-])?\s*(\d{1,3})[\s:]+(\d{1,2})[\s:]+(\d{1,2}(?:\.\d*)?)$")
        .expect("valid sexagesimal regex")
});

/// An ICRS position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    ra_deg: f64,
    dec_deg: f64,
}

impl SkyPosition {
    /// Build a position from decimal degrees.
    ///
    /// RA must lie in [0, 360] (360 wraps to 0) and Dec in [-90, 90].
    pub fn from_degrees(ra_deg: f64, dec_deg: f64) -> Result<Self> {
        if !ra_deg.is_finite() || !dec_deg.is_finite() {
            return Err(SweetCatError::parse(
                "position",
                format!("non-finite coordinates ({}, {})", ra_deg, dec_deg),
            ));
        }
        if !(0.0..=360.0).contains(&ra_deg) {
            return Err(SweetCatError::parse("ra", format!("{} outside [0, 360)", ra_deg)));
        }
        if !(-90.0..=90.0).contains(&dec_deg) {
            return Err(SweetCatError::parse("dec", format!("{} outside [-90, 90]", dec_deg)));
        }
        Ok(Self {
            ra_deg: if ra_deg == 360.0 { 0.0 } else { ra_deg },
            dec_deg,
        })
    }

    /// Parse `HH MM SS.ss` (hours) and `±DD MM SS.ss` (degrees); colons also accepted.
    pub fn from_sexagesimal(ra: &str, dec: &str) -> Result<Self> {
        let (ra_sign, h, m, s) = split_sexagesimal("ra", ra)?;
        if ra_sign < 0.0 || h >= 24.0 {
            return Err(SweetCatError::parse("ra", format!("'{}' is not a valid hour angle", ra)));
        }
        // 60.xx seconds or minutes carry into the next unit, so 23 59 60.00 wraps to 0h.
        let ra_deg = ((h + m / 60.0 + s / 3600.0) * 15.0).rem_euclid(360.0);

        let (dec_sign, d, m, s) = split_sexagesimal("dec", dec)?;
        let dec_deg = dec_sign * (d + m / 60.0 + s / 3600.0);

        Self::from_degrees(ra_deg, dec_deg)
    }

    pub fn ra_deg(&self) -> f64 {
        self.ra_deg
    }

    pub fn dec_deg(&self) -> f64 {
        self.dec_deg
    }

    /// Great-circle separation in arc-seconds (Vincenty formula, stable at all distances).
    pub fn separation_arcsec(&self, other: &SkyPosition) -> f64 {
        let (sin_dec1, cos_dec1) = self.dec_deg.to_radians().sin_cos();
        let (sin_dec2, cos_dec2) = other.dec_deg.to_radians().sin_cos();
        let (sin_dlon, cos_dlon) = (other.ra_deg - self.ra_deg).to_radians().sin_cos();

        let num = ((cos_dec2 * sin_dlon).powi(2)
            + (cos_dec1 * sin_dec2 - sin_dec1 * cos_dec2 * cos_dlon).powi(2))
        .sqrt();
        let den = sin_dec1 * sin_dec2 + cos_dec1 * cos_dec2 * cos_dlon;

        num.atan2(den).to_degrees() * ARCSEC_PER_DEGREE
    }

    /// Linearly propagate by proper motion over `dt_years`.
    ///
    /// `pm_ra_mas_yr` is μα* = μα·cos δ, as published by Gaia.
    pub fn propagate(&self, pm_ra_mas_yr: f64, pm_dec_mas_yr: f64, dt_years: f64) -> SkyPosition {
        let cos_dec = self.dec_deg.to_radians().cos();
        let ra = if cos_dec.abs() > f64::EPSILON {
            self.ra_deg + pm_ra_mas_yr * dt_years / MAS_PER_DEGREE / cos_dec
        } else {
            self.ra_deg
        };
        let dec = self.dec_deg + pm_dec_mas_yr * dt_years / MAS_PER_DEGREE;
        SkyPosition {
            ra_deg: ra.rem_euclid(360.0),
            dec_deg: dec.clamp(-90.0, 90.0),
        }
    }

    /// Render as SWEET-Cat text: RA `HH MM SS.SS`, Dec `±DD MM SS.SS`.
    pub fn to_sexagesimal(&self) -> (String, String) {
        // Work in hundredths of a second so a rounded 59.999 carries instead of printing 60.00.
        let ra_cs = (self.ra_deg / 15.0 * 360_000.0).round() as i64 % (24 * 360_000);
        let ra = format!(
            "{:02} {:02} {:02}.{:02}",
            ra_cs / 360_000,
            (ra_cs / 6_000) % 60,
            (ra_cs / 100) % 60,
            ra_cs % 100
        );

        let sign = if self.dec_deg < 0.0 { '-' } else { '+' };
        let dec_cs = (self.dec_deg.abs() * 360_000.0).round() as i64;
        let dec = format!(
            "{}{:02} {:02} {:02}.{:02}",
            sign,
            dec_cs / 360_000,
            (dec_cs / 6_000) % 60,
            (dec_cs / 100) % 60,
            dec_cs % 100
        );
        (ra, dec)
    }
}

fn split_sexagesimal(field: &str, text: &str) -> Result<(f64, f64, f64, f64)> {
    let trimmed = text.trim();
    let caps = SEXAGESIMAL
        .captures(trimmed)
        .ok_or_else(|| SweetCatError::parse(field, format!("'{}' is not sexagesimal", trimmed)))?;

    let sign = if caps.get(1).map(|m| m.as_str()) == Some("-") { -1.0 } else { 1.0 };
    let number = |i: usize| -> Result<f64> {
        caps[i]
            .parse::<f64>()
            .map_err(|e| SweetCatError::parse(field, format!("'{}': {}", trimmed, e)))
    };
    let (whole, minutes, seconds) = (number(2)?, number(3)?, number(4)?);
    // Older rows were rounded without carrying and may hold 60.00; those are accepted.
    if minutes >= 61.0 || seconds >= 61.0 {
        return Err(SweetCatError::parse(
            field,
            format!("'{}' has minutes or seconds out of range", trimmed),
        ));
    }
    Ok((sign, whole, minutes, seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sweetcat_coordinates() {
        let pos = SkyPosition::from_sexagesimal("22 57 27.98", "+20 46 07.78").unwrap();
        assert!((pos.ra_deg() - 344.366583).abs() < 1e-5);
        assert!((pos.dec_deg() - 20.768828).abs() < 1e-5);
    }

    #[test]
    fn test_negative_zero_degree_declination_keeps_sign() {
        let pos = SkyPosition::from_sexagesimal("00 00 00.00", "-00 30 00.00").unwrap();
        assert!((pos.dec_deg() + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_colon_separated_coordinates() {
        let pos = SkyPosition::from_sexagesimal("12:30:00", "-45:15:00").unwrap();
        assert!((pos.ra_deg() - 187.5).abs() < 1e-12);
        assert!((pos.dec_deg() + 45.25).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(SkyPosition::from_sexagesimal("24 00 00", "+00 00 00").is_err());
        assert!(SkyPosition::from_sexagesimal("10 61 00", "+00 00 00").is_err());
        assert!(SkyPosition::from_degrees(10.0, 91.0).is_err());
        assert!(SkyPosition::from_degrees(f64::NAN, 0.0).is_err());
        assert!(SkyPosition::from_sexagesimal("nan", "+00 00 00").is_err());
    }

    #[test]
    fn test_sixty_seconds_carries_into_next_minute() {
        let sixty = SkyPosition::from_sexagesimal("10 16 60.00", "+19 28 60.00").unwrap();
        let carried = SkyPosition::from_sexagesimal("10 17 00.00", "+19 29 00.00").unwrap();
        assert!(sixty.separation_arcsec(&carried) < 1e-6);

        let wrapped = SkyPosition::from_sexagesimal("23 59 60.00", "-00 59 60.00").unwrap();
        assert!(wrapped.ra_deg().abs() < 1e-9);
        assert!((wrapped.dec_deg() + 1.0).abs() < 1e-12);

        assert!(SkyPosition::from_sexagesimal("10 16 61.00", "+00 00 00").is_err());
        assert!(SkyPosition::from_sexagesimal("10 00 00", "+00 61 00").is_err());
    }

    #[test]
    fn test_render_round_trips_at_arcsecond_level() {
        let pos = SkyPosition::from_degrees(344.366583, -20.768828).unwrap();
        let (ra, dec) = pos.to_sexagesimal();
        assert_eq!(ra, "22 57 27.98");
        assert_eq!(dec, "-20 46 07.78");
        let back = SkyPosition::from_sexagesimal(&ra, &dec).unwrap();
        assert!(pos.separation_arcsec(&back) < 0.2);
    }

    #[test]
    fn test_render_carries_rounded_seconds() {
        // 59.999 s must not print as 60.00
        let pos = SkyPosition::from_degrees((59.999 / 3600.0) * 15.0, 0.0).unwrap();
        let (ra, dec) = pos.to_sexagesimal();
        assert_eq!(ra, "00 01 00.00");
        assert_eq!(dec, "+00 00 00.00");
    }

    #[test]
    fn test_separation() {
        let a = SkyPosition::from_degrees(0.0, 0.0).unwrap();
        let b = SkyPosition::from_degrees(0.0, 1.0).unwrap();
        assert!((a.separation_arcsec(&b) - 3600.0).abs() < 1e-6);
        assert!(a.separation_arcsec(&a).abs() < 1e-9);

        let c = SkyPosition::from_degrees(359.9999, 0.0).unwrap();
        let d = SkyPosition::from_degrees(0.0001, 0.0).unwrap();
        assert!((c.separation_arcsec(&d) - 0.72).abs() < 1e-6);
    }

    #[test]
    fn test_propagate_zero_motion_is_identity() {
        let pos = SkyPosition::from_degrees(100.0, 45.0).unwrap();
        let moved = pos.propagate(0.0, 0.0, -15.5);
        assert_eq!(pos, moved);
    }

    #[test]
    fn test_propagate_uses_cos_dec() {
        let pos = SkyPosition::from_degrees(100.0, 60.0).unwrap();
        let moved = pos.propagate(1000.0, -1000.0, 1.0);
        assert!((moved.dec_deg() - (60.0 - 1000.0 / MAS_PER_DEGREE)).abs() < 1e-12);
        assert!((moved.ra_deg() - (100.0 + 2.0 * 1000.0 / MAS_PER_DEGREE)).abs() < 1e-9);
    }
}
