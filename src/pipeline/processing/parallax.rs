//! Parallax resolution by ordered fallback.
//!
//! Sources are tried in [`ResolutionStep::CHAIN`] order and the first success wins:
//! Gaia astrometry, then the catalog cross-match value, then the spectroscopic estimate.
//! Each step returns `Err` with the reason it could not produce a value; nothing here
//! prompts or writes.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::matcher::nearest;
use super::provenance::{ProvenanceTracker, ResolutionStep};
use crate::app::ports::{
    AstrometricLookupPort, CrossMatch, DustExtinctionPort, Extinction, SpectroscopicInputs,
    SpectroscopicParallaxPort,
};
use crate::constants::{
    DUST_LOOKUP_TIMEOUT_SECS, DUST_SEARCH_RADIUS_DEG, GAIA_EPOCH_OFFSET_YEARS,
    GAIA_MATCH_THRESHOLD_ARCSEC, GAIA_SEARCH_RADIUS_ARCSEC, RESOLVED_DECIMALS,
};
use crate::domain::numeric::round_to;
use crate::domain::{Measurement, Numeric, ParallaxFlag, SkyPosition};
use crate::error::{Result, SweetCatError};
use crate::observability::metrics;

#[derive(Debug, Clone)]
pub struct ParallaxResolverConfig {
    pub gaia_search_radius_arcsec: f64,
    pub gaia_match_threshold_arcsec: f64,
    /// Applied to Gaia positions before comparing (negative = back in time).
    pub epoch_offset_years: f64,
    pub dust_radius_deg: f64,
    pub lookup_timeout: Duration,
    pub dust_timeout: Duration,
}

impl Default for ParallaxResolverConfig {
    fn default() -> Self {
        Self {
            gaia_search_radius_arcsec: GAIA_SEARCH_RADIUS_ARCSEC,
            gaia_match_threshold_arcsec: GAIA_MATCH_THRESHOLD_ARCSEC,
            epoch_offset_years: GAIA_EPOCH_OFFSET_YEARS,
            dust_radius_deg: DUST_SEARCH_RADIUS_DEG,
            lookup_timeout: Duration::from_secs(DUST_LOOKUP_TIMEOUT_SECS),
            dust_timeout: Duration::from_secs(DUST_LOOKUP_TIMEOUT_SECS),
        }
    }
}

/// Spectroscopic inputs of the last-resort estimate; unknown values make that step fail.
#[derive(Debug, Clone, Default)]
pub struct SpectroscopicParams {
    pub teff: Measurement,
    pub logg: Measurement,
    pub v_mag: Measurement,
    pub mass: Measurement,
}

/// Everything known about one star when its parallax is resolved.
#[derive(Debug, Clone, Default)]
pub struct ParallaxQuery<'a> {
    pub star: &'a str,
    pub position: Option<SkyPosition>,
    pub cross_match: Option<&'a CrossMatch>,
    pub params: SpectroscopicParams,
}

/// A parallax tagged with the step that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParallax {
    pub parallax: Measurement,
    pub flag: ParallaxFlag,
    pub step: ResolutionStep,
}

impl ResolvedParallax {
    fn unresolved() -> Self {
        Self {
            parallax: Measurement::unknown(),
            flag: ParallaxFlag::None,
            step: ResolutionStep::Unresolved,
        }
    }
}

pub struct ParallaxResolver {
    astrometry: Arc<dyn AstrometricLookupPort>,
    dust: Arc<dyn DustExtinctionPort>,
    formula: Arc<dyn SpectroscopicParallaxPort>,
    config: ParallaxResolverConfig,
}

impl ParallaxResolver {
    pub fn new(
        astrometry: Arc<dyn AstrometricLookupPort>,
        dust: Arc<dyn DustExtinctionPort>,
        formula: Arc<dyn SpectroscopicParallaxPort>,
        config: ParallaxResolverConfig,
    ) -> Self {
        Self {
            astrometry,
            dust,
            formula,
            config,
        }
    }

    pub async fn resolve(&self, query: &ParallaxQuery<'_>) -> ResolvedParallax {
        for step in ResolutionStep::CHAIN {
            let attempt = match step {
                ResolutionStep::Astrometric => self.from_astrometry(query).await,
                ResolutionStep::Catalog => Self::from_cross_match(query),
                ResolutionStep::Spectroscopic => self.from_spectroscopy(query).await,
                ResolutionStep::Unresolved => break,
            };
            match attempt {
                Ok(parallax) => {
                    let flag = ProvenanceTracker::record(query.star, step, &parallax);
                    return ResolvedParallax {
                        parallax,
                        flag,
                        step,
                    };
                }
                Err(reason) => debug!("{:?} step failed for {}: {}", step, query.star, reason),
            }
        }

        let unresolved = ResolvedParallax::unresolved();
        ProvenanceTracker::record(query.star, unresolved.step, &unresolved.parallax);
        unresolved
    }

    async fn from_astrometry(&self, query: &ParallaxQuery<'_>) -> Result<Measurement> {
        let position = query
            .position
            .ok_or_else(|| SweetCatError::Validation("no position to search around".into()))?;

        let lookup = self
            .astrometry
            .sources_near(&position, self.config.gaia_search_radius_arcsec);
        let sources = match tokio::time::timeout(self.config.lookup_timeout, lookup).await {
            Ok(Ok(sources)) => sources,
            Ok(Err(e)) => return Err(lookup_failed("astrometry", e)),
            Err(_) => return Err(lookup_failed("astrometry", "timed out")),
        };

        // Bring every candidate back to the catalog epoch before comparing.
        let corrected: Vec<Option<SkyPosition>> = sources
            .iter()
            .map(|s| {
                SkyPosition::from_degrees(s.ra_deg, s.dec_deg).ok().map(|p| {
                    p.propagate(
                        s.pm_ra.unwrap_or(0.0),
                        s.pm_dec.unwrap_or(0.0),
                        self.config.epoch_offset_years,
                    )
                })
            })
            .collect();

        let closest = nearest(&position, &corrected)?;
        if closest.separation_arcsec >= self.config.gaia_match_threshold_arcsec {
            return Err(SweetCatError::lookup(
                "astrometry",
                format!(
                    "nearest source {:.2} arcsec away (limit {})",
                    closest.separation_arcsec, self.config.gaia_match_threshold_arcsec
                ),
            ));
        }

        let source = &sources[closest.index];
        match source.parallax {
            Some(plx) if plx.is_finite() && plx > 0.0 => Ok(Measurement::new(
                Numeric::rounded(plx, RESOLVED_DECIMALS),
                Numeric::uncertainty(source.parallax_err.map(|e| round_to(e, RESOLVED_DECIMALS))),
            )),
            other => Err(SweetCatError::Validation(format!(
                "matched source has no positive parallax ({:?})",
                other
            ))),
        }
    }

    fn from_cross_match(query: &ParallaxQuery<'_>) -> Result<Measurement> {
        let cross_match = query
            .cross_match
            .ok_or_else(|| SweetCatError::lookup("catalog", "no cross-match"))?;
        match cross_match.parallax {
            Some(plx) if plx.is_finite() => Ok(Measurement::new(
                Numeric::rounded(plx, RESOLVED_DECIMALS),
                Numeric::uncertainty(cross_match.parallax_err.map(|e| round_to(e, RESOLVED_DECIMALS))),
            )),
            _ => Err(SweetCatError::lookup("catalog", "cross-match has no parallax")),
        }
    }

    async fn from_spectroscopy(&self, query: &ParallaxQuery<'_>) -> Result<Measurement> {
        let params = &query.params;
        let required = |name: &str, m: &Measurement| {
            m.pair()
                .ok_or_else(|| SweetCatError::Validation(format!("{} or its error is unknown", name)))
        };
        let (teff, teff_err) = required("Teff", &params.teff)?;
        let (logg, logg_err) = required("logg", &params.logg)?;
        let (v_mag, v_mag_err) = required("V", &params.v_mag)?;
        let (mass, mass_err) = required("mass", &params.mass)?;

        let extinction = self.extinction(query).await;
        let inputs = SpectroscopicInputs {
            teff,
            teff_err,
            logg,
            logg_err,
            v_mag,
            v_mag_err,
            mass,
            mass_err,
            av: extinction.av,
            av_err: extinction.av_err,
        };

        let formula = self.formula.parallax(&inputs);
        match tokio::time::timeout(self.config.lookup_timeout, formula).await {
            Ok(Ok((plx, err))) if plx.is_finite() => {
                Ok(Measurement::resolved(plx, err, RESOLVED_DECIMALS))
            }
            Ok(Ok((plx, _))) => Err(SweetCatError::Validation(format!(
                "spectroscopic parallax is not finite ({})",
                plx
            ))),
            Ok(Err(e)) => Err(lookup_failed("spectroscopic_parallax", e)),
            Err(_) => Err(lookup_failed("spectroscopic_parallax", "timed out")),
        }
    }

    /// Dust extinction at the star, 0 ± 0 when it cannot be looked up.
    async fn extinction(&self, query: &ParallaxQuery<'_>) -> Extinction {
        let Some(position) = query.position else {
            warn!("No position for {}, assuming no extinction", query.star);
            return Extinction::default();
        };

        let lookup = self.dust.extinction(&position, self.config.dust_radius_deg);
        let failure = match tokio::time::timeout(self.config.dust_timeout, lookup).await {
            Ok(Ok(ext)) if ext.av.is_finite() && ext.av_err.is_finite() => return ext,
            Ok(Ok(ext)) => format!("non-finite extinction {:?}", ext),
            Ok(Err(e)) => e,
            Err(_) => "timed out".to_string(),
        };
        let err = lookup_failed("dust", failure);
        warn!("{} for {}, assuming Av = 0 ± 0", err, query.star);
        Extinction::default()
    }
}

fn lookup_failed(service: &'static str, message: impl Into<String>) -> SweetCatError {
    metrics::resolution::lookup_failure(service);
    SweetCatError::lookup(service, message)
}
