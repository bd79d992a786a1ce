//! Assembly of a complete catalog record for a newly reported host star.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::mass::MassEstimator;
use super::parallax::{ParallaxQuery, ParallaxResolver, SpectroscopicParams};
use crate::app::ports::{CatalogCrossMatchPort, CrossMatch, HostField, MissingValuePort};
use crate::constants::{CROSS_MATCH_RADIUS_ARCSEC, DEFAULT_SOURCE_FLAG, NULL_TOKEN, RESOLVED_DECIMALS};
use crate::domain::numeric::round_to;
use crate::domain::{ExoplanetRow, Measurement, Numeric, SkyPosition, StarRecord};
use crate::observability::metrics;

#[derive(Debug, Clone)]
pub struct HostAssemblerConfig {
    pub cross_match_radius_arcsec: f64,
    pub lookup_timeout: Duration,
}

impl Default for HostAssemblerConfig {
    fn default() -> Self {
        Self {
            cross_match_radius_arcsec: CROSS_MATCH_RADIUS_ARCSEC,
            lookup_timeout: Duration::from_secs(60),
        }
    }
}

pub struct HostAssembler {
    cross_match: Arc<dyn CatalogCrossMatchPort>,
    mass: MassEstimator,
    parallax: ParallaxResolver,
    values: Arc<dyn MissingValuePort>,
    config: HostAssemblerConfig,
}

impl HostAssembler {
    pub fn new(
        cross_match: Arc<dyn CatalogCrossMatchPort>,
        mass: MassEstimator,
        parallax: ParallaxResolver,
        values: Arc<dyn MissingValuePort>,
        config: HostAssemblerConfig,
    ) -> Self {
        Self {
            cross_match,
            mass,
            parallax,
            values,
            config,
        }
    }

    /// Build the record for `name`, dated today (UTC).
    pub async fn assemble(&self, name: &str, row: &ExoplanetRow) -> StarRecord {
        self.assemble_on(name, row, Utc::now().date_naive()).await
    }

    pub async fn assemble_on(&self, name: &str, row: &ExoplanetRow, date: NaiveDate) -> StarRecord {
        let mut record = StarRecord::empty(name);
        let name = record.name.clone();

        let row_position = match row.sky_position() {
            Ok(pos) => Some(pos),
            Err(e) => {
                warn!("Exoplanet row for {} has no usable position: {}", name, e);
                None
            }
        };
        let cross = match row_position {
            Some(pos) => self.lookup_cross_match(&name, &pos).await,
            None => None,
        };

        let position = cross.as_ref().and_then(CrossMatch::position).or(row_position);
        if let Some(pos) = &position {
            record.set_position(pos);
        }

        record.cross_id = cross
            .as_ref()
            .and_then(CrossMatch::hd_number)
            .unwrap_or_else(|| self.ask_text(&name, HostField::CrossId));

        record.v_mag = self.v_magnitude(&name, cross.as_ref(), row);
        record.feh = self.metallicity(&name, row);
        record.teff = self.effective_temperature(&name, row);
        record.logg = Measurement::new(
            self.ask(&name, HostField::Logg),
            self.ask(&name, HostField::LoggError),
        );
        record.microturbulence = Measurement::new(
            self.ask(&name, HostField::Microturbulence),
            self.ask(&name, HostField::MicroturbulenceError),
        );
        record.author = self.ask_text(&name, HostField::Author);
        record.link = self.ask_text(&name, HostField::Link);
        record.source_flag = self
            .values
            .provide(&name, HostField::SourceFlag)
            .unwrap_or_else(|| DEFAULT_SOURCE_FLAG.to_string());

        // The spectroscopic parallax needs the mass, so it goes first.
        record.mass = self
            .mass
            .estimate(&name, &record.teff, &record.logg, &record.feh)
            .await;

        let query = ParallaxQuery {
            star: &name,
            position,
            cross_match: cross.as_ref(),
            params: SpectroscopicParams {
                teff: record.teff.clone(),
                logg: record.logg.clone(),
                v_mag: record.v_mag.clone(),
                mass: record.mass.clone(),
            },
        };
        let resolved = self.parallax.resolve(&query).await;
        record.parallax = resolved.parallax;
        record.parallax_flag = resolved.flag.as_str().to_string();

        record.comment = match cross.as_ref().and_then(|c| c.spectral_type.as_deref()) {
            Some(sptype) if sptype.trim().starts_with('M') => sptype.trim().to_string(),
            _ => self.ask_text(&name, HostField::Comment),
        };
        record.update_date = date.format("%Y-%m-%d").to_string();

        info!(
            "Assembled {}: plx {} [{}], mass {}",
            name, record.parallax.value, record.parallax_flag, record.mass.value
        );
        record
    }

    async fn lookup_cross_match(&self, name: &str, position: &SkyPosition) -> Option<CrossMatch> {
        let lookup = self
            .cross_match
            .cross_match(position, self.config.cross_match_radius_arcsec);
        match tokio::time::timeout(self.config.lookup_timeout, lookup).await {
            Ok(Ok(found)) => {
                if found.is_none() {
                    debug!("No catalog counterpart for {}", name);
                }
                found
            }
            Ok(Err(e)) => {
                warn!("Catalog cross-match failed for {}: {}", name, e);
                metrics::resolution::lookup_failure("cross_match");
                None
            }
            Err(_) => {
                warn!("Catalog cross-match timed out for {}", name);
                metrics::resolution::lookup_failure("cross_match");
                None
            }
        }
    }

    fn v_magnitude(&self, name: &str, cross: Option<&CrossMatch>, row: &ExoplanetRow) -> Measurement {
        let value = cross
            .and_then(|c| c.v_mag)
            .filter(|v| v.is_finite())
            .or_else(|| row.v_mag())
            .map(|v| Numeric::rounded(v, RESOLVED_DECIMALS))
            .unwrap_or_else(|| self.ask(name, HostField::VMag));
        let error = match cross.and_then(|c| c.v_mag_err) {
            Some(e) if e.is_finite() && e >= 0.0 => {
                Numeric::uncertainty(Some(round_to(e, RESOLVED_DECIMALS)))
            }
            _ => self.ask(name, HostField::VMagError),
        };
        Measurement::new(value, error)
    }

    fn metallicity(&self, name: &str, row: &ExoplanetRow) -> Measurement {
        let (value, error) = row.metallicity();
        Measurement::new(
            value
                .map(|v| Numeric::rounded(v, RESOLVED_DECIMALS))
                .unwrap_or_else(|| self.ask(name, HostField::FeH)),
            error
                .map(|e| Numeric::uncertainty(Some(round_to(e, RESOLVED_DECIMALS))))
                .unwrap_or_else(|| self.ask(name, HostField::FeHError)),
        )
    }

    /// Teff and its error are catalogued as whole kelvins (truncated).
    fn effective_temperature(&self, name: &str, row: &ExoplanetRow) -> Measurement {
        let (value, error) = row.teff();
        Measurement::new(
            value
                .map(|v| Numeric::from_int(v.trunc() as i64))
                .unwrap_or_else(|| self.ask(name, HostField::Teff)),
            error
                .filter(|e| *e >= 0.0)
                .map(|e| Numeric::from_int(e.trunc() as i64))
                .unwrap_or_else(|| self.ask(name, HostField::TeffError)),
        )
    }

    fn ask(&self, name: &str, field: HostField) -> Numeric {
        match self.values.provide(name, field) {
            Some(answer) => {
                let value = Numeric::from_raw(&answer);
                if value.is_malformed() {
                    warn!("{} for {} is not a number: '{}'", field, name, value);
                }
                value
            }
            None => Numeric::null(),
        }
    }

    fn ask_text(&self, name: &str, field: HostField) -> String {
        self.values
            .provide(name, field)
            .map(|answer| answer.trim().to_string())
            .filter(|answer| !answer.is_empty())
            .unwrap_or_else(|| NULL_TOKEN.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::{
        AstrometricLookupPort, AstrometricSource, DustExtinctionPort, Extinction, MassCalibrationPort,
        MassInputs, SpectroscopicInputs, SpectroscopicParallaxPort,
    };
    use crate::pipeline::processing::parallax::ParallaxResolverConfig;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FixedCrossMatch(Option<CrossMatch>);

    #[async_trait]
    impl CatalogCrossMatchPort for FixedCrossMatch {
        async fn cross_match(
            &self,
            _position: &SkyPosition,
            _radius_arcsec: f64,
        ) -> Result<Option<CrossMatch>, String> {
            Ok(self.0.clone())
        }
    }

    struct NoAstrometry;

    #[async_trait]
    impl AstrometricLookupPort for NoAstrometry {
        async fn sources_near(&self, _: &SkyPosition, _: f64) -> Result<Vec<AstrometricSource>, String> {
            Err("offline".to_string())
        }
    }

    struct NoDust;

    #[async_trait]
    impl DustExtinctionPort for NoDust {
        async fn extinction(&self, _: &SkyPosition, _: f64) -> Result<Extinction, String> {
            Err("offline".to_string())
        }
    }

    struct SolarMass;

    #[async_trait]
    impl MassCalibrationPort for SolarMass {
        async fn mass(&self, _: &MassInputs) -> Result<(f64, f64), String> {
            Ok((1.0, 0.05))
        }
    }

    struct FixedFormula;

    #[async_trait]
    impl SpectroscopicParallaxPort for FixedFormula {
        async fn parallax(&self, _: &SpectroscopicInputs) -> Result<(f64, f64), String> {
            Ok((65.432, 1.234))
        }
    }

    #[derive(Default)]
    struct Answers(HashMap<HostField, String>);

    impl Answers {
        fn with(mut self, field: HostField, value: &str) -> Self {
            self.0.insert(field, value.to_string());
            self
        }
    }

    impl MissingValuePort for Answers {
        fn provide(&self, _star: &str, field: HostField) -> Option<String> {
            self.0.get(&field).cloned()
        }

        fn confirm(&self, _star: &str) -> bool {
            true
        }
    }

    fn assembler(cross: Option<CrossMatch>, answers: Answers) -> HostAssembler {
        let parallax = ParallaxResolver::new(
            Arc::new(NoAstrometry),
            Arc::new(NoDust),
            Arc::new(FixedFormula),
            ParallaxResolverConfig::default(),
        );
        HostAssembler::new(
            Arc::new(FixedCrossMatch(cross)),
            MassEstimator::new(Arc::new(SolarMass), Duration::from_secs(1)),
            parallax,
            Arc::new(answers),
            HostAssemblerConfig::default(),
        )
    }

    fn row() -> ExoplanetRow {
        ExoplanetRow {
            name: "WASP-999 b".to_string(),
            star_name: Some("WASP-999".to_string()),
            ra: Some(150.0),
            dec: Some(-20.5),
            detection_type: Some("Primary Transit".to_string()),
            star_metallicity: Some(0.123),
            star_metallicity_error_min: Some(0.04),
            star_metallicity_error_max: Some(0.06),
            star_teff: Some(5777.9),
            star_teff_error_min: Some(40.0),
            star_teff_error_max: Some(61.0),
            mag_v: Some(11.234),
            ..Default::default()
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn test_cross_match_values_take_precedence() {
        let cross = CrossMatch {
            ra_deg: Some(150.0),
            dec_deg: Some(-20.5),
            v_mag: Some(9.876),
            v_mag_err: Some(0.0234),
            parallax: Some(24.5),
            parallax_err: Some(0.3),
            spectral_type: Some("M2V".to_string()),
            identifiers: vec!["HIP 1".to_string(), "HD 12345".to_string()],
        };
        let answers = Answers::default().with(HostField::Logg, "4.44").with(HostField::LoggError, "0.1");
        let record = assembler(Some(cross), answers).assemble_on("WASP-999", &row(), date()).await;

        assert_eq!(record.name, "WASP-999");
        assert_eq!(record.ra, "10 00 00.00");
        assert_eq!(record.dec, "-20 30 00.00");
        assert_eq!(record.cross_id, "12345");
        assert_eq!(record.v_mag.value.as_str(), "9.88");
        assert_eq!(record.v_mag.error.as_str(), "0.02");
        assert_eq!(record.parallax.pair(), Some((24.5, 0.3)));
        assert_eq!(record.parallax_flag, "CATALOG");
        assert_eq!(record.comment, "M2V");
        assert_eq!(record.update_date, "2024-03-01");
    }

    #[tokio::test]
    async fn test_exoplanet_values_and_answers_fill_the_rest() {
        let answers = Answers::default()
            .with(HostField::VMagError, "0.05")
            .with(HostField::Logg, "4.44")
            .with(HostField::LoggError, "0.10")
            .with(HostField::Author, "Doe et al.")
            .with(HostField::Comment, "  ");
        let record = assembler(None, answers).assemble_on("WASP-999", &row(), date()).await;

        assert_eq!(record.cross_id, "NULL");
        assert_eq!(record.v_mag.value.as_str(), "11.23");
        assert_eq!(record.v_mag.error.as_str(), "0.05");
        assert_eq!(record.feh.value.as_str(), "0.12");
        assert_eq!(record.feh.error.as_str(), "0.05");
        assert_eq!(record.teff.value.as_str(), "5777");
        assert_eq!(record.teff.error.as_str(), "50");
        assert_eq!(record.logg.value.as_str(), "4.44");
        assert_eq!(record.microturbulence, Measurement::unknown());
        assert_eq!(record.author, "Doe et al.");
        assert_eq!(record.link, "NULL");
        assert_eq!(record.source_flag, "0");
        assert_eq!(record.mass.pair(), Some((1.0, 0.05)));
        assert_eq!(record.parallax.value.as_str(), "65.43");
        assert_eq!(record.parallax_flag, "SPECTROSCOPIC");
        assert_eq!(record.comment, "NULL");
        assert_eq!(record.reserved1, "NULL");
    }

    #[tokio::test]
    async fn test_missing_logg_leaves_mass_and_parallax_unknown() {
        let record = assembler(None, Answers::default())
            .assemble_on("WASP-999", &row(), date())
            .await;
        assert_eq!(record.mass, Measurement::unknown());
        assert_eq!(record.parallax, Measurement::unknown());
        assert_eq!(record.parallax_flag, "NONE");
    }

    #[tokio::test]
    async fn test_row_without_position_leaves_coordinates_null() {
        let mut row = row();
        row.ra = None;
        let record = assembler(None, Answers::default())
            .assemble_on("WASP-999", &row, date())
            .await;
        assert_eq!(record.ra, "NULL");
        assert_eq!(record.dec, "NULL");
    }
}
