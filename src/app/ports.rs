use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{SkyPosition, StarRecord};

// Lookup-side ports. Errors are plain strings: every failure is a lookup failure to the
// caller, which falls through to the next source.

/// One astrometric source near a position (Gaia-like, reference epoch J2015.5).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AstrometricSource {
    pub ra_deg: f64,
    pub dec_deg: f64,
    #[serde(default)]
    pub parallax: Option<f64>,
    #[serde(default)]
    pub parallax_err: Option<f64>,
    /// μα* in mas/yr
    #[serde(default)]
    pub pm_ra: Option<f64>,
    /// μδ in mas/yr
    #[serde(default)]
    pub pm_dec: Option<f64>,
}

#[async_trait]
pub trait AstrometricLookupPort: Send + Sync {
    async fn sources_near(
        &self,
        position: &SkyPosition,
        radius_arcsec: f64,
    ) -> Result<Vec<AstrometricSource>, String>;
}

/// The stellar counterpart returned by a catalog cross-match (SIMBAD-like).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossMatch {
    #[serde(default)]
    pub ra_deg: Option<f64>,
    #[serde(default)]
    pub dec_deg: Option<f64>,
    #[serde(default)]
    pub v_mag: Option<f64>,
    #[serde(default)]
    pub v_mag_err: Option<f64>,
    #[serde(default)]
    pub parallax: Option<f64>,
    #[serde(default)]
    pub parallax_err: Option<f64>,
    #[serde(default)]
    pub spectral_type: Option<String>,
    /// Alternative identifiers, e.g. `["HD 209458", "HIP 108859"]`.
    #[serde(default)]
    pub identifiers: Vec<String>,
}

impl CrossMatch {
    pub fn position(&self) -> Option<SkyPosition> {
        SkyPosition::from_degrees(self.ra_deg?, self.dec_deg?).ok()
    }

    /// The HD number without its `HD ` prefix. The last `HD ` identifier wins.
    ///
    /// Other catalogs sharing the letters (`HDE 226868`) are not HD numbers.
    pub fn hd_number(&self) -> Option<String> {
        self.identifiers
            .iter()
            .filter_map(|id| id.trim().strip_prefix("HD "))
            .map(str::trim)
            .filter(|number| !number.is_empty())
            .last()
            .map(str::to_string)
    }
}

#[async_trait]
pub trait CatalogCrossMatchPort: Send + Sync {
    async fn cross_match(
        &self,
        position: &SkyPosition,
        radius_arcsec: f64,
    ) -> Result<Option<CrossMatch>, String>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Extinction {
    pub av: f64,
    pub av_err: f64,
}

#[async_trait]
pub trait DustExtinctionPort: Send + Sync {
    async fn extinction(&self, position: &SkyPosition, radius_deg: f64) -> Result<Extinction, String>;
}

/// Inputs of the empirical mass calibration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MassInputs {
    pub teff: f64,
    pub teff_err: f64,
    pub logg: f64,
    pub logg_err: f64,
    pub feh: f64,
    pub feh_err: f64,
}

#[async_trait]
pub trait MassCalibrationPort: Send + Sync {
    /// Returns `(mass, mass_err)` in solar masses.
    async fn mass(&self, inputs: &MassInputs) -> Result<(f64, f64), String>;
}

/// Inputs of the spectroscopic parallax formula.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SpectroscopicInputs {
    pub teff: f64,
    pub teff_err: f64,
    pub logg: f64,
    pub logg_err: f64,
    pub v_mag: f64,
    pub v_mag_err: f64,
    pub mass: f64,
    pub mass_err: f64,
    pub av: f64,
    pub av_err: f64,
}

#[async_trait]
pub trait SpectroscopicParallaxPort: Send + Sync {
    /// Returns `(parallax, parallax_err)` in mas.
    async fn parallax(&self, inputs: &SpectroscopicInputs) -> Result<(f64, f64), String>;
}

/// Fields a person may have to supply for a new host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostField {
    CrossId,
    VMag,
    VMagError,
    Teff,
    TeffError,
    Logg,
    LoggError,
    FeH,
    FeHError,
    Microturbulence,
    MicroturbulenceError,
    Author,
    Link,
    SourceFlag,
    Comment,
}

impl HostField {
    pub fn label(&self) -> &'static str {
        match self {
            HostField::CrossId => "HD number",
            HostField::VMag => "V magnitude",
            HostField::VMagError => "error on V magnitude",
            HostField::Teff => "Teff",
            HostField::TeffError => "error on Teff",
            HostField::Logg => "logg",
            HostField::LoggError => "error on logg",
            HostField::FeH => "[Fe/H]",
            HostField::FeHError => "error on [Fe/H]",
            HostField::Microturbulence => "microturbulence",
            HostField::MicroturbulenceError => "error on microturbulence",
            HostField::Author => "author",
            HostField::Link => "link to article (ADS)",
            HostField::SourceFlag => "source flag (0/1)",
            HostField::Comment => "comment (e.g. M dwarf)",
        }
    }
}

impl fmt::Display for HostField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Supplies values the data sources could not. Implementations decide whether to ask
/// someone; `None` means the value stays unknown.
pub trait MissingValuePort: Send + Sync {
    fn provide(&self, star: &str, field: HostField) -> Option<String>;

    /// Whether to go ahead with `star`. A refusal stops the run.
    fn confirm(&self, star: &str) -> bool;
}

// Output-side ports

#[async_trait]
pub trait HostOutputPort: Send + Sync {
    /// Append one finished record to the output catalog.
    async fn append_record(&self, record: &StarRecord) -> anyhow::Result<()>;
    /// Replace the candidate list with the names still to process.
    async fn write_remaining(&self, names: &[String]) -> anyhow::Result<()>;
    /// Record a name that needs manual entry.
    async fn append_manual(&self, name: &str) -> anyhow::Result<()>;
}

#[async_trait]
pub trait CandidateListPort: Send + Sync {
    /// Replace the candidate list with the new hosts found by a check.
    async fn write_candidates(&self, names: &[String]) -> anyhow::Result<()>;
}
