/// Shared constants for catalog files and the resolution chain.

/// Token written for any unknown value in the RDB catalog.
pub const NULL_TOKEN: &str = "NULL";

/// Number of tab-separated fields in one catalog record.
pub const RDB_FIELD_COUNT: usize = 27;

/// Single-letter planet designations stripped from planet names to get the host name.
pub const PLANET_DESIGNATIONS: &[char] = &['b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'B'];

/// Candidate/component numbering suffixes, checked in this order.
pub const CANDIDATE_SUFFIXES: &[&str] = &[".01", ".02", ".2"];

/// exoplanet.eu detection methods that SWEET-Cat tracks.
pub const TRACKED_DETECTIONS: &[&str] = &["Radial Velocity", "Primary Transit", "Astrometry"];

pub const CONFIRMED_STATUS: &str = "Confirmed";

// Reconciliation
pub const DEFAULT_POSITION_THRESHOLD_ARCSEC: f64 = 5.0;

// Astrometric (Gaia) step
pub const GAIA_SEARCH_RADIUS_ARCSEC: f64 = 10.0;
pub const GAIA_MATCH_THRESHOLD_ARCSEC: f64 = 1.5;
/// Years between the Gaia reference epoch and the catalog epoch (J2015.5 -> J2000).
pub const GAIA_EPOCH_OFFSET_YEARS: f64 = -15.5;

// Catalog cross-match step
pub const CROSS_MATCH_RADIUS_ARCSEC: f64 = 15.0;

// Spectroscopic step
pub const DUST_SEARCH_RADIUS_DEG: f64 = 0.02;
pub const DUST_LOOKUP_TIMEOUT_SECS: u64 = 60;

/// Decimal places kept on resolved parallaxes and masses.
pub const RESOLVED_DECIMALS: u32 = 2;

/// Default source flag for a newly added host.
pub const DEFAULT_SOURCE_FLAG: &str = "0";
