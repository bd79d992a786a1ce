//! Cross-matching of SWEET-Cat against the exoplanet.eu host list.
//!
//! Each direction runs the same algorithm: nearest neighbour by position, accepted under
//! the threshold; otherwise an exact lookup of the normalised name; otherwise the entry
//! is unmatched and reported unless blacklisted.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info};

use super::matcher::nearest;
use super::names::normalize;
use crate::constants::DEFAULT_POSITION_THRESHOLD_ARCSEC;
use crate::domain::{ExoplanetRow, SkyPosition, StarRecord};
use crate::error::SweetCatError;

/// Anything that can be placed in a [`CatalogIndex`].
pub trait CatalogEntry {
    /// The star name used for reporting and for the name fallback.
    fn catalog_name(&self) -> String;
    /// Decimal-degree position, `None` when it cannot be parsed.
    fn catalog_position(&self) -> Option<SkyPosition>;
}

impl CatalogEntry for StarRecord {
    fn catalog_name(&self) -> String {
        self.name.trim().to_string()
    }

    fn catalog_position(&self) -> Option<SkyPosition> {
        self.sky_position().ok()
    }
}

impl CatalogEntry for ExoplanetRow {
    fn catalog_name(&self) -> String {
        self.host_from_planet_name()
    }

    fn catalog_position(&self) -> Option<SkyPosition> {
        self.sky_position().ok()
    }
}

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub name: String,
    pub normalized: String,
}

/// Names and positions of one catalog, ready for matching. Rebuild it whenever the
/// underlying rows change.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Vec<IndexEntry>,
    positions: Vec<Option<SkyPosition>>,
    by_name: HashMap<String, usize>,
}

impl CatalogIndex {
    pub fn build<E: CatalogEntry>(rows: &[E]) -> Self {
        let mut index = CatalogIndex {
            entries: Vec::with_capacity(rows.len()),
            positions: Vec::with_capacity(rows.len()),
            by_name: HashMap::with_capacity(rows.len()),
        };

        for (i, row) in rows.iter().enumerate() {
            let name = row.catalog_name();
            let normalized = normalize(&name);
            let position = row.catalog_position();
            if position.is_none() {
                debug!("No usable position for '{}', name matching only", name);
            }
            index.by_name.entry(normalized.clone()).or_insert(i);
            index.entries.push(IndexEntry { name, normalized });
            index.positions.push(position);
        }

        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&IndexEntry> {
        self.entries.get(index)
    }

    pub fn position(&self, index: usize) -> Option<SkyPosition> {
        self.positions.get(index).copied().flatten()
    }

    /// First entry whose normalised name equals `normalized`.
    pub fn find_normalized(&self, normalized: &str) -> Option<usize> {
        self.by_name.get(normalized).copied()
    }

    pub fn missing_positions(&self) -> usize {
        self.positions.iter().filter(|p| p.is_none()).count()
    }
}

/// Normalised names that are never reported as new or stale.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    names: HashSet<String>,
}

impl Blacklist {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(|n| normalize(n.as_ref())).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchMethod {
    Position,
    Name,
    None,
}

/// Outcome of matching one source entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub source_index: usize,
    pub source_name: String,
    pub target_index: Option<usize>,
    pub separation_arcsec: Option<f64>,
    pub method: MatchMethod,
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        self.method != MatchMethod::None
    }
}

#[derive(Debug, Clone)]
pub struct ReconciliationConfig {
    /// Maximum separation for two entries to be the same star.
    pub position_threshold_arcsec: f64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            position_threshold_arcsec: DEFAULT_POSITION_THRESHOLD_ARCSEC,
        }
    }
}

/// Both directions of a reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// In the exoplanet list but not in SWEET-Cat, sorted.
    pub new_stars: BTreeSet<String>,
    /// In SWEET-Cat but no longer in the exoplanet list, sorted.
    pub stale_stars: BTreeSet<String>,
    pub forward: Vec<MatchResult>,
    pub backward: Vec<MatchResult>,
}

impl Reconciliation {
    pub fn is_up_to_date(&self) -> bool {
        self.new_stars.is_empty() && self.stale_stars.is_empty()
    }
}

pub struct ReconciliationEngine {
    config: ReconciliationConfig,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new(ReconciliationConfig::default())
    }
}

impl ReconciliationEngine {
    pub fn new(config: ReconciliationConfig) -> Self {
        Self { config }
    }

    pub fn with_threshold(position_threshold_arcsec: f64) -> Self {
        Self::new(ReconciliationConfig {
            position_threshold_arcsec,
        })
    }

    pub fn threshold_arcsec(&self) -> f64 {
        self.config.position_threshold_arcsec
    }

    /// `source` is the exoplanet host index, `target` the SWEET-Cat index.
    pub fn reconcile(
        &self,
        source: &CatalogIndex,
        target: &CatalogIndex,
        blacklist: &Blacklist,
    ) -> Reconciliation {
        let forward = self.match_direction(source, target);
        let backward = self.match_direction(target, source);

        let new_stars = unmatched_names(&forward, blacklist);
        let stale_stars = unmatched_names(&backward, blacklist);

        info!(
            "Reconciled {} hosts against {} catalog stars: {} new, {} stale",
            source.len(),
            target.len(),
            new_stars.len(),
            stale_stars.len()
        );

        Reconciliation {
            new_stars,
            stale_stars,
            forward,
            backward,
        }
    }

    /// Match every entry of `source` against `target`.
    pub fn match_direction(&self, source: &CatalogIndex, target: &CatalogIndex) -> Vec<MatchResult> {
        source
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| self.match_entry(i, entry, source.position(i), target))
            .collect()
    }

    fn match_entry(
        &self,
        source_index: usize,
        entry: &IndexEntry,
        position: Option<SkyPosition>,
        target: &CatalogIndex,
    ) -> MatchResult {
        // 1. Position
        let closest = match position {
            Some(pos) => match nearest(&pos, &target.positions) {
                Ok(found) => Some(found),
                Err(SweetCatError::NoCandidates) => None,
                Err(e) => {
                    debug!("Positional match failed for '{}': {}", entry.name, e);
                    None
                }
            },
            None => None,
        };

        if let Some(found) = closest {
            if found.separation_arcsec < self.config.position_threshold_arcsec {
                return MatchResult {
                    source_index,
                    source_name: entry.name.clone(),
                    target_index: Some(found.index),
                    separation_arcsec: Some(found.separation_arcsec),
                    method: MatchMethod::Position,
                };
            }
        }

        // 2. Name fallback: stale coordinates or large proper motion
        if let Some(target_index) = target.find_normalized(&entry.normalized) {
            let separation_arcsec = position
                .zip(target.position(target_index))
                .map(|(a, b)| a.separation_arcsec(&b));
            debug!(
                "'{}' matched by name (separation {:?} arcsec)",
                entry.name, separation_arcsec
            );
            return MatchResult {
                source_index,
                source_name: entry.name.clone(),
                target_index: Some(target_index),
                separation_arcsec,
                method: MatchMethod::Name,
            };
        }

        MatchResult {
            source_index,
            source_name: entry.name.clone(),
            target_index: None,
            separation_arcsec: None,
            method: MatchMethod::None,
        }
    }
}

/// Unmatched, non-blacklisted names, deduplicated and sorted.
pub fn unmatched_names(matches: &[MatchResult], blacklist: &Blacklist) -> BTreeSet<String> {
    matches
        .iter()
        .filter(|m| !m.is_matched())
        .filter(|m| {
            let skip = blacklist.contains(&m.source_name);
            if skip {
                debug!("'{}' is blacklisted", m.source_name);
            }
            !skip
        })
        .map(|m| m.source_name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry {
        name: &'static str,
        position: Option<(f64, f64)>,
    }

    impl CatalogEntry for Entry {
        fn catalog_name(&self) -> String {
            self.name.to_string()
        }

        fn catalog_position(&self) -> Option<SkyPosition> {
            self.position
                .and_then(|(ra, dec)| SkyPosition::from_degrees(ra, dec).ok())
        }
    }

    fn entry(name: &'static str, ra: f64, dec: f64) -> Entry {
        Entry {
            name,
            position: Some((ra, dec)),
        }
    }

    fn catalog() -> Vec<Entry> {
        vec![
            entry("51 Peg", 344.3666, 20.7689),
            entry("HD 209458", 330.7950, 18.8843),
            entry("Kepler-9", 285.6761, 38.4008),
        ]
    }

    #[test]
    fn test_identical_catalogs_are_up_to_date() {
        let index = CatalogIndex::build(&catalog());
        let result = ReconciliationEngine::default().reconcile(&index, &index, &Blacklist::default());
        assert!(result.is_up_to_date());
        assert!(result.forward.iter().all(|m| m.method == MatchMethod::Position));
    }

    #[test]
    fn test_new_and_stale_stars() {
        let exo = vec![
            entry("51 Peg", 344.3666, 20.7689),
            entry("WASP-12", 97.6364, 29.6722),
            entry("WASP-12", 97.6364, 29.6722),
        ];
        let sc = catalog();
        let result = ReconciliationEngine::default().reconcile(
            &CatalogIndex::build(&exo),
            &CatalogIndex::build(&sc),
            &Blacklist::default(),
        );
        assert_eq!(result.new_stars.into_iter().collect::<Vec<_>>(), vec!["WASP-12"]);
        assert_eq!(
            result.stale_stars.into_iter().collect::<Vec<_>>(),
            vec!["HD 209458", "Kepler-9"]
        );
    }

    #[test]
    fn test_name_fallback_when_position_is_off() {
        // Same star, coordinates 1 degree apart, different spelling
        let exo = vec![entry("Kepler 9", 286.6761, 38.4008)];
        let sc = catalog();
        let matches = ReconciliationEngine::default()
            .match_direction(&CatalogIndex::build(&exo), &CatalogIndex::build(&sc));
        assert_eq!(matches[0].method, MatchMethod::Name);
        assert_eq!(matches[0].target_index, Some(2));
    }

    #[test]
    fn test_invalid_position_still_tries_name() {
        let exo = vec![
            Entry {
                name: "HD-209458",
                position: None,
            },
            Entry {
                name: "Lost Star",
                position: Some((f64::NAN, 0.0)),
            },
        ];
        let result = ReconciliationEngine::default().reconcile(
            &CatalogIndex::build(&exo),
            &CatalogIndex::build(&catalog()),
            &Blacklist::default(),
        );
        assert_eq!(result.forward[0].method, MatchMethod::Name);
        assert_eq!(result.new_stars.into_iter().collect::<Vec<_>>(), vec!["Lost Star"]);
    }

    #[test]
    fn test_sixty_second_catalog_row_still_matches_by_position() {
        let mut star = StarRecord::empty("BD+20 2457");
        star.ra = "10 16 60.00".to_string();
        star.dec = "+19 28 59.99".to_string();
        let planet = ExoplanetRow {
            name: "TYC 1422-614-1 b".to_string(),
            ra: Some(154.25),
            dec: Some(19.483331),
            ..Default::default()
        };

        let result = ReconciliationEngine::default().reconcile(
            &CatalogIndex::build(&[planet]),
            &CatalogIndex::build(&[star]),
            &Blacklist::default(),
        );

        assert!(result.is_up_to_date());
        assert_eq!(result.forward[0].method, MatchMethod::Position);
    }

    #[test]
    fn test_blacklist_applies_both_directions() {
        let exo = vec![entry("Kapteyn's", 77.9, -45.0)];
        let sc = vec![entry("Old Star", 10.0, 10.0)];
        let blacklist = Blacklist::new(["kapteyn's", "OLD-STAR"]);
        let result = ReconciliationEngine::default().reconcile(
            &CatalogIndex::build(&exo),
            &CatalogIndex::build(&sc),
            &blacklist,
        );
        assert!(result.is_up_to_date());
    }

    #[test]
    fn test_empty_target_reports_everything() {
        let exo = catalog();
        let empty: Vec<Entry> = Vec::new();
        let result = ReconciliationEngine::default().reconcile(
            &CatalogIndex::build(&exo),
            &CatalogIndex::build(&empty),
            &Blacklist::default(),
        );
        assert_eq!(result.new_stars.len(), 3);
        assert!(result.stale_stars.is_empty());
    }

    #[test]
    fn test_shrinking_threshold_only_loses_matches() {
        // 3 arcsec apart, different names
        let exo = vec![entry("Alpha", 10.0, 10.0)];
        let sc = vec![entry("Beta", 10.0, 10.0 + 3.0 / 3600.0)];
        let (exo, sc) = (CatalogIndex::build(&exo), CatalogIndex::build(&sc));

        let mut previous = 0;
        for threshold in [10.0, 5.0, 3.5, 2.0, 0.5] {
            let result = ReconciliationEngine::with_threshold(threshold)
                .reconcile(&exo, &sc, &Blacklist::default());
            let unmatched = result.new_stars.len() + result.stale_stars.len();
            assert!(unmatched >= previous);
            previous = unmatched;
        }
        assert_eq!(previous, 2);
    }
}
