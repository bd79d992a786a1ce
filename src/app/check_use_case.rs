use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::ports::CandidateListPort;
use crate::config::Config;
use crate::domain::ExoplanetRow;
use crate::observability::metrics;
use crate::pipeline::processing::reconcile::{Blacklist, CatalogIndex, ReconciliationEngine};
use crate::pipeline::storage::{lists, load_exoplanets, Catalog};

/// What a check found. Names are sorted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub exoplanet_hosts: usize,
    pub catalog_stars: usize,
    pub new_stars: Vec<String>,
    pub stale_stars: Vec<String>,
    /// Entries that could only be matched by name.
    pub missing_positions: usize,
}

impl CheckReport {
    pub fn is_up_to_date(&self) -> bool {
        self.new_stars.is_empty() && self.stale_stars.is_empty()
    }
}

/// Use case for checking SWEET-Cat against the exoplanet.eu host list
pub struct CheckUseCase {
    engine: ReconciliationEngine,
    candidates: Arc<dyn CandidateListPort>,
}

impl CheckUseCase {
    pub fn new(engine: ReconciliationEngine, candidates: Arc<dyn CandidateListPort>) -> Self {
        Self { engine, candidates }
    }

    /// Load the configured files and check them.
    pub async fn run(&self, config: &Config) -> Result<CheckReport> {
        let paths = &config.paths;
        let catalog = Catalog::load(&paths.catalog)
            .with_context(|| format!("loading catalog {}", paths.catalog.display()))?;
        let exoplanets = load_exoplanets(&paths.exoplanets, config.reconcile.include_unconfirmed)
            .with_context(|| format!("loading exoplanet export {}", paths.exoplanets.display()))?;
        let blacklist = Blacklist::new(
            lists::read_names_or_empty(&paths.blacklist)
                .with_context(|| format!("loading blacklist {}", paths.blacklist.display()))?,
        );
        info!("{} names blacklisted", blacklist.len());

        self.check(&catalog, &exoplanets, &blacklist).await
    }

    /// Reconcile in-memory catalogs and write the new hosts to the candidate list.
    pub async fn check(
        &self,
        catalog: &Catalog,
        exoplanets: &[ExoplanetRow],
        blacklist: &Blacklist,
    ) -> Result<CheckReport> {
        let exo_index = CatalogIndex::build(exoplanets);
        let sc_index = CatalogIndex::build(catalog.records());
        let missing_positions = exo_index.missing_positions() + sc_index.missing_positions();
        if missing_positions > 0 {
            warn!("{} entries without a usable position, matched by name only", missing_positions);
        }

        let reconciliation = self.engine.reconcile(&exo_index, &sc_index, blacklist);
        let new_stars: Vec<String> = reconciliation.new_stars.into_iter().collect();
        let stale_stars: Vec<String> = reconciliation.stale_stars.into_iter().collect();

        metrics::reconcile::new_stars(new_stars.len());
        metrics::reconcile::stale_stars(stale_stars.len());
        metrics::reconcile::missing_positions(missing_positions);

        for name in &stale_stars {
            warn!("{} is in SWEET-Cat but no longer in the exoplanet list", name);
        }

        self.candidates
            .write_candidates(&new_stars)
            .await
            .context("writing candidate list")?;

        let report = CheckReport {
            exoplanet_hosts: exo_index.len(),
            catalog_stars: sc_index.len(),
            new_stars,
            stale_stars,
            missing_positions,
        };
        if report.is_up_to_date() {
            info!("SWEET-Cat is up to date");
        } else {
            info!(
                "{} new and {} stale stars",
                report.new_stars.len(),
                report.stale_stars.len()
            );
        }
        Ok(report)
    }
}
