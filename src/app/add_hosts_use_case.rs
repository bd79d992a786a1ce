use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::app::ports::{HostOutputPort, MissingValuePort};
use crate::config::Config;
use crate::domain::ExoplanetRow;
use crate::observability::metrics;
use crate::pipeline::processing::HostAssembler;
use crate::pipeline::storage::{find_by_star_name, lists, load_exoplanets, Catalog};

/// Counts for one add-hosts run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub added: usize,
    /// Already in the catalog
    pub skipped: usize,
    /// Not found in the exoplanet list, sent to the manual list
    pub manual: usize,
    /// Names left in the candidate list
    pub remaining: usize,
    /// The run stopped because a star was refused.
    pub stopped: bool,
    /// Added records per parallax flag
    pub parallax_flags: BTreeMap<String, usize>,
}

impl RunSummary {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            added: 0,
            skipped: 0,
            manual: 0,
            remaining: 0,
            stopped: false,
            parallax_flags: BTreeMap::new(),
        }
    }
}

/// Use case for adding new hosts to SWEET-Cat, one star at a time.
///
/// The candidate list is rewritten after every star, so an interrupted run resumes
/// where it stopped.
pub struct AddHostsUseCase {
    assembler: HostAssembler,
    values: Arc<dyn MissingValuePort>,
    output: Arc<dyn HostOutputPort>,
}

impl AddHostsUseCase {
    pub fn new(
        assembler: HostAssembler,
        values: Arc<dyn MissingValuePort>,
        output: Arc<dyn HostOutputPort>,
    ) -> Self {
        Self {
            assembler,
            values,
            output,
        }
    }

    /// Load the candidate list, the exoplanet export and the catalog, then run.
    ///
    /// Records already appended to the output file by earlier runs count as present.
    pub async fn run_from_files(&self, config: &Config) -> Result<(RunSummary, Catalog)> {
        let paths = &config.paths;
        let names = lists::read_names(&paths.names)
            .with_context(|| format!("reading candidate list {}", paths.names.display()))?;
        let exoplanets = load_exoplanets(&paths.exoplanets, config.reconcile.include_unconfirmed)
            .with_context(|| format!("loading exoplanet export {}", paths.exoplanets.display()))?;
        let mut catalog = Catalog::load(&paths.catalog)
            .with_context(|| format!("loading catalog {}", paths.catalog.display()))?;

        if paths.output != paths.catalog && paths.output.exists() {
            let appended = Catalog::load(&paths.output)
                .with_context(|| format!("loading {}", paths.output.display()))?;
            for record in appended.records() {
                catalog.push(record.clone());
            }
        }

        self.run(names, &exoplanets, catalog).await
    }

    /// Process `names` in order against `catalog`, which is returned with the new records.
    pub async fn run(
        &self,
        names: Vec<String>,
        exoplanets: &[ExoplanetRow],
        catalog: Catalog,
    ) -> Result<(RunSummary, Catalog)> {
        let run_id = Uuid::new_v4();
        let span = info_span!("add_hosts", run_id = %run_id);
        self.process(run_id, names, exoplanets, catalog)
            .instrument(span)
            .await
    }

    async fn process(
        &self,
        run_id: Uuid,
        names: Vec<String>,
        exoplanets: &[ExoplanetRow],
        mut catalog: Catalog,
    ) -> Result<(RunSummary, Catalog)> {
        let mut summary = RunSummary::new(run_id);
        let mut remaining: VecDeque<String> = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        info!("{} candidate hosts to process", remaining.len());

        while let Some(name) = remaining.front().cloned() {
            match find_by_star_name(exoplanets, &name) {
                None => {
                    warn!("{} not found in the exoplanet list, add it manually", name);
                    self.output
                        .append_manual(&name)
                        .await
                        .with_context(|| format!("recording {} for manual entry", name))?;
                    metrics::hosts::manual();
                    summary.manual += 1;
                }
                Some(_) if catalog.contains_name(&name) => {
                    warn!("{} is already in SWEET-Cat, skipping", name);
                    metrics::hosts::skipped();
                    summary.skipped += 1;
                }
                Some(row) => {
                    if !self.values.confirm(&name) {
                        info!("Stopped before {}", name);
                        summary.stopped = true;
                        break;
                    }

                    let record = self.assembler.assemble(&name, row).await;
                    self.output
                        .append_record(&record)
                        .await
                        .with_context(|| format!("appending {}", name))?;
                    metrics::hosts::added();
                    summary.added += 1;
                    *summary
                        .parallax_flags
                        .entry(record.parallax_flag.clone())
                        .or_insert(0) += 1;
                    catalog.push(record);
                }
            }

            remaining.pop_front();
            self.output
                .write_remaining(remaining.make_contiguous())
                .await
                .context("rewriting candidate list")?;
        }

        summary.remaining = remaining.len();
        info!(
            "Run finished: {} added, {} skipped, {} manual, {} left",
            summary.added, summary.skipped, summary.manual, summary.remaining
        );
        Ok((summary, catalog))
    }
}
