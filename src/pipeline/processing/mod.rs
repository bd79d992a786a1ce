// Pipeline processing: name handling, cross-matching, and attribute resolution

pub mod host;
pub mod mass;
pub mod matcher;
pub mod names;
pub mod parallax;
pub mod provenance;
pub mod reconcile;

pub use host::{HostAssembler, HostAssemblerConfig};
pub use mass::MassEstimator;
pub use parallax::{ParallaxQuery, ParallaxResolver, ParallaxResolverConfig, ResolvedParallax};
pub use provenance::{ProvenanceTracker, ResolutionStep};
pub use reconcile::{Blacklist, CatalogIndex, Reconciliation, ReconciliationConfig, ReconciliationEngine};
