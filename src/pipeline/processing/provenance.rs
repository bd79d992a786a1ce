use tracing::{info, warn};

use crate::domain::{Measurement, ParallaxFlag};
use crate::observability::metrics;

/// Steps of the parallax resolution chain, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResolutionStep {
    Astrometric,
    Catalog,
    Spectroscopic,
    Unresolved,
}

impl ResolutionStep {
    pub const CHAIN: [ResolutionStep; 3] = [
        ResolutionStep::Astrometric,
        ResolutionStep::Catalog,
        ResolutionStep::Spectroscopic,
    ];
}

/// Maps resolution steps to provenance flags and reports each outcome. Holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvenanceTracker;

impl ProvenanceTracker {
    pub fn flag_for(step: ResolutionStep) -> ParallaxFlag {
        match step {
            ResolutionStep::Astrometric => ParallaxFlag::Gaia,
            ResolutionStep::Catalog => ParallaxFlag::Catalog,
            ResolutionStep::Spectroscopic => ParallaxFlag::Spectroscopic,
            ResolutionStep::Unresolved => ParallaxFlag::None,
        }
    }

    /// Log and count the outcome for `star`. Unresolved values are reported, never dropped.
    pub fn record(star: &str, step: ResolutionStep, value: &Measurement) -> ParallaxFlag {
        let flag = Self::flag_for(step);
        metrics::resolution::parallax_resolved(flag);
        match step {
            ResolutionStep::Unresolved => {
                warn!("No parallax for {}: every source failed (flag {})", star, flag)
            }
            _ => info!(
                "Parallax for {}: {} ± {} [{}]",
                star, value.value, value.error, flag
            ),
        }
        flag
    }
}
