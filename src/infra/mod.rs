// Adapters for the application ports: external programs, files, and the terminal

pub mod catalog_output_adapter;
pub mod command_adapter;
pub mod prompt;

use std::sync::Arc;
use tracing::{info, warn};

use crate::app::ports::{
    AstrometricLookupPort, CatalogCrossMatchPort, DustExtinctionPort, MassCalibrationPort,
    SpectroscopicParallaxPort,
};
use crate::config::Config;
use command_adapter::{CommandAdapter, UnboundPort};

pub use catalog_output_adapter::FileHostOutputAdapter;
pub use prompt::{NonInteractive, StdinPrompt};

/// The five lookup ports, bound from `[commands]`.
#[derive(Clone)]
pub struct LookupPorts {
    pub astrometry: Arc<dyn AstrometricLookupPort>,
    pub cross_match: Arc<dyn CatalogCrossMatchPort>,
    pub dust: Arc<dyn DustExtinctionPort>,
    pub mass: Arc<dyn MassCalibrationPort>,
    pub spectroscopic_parallax: Arc<dyn SpectroscopicParallaxPort>,
}

/// One adapter per port: a command when configured, otherwise a port that always fails.
macro_rules! bind_port {
    ($service:literal, $spec:expr, $timeout:expr) => {
        match $spec {
            Some(spec) => {
                info!("{} bound to '{}'", $service, spec.program);
                Arc::new(CommandAdapter::new($service, spec, $timeout))
            }
            None => {
                warn!("No command configured for {}; that source will be skipped", $service);
                Arc::new(UnboundPort::new($service))
            }
        }
    };
}

impl LookupPorts {
    pub fn from_config(config: &Config) -> Self {
        let commands = &config.commands;
        let lookup = config.lookup_timeout();
        let dust_timeout = config.parallax().dust_timeout;

        let astrometry: Arc<dyn AstrometricLookupPort> =
            bind_port!("astrometry", commands.astrometry.as_ref(), lookup);
        let cross_match: Arc<dyn CatalogCrossMatchPort> =
            bind_port!("cross_match", commands.cross_match.as_ref(), lookup);
        let dust: Arc<dyn DustExtinctionPort> = bind_port!("dust", commands.dust.as_ref(), dust_timeout);
        let mass: Arc<dyn MassCalibrationPort> = bind_port!("mass", commands.mass.as_ref(), lookup);
        let spectroscopic_parallax: Arc<dyn SpectroscopicParallaxPort> = bind_port!(
            "spectroscopic_parallax",
            commands.spectroscopic_parallax.as_ref(),
            lookup
        );

        Self {
            astrometry,
            cross_match,
            dust,
            mass,
            spectroscopic_parallax,
        }
    }
}
