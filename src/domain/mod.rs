//! Data shapes shared by the matching, resolution and storage layers.

pub mod exoplanet;
pub mod numeric;
pub mod sky;
pub mod star;

pub use exoplanet::ExoplanetRow;
pub use numeric::{Measurement, Numeric};
pub use sky::SkyPosition;
pub use star::{ParallaxFlag, StarRecord};
