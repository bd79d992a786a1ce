// File storage: the RDB catalog, the exoplanet.eu export, and name lists

pub mod exoplanet_csv;
pub mod lists;
pub mod rdb;

pub use exoplanet_csv::{find_by_star_name, load_exoplanets};
pub use rdb::{format_record, parse_record, Catalog};
