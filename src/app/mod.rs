pub mod add_hosts_use_case;
pub mod check_use_case;
pub mod ports;

pub use add_hosts_use_case::{AddHostsUseCase, RunSummary};
pub use check_use_case::{CheckReport, CheckUseCase};
