//! Process-wide configuration assembly (spec §9 REDESIGN FLAGS,
//! "Process-wide configuration").

pub mod config;
pub mod definitions;
pub mod endpoints;

pub use config::{CliArgs, ConfigError, ScanforgeConfig};
pub use definitions::builtin_scan_definitions;
pub use endpoints::{normalize, DaemonSocket, EndpointSource};
