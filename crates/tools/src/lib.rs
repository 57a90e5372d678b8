//! LiFi Tools library

pub mod tx;
pub mod config;
pub mod sink;
pub mod common;

pub use tx::{TxConfig, Transmitter};
pub use config::LinkProfile;
pub use sink::{describe_symbol, export_events, ConsoleSink, RecordingSink};
pub use common::{init_logging, load_config, save_config, GlobalConfig};
