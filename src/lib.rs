pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod report;
pub mod shutdown;
pub mod vendor;

pub use config::{CategoryMap, Config, ExportParams};
pub use error::{Error, Result};
pub use export::{ExportFetcher, ExportPipeline, RunSummary, TableWriter};
pub use shutdown::ShutdownFlag;
pub use vendor::{DecodePolicy, ExportService, HttpExportService};
