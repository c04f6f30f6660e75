pub mod fetcher;
pub mod flattener;
pub mod pipeline;
pub mod writer;

pub use fetcher::ExportFetcher;
pub use pipeline::{ExportPipeline, RunSummary};
pub use writer::TableWriter;
