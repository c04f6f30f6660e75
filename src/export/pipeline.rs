use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;

use crate::config::{CategoryMap, ExportParams};
use crate::error::{Error, Result};
use crate::export::fetcher::ExportFetcher;
use crate::export::writer::{file_slug, TableWriter};
use crate::shutdown::ShutdownFlag;
use crate::vendor::service::ExportService;

pub struct ExportPipeline {
    service: Arc<dyn ExportService>,
    fetcher: ExportFetcher,
    writer: TableWriter,
    params: ExportParams,
    shutdown: ShutdownFlag,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub exported: usize,
    pub failed: usize,
}

impl ExportPipeline {
    pub fn new(
        service: Arc<dyn ExportService>,
        fetcher: ExportFetcher,
        writer: TableWriter,
        params: ExportParams,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            service,
            fetcher,
            writer,
            params,
            shutdown,
        }
    }

    pub async fn run(&self, categories: &CategoryMap) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        let pb = ProgressBar::new(categories.project_count() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} projects")
                .unwrap()
                .progress_chars("#>-"),
        );

        'categories: for group in &categories.groups {
            let dir = match self.writer.category_dir(&group.category) {
                Ok(dir) => dir,
                Err(e) => {
                    tracing::error!(
                        "cannot prepare directory for category {}: {}",
                        group.category,
                        e
                    );
                    summary.failed += group.project_ids.len();
                    pb.inc(group.project_ids.len() as u64);
                    continue;
                }
            };

            for project_id in &group.project_ids {
                if self.shutdown.is_triggered() {
                    tracing::info!("shutdown requested, stopping before project {}", project_id);
                    break 'categories;
                }

                match self.process_project(&dir, &group.category, project_id).await {
                    Ok(()) => summary.exported += 1,
                    Err(Error::Cancelled) => {
                        tracing::info!("shutdown requested during project {}", project_id);
                        break 'categories;
                    }
                    Err(e) => {
                        tracing::error!("an error occurred with project {}: {}", project_id, e);
                        summary.failed += 1;
                    }
                }
                pb.inc(1);
            }
        }

        pb.finish_with_message("export complete");
        Ok(summary)
    }

    async fn process_project(&self, dir: &Path, category: &str, project_id: &str) -> Result<()> {
        let info = self.service.project_metadata(project_id).await?;
        let project_name = file_slug(&info.name);
        tracing::info!("processing project {} in category {}", project_name, category);

        let items = self.fetcher.fetch(project_id, &self.params, None).await?;

        let ndjson_path = self.writer.write_ndjson(dir, &project_name, &items)?;
        tracing::info!("NDJSON file saved at {}", ndjson_path.display());

        let csv_path = self.writer.write_flat_table(&ndjson_path, dir, &project_name)?;
        tracing::info!("flat table saved at {}", csv_path.display());

        Ok(())
    }
}
