use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use labeltrack::report::{aggregate, write_reports};
use labeltrack::{
    CategoryMap, Config, DecodePolicy, ExportFetcher, ExportParams, ExportPipeline,
    ExportService, HttpExportService, ShutdownFlag, TableWriter,
};

#[derive(Parser, Debug)]
#[command(name = "labeltrack")]
#[command(version = "0.1.0")]
#[command(about = "Export annotation project data and build labeling-progress tracking reports")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch exports for every configured project and persist per-project tables
    Export {
        /// JSON file mapping category names to ordered project id lists
        #[arg(long, default_value = "categories.json")]
        categories: String,

        /// Directory receiving per-project NDJSON and CSV artifacts
        #[arg(long, default_value = "exports")]
        exports_dir: String,

        /// Export attempts per project before giving up
        #[arg(long, default_value_t = 5)]
        retries: u32,

        /// Seconds to wait between retry attempts
        #[arg(long, default_value_t = 5)]
        retry_delay: u64,

        /// How invalid bytes in vendor output are re-encoded (replace, backslash)
        #[arg(long, default_value = "backslash")]
        decode_policy: String,
    },
    /// Build the consolidated tracking report from persisted tables
    Report {
        /// Directory containing the per-category export tables
        #[arg(long, default_value = "exports")]
        exports_dir: String,

        /// Directory receiving the date-stamped report files
        #[arg(long, default_value = "tracking_data")]
        reports_dir: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("labeltrack=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    match args.command {
        Command::Export {
            categories,
            exports_dir,
            retries,
            retry_delay,
            decode_policy,
        } => run_export(categories, exports_dir, retries, retry_delay, decode_policy).await,
        Command::Report {
            exports_dir,
            reports_dir,
        } => run_report(exports_dir, reports_dir),
    }
}

async fn run_export(
    categories: String,
    exports_dir: String,
    retries: u32,
    retry_delay: u64,
    decode_policy: String,
) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let categories = CategoryMap::from_file(&categories)?;

    let decode_policy: DecodePolicy = decode_policy.parse()?;

    let shutdown = ShutdownFlag::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("ctrl-c received, finishing current project");
                shutdown.trigger();
            }
        });
    }

    let service: Arc<dyn ExportService> = Arc::new(HttpExportService::new(
        &config.api_key,
        config.base_url.clone(),
        config.poll_interval,
        decode_policy,
        shutdown.clone(),
    )?);

    let fetcher = ExportFetcher::new(
        service.clone(),
        retries,
        Duration::from_secs(retry_delay),
        decode_policy,
        shutdown.clone(),
    );

    let pipeline = ExportPipeline::new(
        service,
        fetcher,
        TableWriter::new(exports_dir),
        ExportParams::default(),
        shutdown,
    );

    tracing::info!("starting export for {} projects", categories.project_count());
    let summary = pipeline.run(&categories).await?;
    tracing::info!(
        "processing completed: {} exported, {} failed",
        summary.exported,
        summary.failed
    );

    Ok(())
}

fn run_report(exports_dir: String, reports_dir: String) -> anyhow::Result<()> {
    let model = aggregate(&exports_dir)?;
    tracing::info!("aggregated {} project tables", model.entries.len());

    let date = chrono::Local::now().date_naive();
    let (csv_path, txt_path) = write_reports(&model, Path::new(&reports_dir), date)?;
    tracing::info!("report generated and saved to {}", csv_path.display());
    tracing::info!("report generated and saved to {}", txt_path.display());

    Ok(())
}
