use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::ExportParams;
use crate::error::{Error, Result};
use crate::shutdown::ShutdownFlag;
use crate::vendor::sanitize::{sanitize_value, DecodePolicy};
use crate::vendor::service::{ExportOutcome, ExportService};

pub struct ExportFetcher {
    service: Arc<dyn ExportService>,
    retries: u32,
    retry_delay: Duration,
    decode_policy: DecodePolicy,
    shutdown: ShutdownFlag,
}

impl ExportFetcher {
    pub fn new(
        service: Arc<dyn ExportService>,
        retries: u32,
        retry_delay: Duration,
        decode_policy: DecodePolicy,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            service,
            retries,
            retry_delay,
            decode_policy,
            shutdown,
        }
    }

    pub async fn fetch(
        &self,
        project_id: &str,
        params: &ExportParams,
        filters: Option<&Value>,
    ) -> Result<Vec<Value>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_fetch(project_id, params, filters).await {
                Ok(items) => return Ok(items),
                Err(e) if e.is_retryable() && attempt < self.retries => {
                    tracing::warn!(
                        "attempt {} failed for project {}: {}",
                        attempt,
                        project_id,
                        e
                    );
                    if self.shutdown.is_triggered() {
                        return Err(Error::Cancelled);
                    }
                    tracing::info!("retrying in {:?}", self.retry_delay);
                    sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_fetch(
        &self,
        project_id: &str,
        params: &ExportParams,
        filters: Option<&Value>,
    ) -> Result<Vec<Value>> {
        let job = self.service.request_export(project_id, params, filters).await?;

        match self.service.await_completion(&job).await? {
            ExportOutcome::Failed(errors) => Err(Error::PermanentExport(format!(
                "errors during data export for project {}: {}",
                project_id,
                errors.join("; ")
            ))),
            ExportOutcome::Completed(items) => {
                if items.is_empty() {
                    return Err(Error::PermanentExport(format!(
                        "no results found for project {}",
                        project_id
                    )));
                }
                Ok(self.accept_items(items))
            }
        }
    }

    fn accept_items(&self, items: Vec<Value>) -> Vec<Value> {
        let mut accepted = Vec::with_capacity(items.len());
        for item in items {
            match accept_item(item) {
                Ok(item) => accepted.push(sanitize_value(item, self.decode_policy)),
                Err(e) => tracing::warn!("{}", e),
            }
        }
        accepted
    }
}

// A result item must carry both a row-data block and a per-project block.
fn accept_item(item: Value) -> Result<Value> {
    let envelope_ok = item
        .as_object()
        .map(|obj| obj.contains_key("data_row") && obj.contains_key("projects"))
        .unwrap_or(false);

    if !envelope_ok {
        return Err(Error::MalformedRecord(format!(
            "unexpected structure in result item: {}",
            item
        )));
    }

    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    use crate::vendor::service::{ExportJob, ProjectInfo};

    struct ScriptedService {
        transient_failures: u32,
        requests: Mutex<u32>,
        outcome: ExportOutcome,
    }

    impl ScriptedService {
        fn new(transient_failures: u32, outcome: ExportOutcome) -> Self {
            Self {
                transient_failures,
                requests: Mutex::new(0),
                outcome,
            }
        }

        fn request_count(&self) -> u32 {
            *self.requests.lock().unwrap()
        }
    }

    #[async_trait]
    impl ExportService for ScriptedService {
        async fn request_export(
            &self,
            _project_id: &str,
            _params: &ExportParams,
            _filters: Option<&Value>,
        ) -> Result<ExportJob> {
            let mut requests = self.requests.lock().unwrap();
            *requests += 1;
            if *requests <= self.transient_failures {
                return Err(Error::TransientService("connection reset".to_string()));
            }
            Ok(ExportJob {
                id: "job-1".to_string(),
            })
        }

        async fn await_completion(&self, _job: &ExportJob) -> Result<ExportOutcome> {
            Ok(self.outcome.clone())
        }

        async fn project_metadata(&self, project_id: &str) -> Result<ProjectInfo> {
            Ok(ProjectInfo {
                id: project_id.to_string(),
                name: "Test Project".to_string(),
            })
        }
    }

    fn fetcher(service: Arc<ScriptedService>, retries: u32) -> ExportFetcher {
        ExportFetcher::new(
            service,
            retries,
            Duration::from_millis(1),
            DecodePolicy::Backslash,
            ShutdownFlag::new(),
        )
    }

    fn valid_item() -> Value {
        json!({"data_row": {"row_data": "text"}, "projects": {}})
    }

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let service = Arc::new(ScriptedService::new(
            4,
            ExportOutcome::Completed(vec![valid_item()]),
        ));
        let fetcher = fetcher(service.clone(), 5);

        let items = fetcher
            .fetch("proj", &ExportParams::default(), None)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(service.request_count(), 5);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let service = Arc::new(ScriptedService::new(
            u32::MAX,
            ExportOutcome::Completed(vec![valid_item()]),
        ));
        let fetcher = fetcher(service.clone(), 5);

        let err = fetcher
            .fetch("proj", &ExportParams::default(), None)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(service.request_count(), 5);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let service = Arc::new(ScriptedService::new(
            0,
            ExportOutcome::Failed(vec!["schema mismatch".to_string()]),
        ));
        let fetcher = fetcher(service.clone(), 5);

        let err = fetcher
            .fetch("proj", &ExportParams::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermanentExport(_)));
        assert_eq!(service.request_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_result_set_is_permanent() {
        let service = Arc::new(ScriptedService::new(0, ExportOutcome::Completed(Vec::new())));
        let fetcher = fetcher(service.clone(), 5);

        let err = fetcher
            .fetch("proj", &ExportParams::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermanentExport(_)));
        assert_eq!(service.request_count(), 1);
    }

    #[tokio::test]
    async fn test_items_without_envelope_are_dropped() {
        let service = Arc::new(ScriptedService::new(
            0,
            ExportOutcome::Completed(vec![
                valid_item(),
                json!({"data_row": {}}),
                json!("not an object"),
            ]),
        ));
        let fetcher = fetcher(service, 5);

        let items = fetcher
            .fetch("proj", &ExportParams::default(), None)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }
}
