// Rebuilt from the persisted flat tables on every report run.
#[derive(Debug, Clone, Default)]
pub struct ReportModel {
    pub entries: Vec<TrackingReportEntry>,
}

#[derive(Debug, Clone)]
pub struct TrackingReportEntry {
    pub category: String,
    pub project_name: String,
    pub grade_level: Option<u32>,
    pub progress: ProjectProgress,
    pub contributors: Vec<ContributorRollup>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectProgress {
    pub total_items: u64,
    pub fully_labeled: u64,
}

impl ProjectProgress {
    pub fn summary(&self) -> String {
        format!("{}/{} items fully labeled", self.fully_labeled, self.total_items)
    }
}

#[derive(Debug, Clone)]
pub struct ContributorRollup {
    pub email: String,
    pub labels: u64,
    pub percentage: f64,
    pub time_minutes: f64,
}
