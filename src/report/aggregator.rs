use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::report::{ContributorRollup, ProjectProgress, ReportModel, TrackingReportEntry};
use crate::models::row::CONTRIBUTOR_SLOTS;
use crate::report::grade::parse_grade_level;

// Populated contributor slots required for an item to count as fully labeled.
const FULLY_LABELED_THRESHOLD: usize = 3;

pub fn aggregate<P: AsRef<Path>>(exports_dir: P) -> Result<ReportModel> {
    let exports_dir = exports_dir.as_ref();
    let mut entries = Vec::new();

    for dir_entry in fs::read_dir(exports_dir)? {
        let dir_entry = dir_entry?;
        let category_path = dir_entry.path();
        if !category_path.is_dir() {
            continue;
        }
        let category = dir_entry.file_name().to_string_lossy().into_owned();

        for file_entry in fs::read_dir(&category_path)? {
            let file_path = file_entry?.path();
            if file_path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }

            match scan_table(&file_path) {
                Ok(scan) => {
                    let grade_level = parse_grade_level(&scan.project_name);
                    entries.push(TrackingReportEntry {
                        category: category.clone(),
                        project_name: scan.project_name,
                        grade_level,
                        progress: scan.progress,
                        contributors: scan.contributors,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "skipping file {} in {}: {}",
                        file_path.display(),
                        category,
                        e
                    );
                }
            }
        }
    }

    sort_entries(&mut entries);
    Ok(ReportModel { entries })
}

struct TableScan {
    project_name: String,
    progress: ProjectProgress,
    contributors: Vec<ContributorRollup>,
}

struct RollupAcc {
    email: String,
    labels: f64,
    time_minutes: f64,
}

fn scan_table(path: &Path) -> Result<TableScan> {
    let raw = fs::read_to_string(path)?;
    let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let name_idx = headers.iter().position(|h| h == "dataset_name");

    // Column indices per slot: every present items_labeled column feeds the
    // fully-labeled predicate; a slot feeds rollups only when complete.
    let mut items_columns = Vec::new();
    let mut slot_columns = Vec::new();
    for i in 1..=CONTRIBUTOR_SLOTS {
        let email = headers
            .iter()
            .position(|h| h == format!("labeller_{}_email", i));
        let items = headers
            .iter()
            .position(|h| h == format!("labeller_{}_items_labeled", i));
        let time = headers
            .iter()
            .position(|h| h == format!("labeller_{}_time_minutes", i));

        if let Some(items) = items {
            items_columns.push(items);
        }
        if let (Some(email), Some(items), Some(time)) = (email, items, time) {
            slot_columns.push((email, items, time));
        }
    }

    if items_columns.is_empty() {
        return Err(Error::IncompatibleTable(format!(
            "{} has no contributor columns",
            path.display()
        )));
    }

    let mut total_items = 0u64;
    let mut fully_labeled = 0u64;
    let mut project_name: Option<String> = None;
    let mut rollups: Vec<RollupAcc> = Vec::new();

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("skipping unreadable row in {}: {}", path.display(), e);
                continue;
            }
        };
        total_items += 1;

        if project_name.is_none() {
            if let Some(idx) = name_idx {
                let cell = record.get(idx).unwrap_or("");
                if !cell.is_empty() {
                    project_name = Some(cell.to_string());
                }
            }
        }

        let populated = items_columns
            .iter()
            .filter(|&&idx| !record.get(idx).unwrap_or("").is_empty())
            .count();
        if populated >= FULLY_LABELED_THRESHOLD {
            fully_labeled += 1;
        }

        for &(email_idx, items_idx, time_idx) in &slot_columns {
            let email = record.get(email_idx).unwrap_or("");
            let items = record.get(items_idx).unwrap_or("");
            let time = record.get(time_idx).unwrap_or("");
            if email.is_empty() || items.is_empty() || time.is_empty() {
                continue;
            }

            let (Ok(items), Ok(time)) = (items.parse::<f64>(), time.parse::<f64>()) else {
                tracing::warn!(
                    "unparsable contributor cells for {} in {}",
                    email,
                    path.display()
                );
                continue;
            };

            match rollups.iter_mut().find(|r| r.email == email) {
                Some(rollup) => {
                    rollup.labels += items;
                    rollup.time_minutes += time;
                }
                None => rollups.push(RollupAcc {
                    email: email.to_string(),
                    labels: items,
                    time_minutes: time,
                }),
            }
        }
    }

    let project_name = project_name.unwrap_or_else(|| fallback_project_name(path));

    let contributors = rollups
        .into_iter()
        .map(|acc| ContributorRollup {
            email: acc.email,
            labels: acc.labels.round() as u64,
            percentage: if total_items > 0 {
                acc.labels / total_items as f64 * 100.0
            } else {
                0.0
            },
            time_minutes: acc.time_minutes,
        })
        .collect();

    Ok(TableScan {
        project_name,
        progress: ProjectProgress {
            total_items,
            fully_labeled,
        },
        contributors,
    })
}

fn fallback_project_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.trim_end_matches("_export").to_string())
        .unwrap_or_default()
}

fn sort_entries(entries: &mut [TrackingReportEntry]) {
    entries.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| grade_order(a.grade_level, b.grade_level))
            .then_with(|| a.project_name.cmp(&b.project_name))
    });
}

// Unknown grade levels sort after all known values within a category.
fn grade_order(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
