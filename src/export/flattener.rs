use serde_json::Value;

use crate::models::record::{ExportRecord, ProjectLabels};
use crate::models::row::{ContributorSlot, FlatRow, CONTRIBUTOR_SLOTS};

// A record missing any block simply leaves the corresponding columns empty.
pub fn flatten(record: &ExportRecord) -> FlatRow {
    let mut row = FlatRow::default();

    if let Some(data_row) = &record.data_row {
        row.set("row_data", data_row.row_data.clone());
        row.set("global_key", data_row.global_key.clone());
        row.set("dataset_id", data_row.details.dataset_id.clone());
        row.set("dataset_name", data_row.details.dataset_name.clone());
        row.set("created_at", data_row.details.created_at.clone());
        row.set("updated_at", data_row.details.updated_at.clone());
        row.set("last_activity_at", data_row.details.last_activity_at.clone());
    }

    for field in &record.metadata_fields {
        let name = field.schema_name.replace(' ', "_");
        row.set(&format!("{}_schema_ID", name), field.schema_id.clone());
        row.set(&format!("{}_schema_kind", name), field.schema_kind.clone());
        row.set(&format!("{}_value", name), value_to_string(&field.value));
    }

    apply_contributor_slots(record, &mut row);

    if let Some(embeddings) = &record.embeddings {
        row.set("embeddings", value_to_string(embeddings));
    }

    row
}

struct RaterStats {
    email: String,
    items_labeled: u64,
    total_seconds: f64,
}

// Slots are assigned in first-seen order of label creators.
fn apply_contributor_slots(record: &ExportRecord, row: &mut FlatRow) {
    let mut stats: Vec<RaterStats> = Vec::new();

    for (project_id, block) in &record.projects {
        let block: ProjectLabels = match serde_json::from_value(block.clone()) {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!(
                    "ignoring unreadable label block for project {}: {}",
                    project_id,
                    e
                );
                continue;
            }
        };

        for label in &block.labels {
            let email = label
                .label_details
                .created_by
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            let seconds = label.performance_details.seconds_to_create;

            match stats.iter_mut().find(|s| s.email == email) {
                Some(existing) => {
                    existing.items_labeled += 1;
                    existing.total_seconds += seconds;
                }
                None => stats.push(RaterStats {
                    email,
                    items_labeled: 1,
                    total_seconds: seconds,
                }),
            }
        }
    }

    let overflow = stats.len().saturating_sub(CONTRIBUTOR_SLOTS);
    if overflow > 0 {
        tracing::warn!(
            "record {}: {} contributors beyond the {} slots were dropped",
            row.get("global_key").unwrap_or(""),
            overflow,
            CONTRIBUTOR_SLOTS
        );
    }

    for rater in stats {
        let slot = ContributorSlot {
            email: rater.email,
            items_labeled: rater.items_labeled,
            time_minutes: (rater.total_seconds / 60.0 * 100.0).round() / 100.0,
        };
        if !row.push_contributor(slot) {
            break;
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
