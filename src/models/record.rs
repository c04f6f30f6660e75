use serde::Deserialize;
use serde_json::Value;

// One exported item as it appears on a line of the intermediate NDJSON file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportRecord {
    #[serde(default)]
    pub data_row: Option<DataRow>,
    #[serde(default)]
    pub metadata_fields: Vec<MetadataField>,
    #[serde(default)]
    pub projects: serde_json::Map<String, Value>,
    #[serde(default)]
    pub embeddings: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataRow {
    #[serde(default)]
    pub row_data: String,
    #[serde(default)]
    pub global_key: String,
    #[serde(default)]
    pub details: DataRowDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataRowDetails {
    #[serde(default)]
    pub dataset_id: String,
    #[serde(default)]
    pub dataset_name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub last_activity_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataField {
    #[serde(default)]
    pub schema_id: String,
    #[serde(default)]
    pub schema_name: String,
    #[serde(default)]
    pub schema_kind: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectLabels {
    #[serde(default)]
    pub labels: Vec<LabelEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelEvent {
    #[serde(default)]
    pub label_details: LabelDetails,
    #[serde(default)]
    pub performance_details: PerformanceDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelDetails {
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PerformanceDetails {
    #[serde(default)]
    pub seconds_to_create: f64,
}
