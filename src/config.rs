use serde::Serialize;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("LABELTRACK_API_KEY").map_err(|_| {
            Error::Config("LABELTRACK_API_KEY environment variable not set".to_string())
        })?;

        let base_url = env::var("LABELTRACK_API_URL")
            .unwrap_or_else(|_| "https://api.labelhub.io/v2".to_string());

        let poll_interval = env::var("LABELTRACK_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(3));

        Ok(Self {
            api_key,
            base_url,
            poll_interval,
        })
    }
}

// Detail blocks requested from the export service.
#[derive(Debug, Clone, Serialize)]
pub struct ExportParams {
    pub data_row_details: bool,
    pub metadata_fields: bool,
    pub attachments: bool,
    pub project_details: bool,
    pub performance_details: bool,
    pub label_details: bool,
    pub interpolated_frames: bool,
    pub embeddings: bool,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self {
            data_row_details: true,
            metadata_fields: true,
            attachments: true,
            project_details: true,
            performance_details: true,
            label_details: true,
            interpolated_frames: false,
            embeddings: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectGroup {
    pub category: String,
    pub project_ids: Vec<String>,
}

// Category -> project-ids mapping. Iteration order follows the file.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    pub groups: Vec<ProjectGroup>,
}

impl CategoryMap {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let map: serde_json::Map<String, Value> = serde_json::from_str(text)?;
        let mut groups = Vec::with_capacity(map.len());

        for (category, ids) in map {
            let ids = ids.as_array().ok_or_else(|| {
                Error::Config(format!("category {} must map to a list of project ids", category))
            })?;

            let mut project_ids = Vec::with_capacity(ids.len());
            for id in ids {
                match id.as_str() {
                    Some(id) => project_ids.push(id.to_string()),
                    None => {
                        return Err(Error::Config(format!(
                            "category {} contains a non-string project id",
                            category
                        )))
                    }
                }
            }

            groups.push(ProjectGroup {
                category,
                project_ids,
            });
        }

        Ok(Self { groups })
    }

    pub fn project_count(&self) -> usize {
        self.groups.iter().map(|g| g.project_ids.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_map_preserves_file_order() {
        let json = r#"{
            "Key_to_Evidence": ["p1", "p2"],
            "Core_Reader": ["p3"],
            "Following_Directions": []
        }"#;

        let map = CategoryMap::from_json(json).unwrap();
        let names: Vec<_> = map.groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(names, vec!["Key_to_Evidence", "Core_Reader", "Following_Directions"]);
        assert_eq!(map.project_count(), 3);
    }

    #[test]
    fn test_category_map_rejects_non_list() {
        let json = r#"{"Core_Reader": "p1"}"#;
        assert!(CategoryMap::from_json(json).is_err());
    }
}
