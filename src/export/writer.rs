use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::export::flattener::flatten;
use crate::models::record::ExportRecord;
use crate::models::row::headers;

pub(crate) const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

pub struct TableWriter {
    base_dir: PathBuf,
}

impl TableWriter {
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn category_dir(&self, category: &str) -> Result<PathBuf> {
        let dir = self.base_dir.join(file_slug(category));
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub fn write_ndjson(&self, dir: &Path, project_name: &str, items: &[Value]) -> Result<PathBuf> {
        let path = dir.join(format!("{}_export.ndjson", file_slug(project_name)));
        let mut out = BufWriter::new(File::create(&path)?);

        for item in items {
            serde_json::to_writer(&mut out, item)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;

        Ok(path)
    }

    pub fn write_flat_table(
        &self,
        ndjson_path: &Path,
        dir: &Path,
        project_name: &str,
    ) -> Result<PathBuf> {
        let path = dir.join(format!("{}_export.csv", file_slug(project_name)));

        let mut file = File::create(&path)?;
        file.write_all(UTF8_BOM)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(headers())?;

        let reader = BufReader::new(File::open(ndjson_path)?);
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ExportRecord>(&line) {
                Ok(record) => writer.write_record(flatten(&record).to_record())?,
                Err(e) => {
                    tracing::error!(
                        "error decoding line {} of {}: {}",
                        idx + 1,
                        ndjson_path.display(),
                        e
                    );
                }
            }
        }

        writer.flush()?;
        Ok(path)
    }
}

pub fn file_slug(name: &str) -> String {
    name.replace(' ', "_")
}
