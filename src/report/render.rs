use chrono::NaiveDate;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::export::writer::UTF8_BOM;
use crate::models::report::ReportModel;

pub const REPORT_COLUMNS: [&str; 7] = [
    "Category",
    "Project Name",
    "Progress",
    "Labeller Email",
    "Labels",
    "Labels Percentage",
    "Time Spent (minutes)",
];

// One progress-only summary row per project, then one contributor-only row
// per rollup, sharing a single column set.
pub fn render_table<W: io::Write>(model: &ReportModel, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(REPORT_COLUMNS)?;

    for entry in &model.entries {
        let progress = entry.progress.summary();
        writer.write_record([
            entry.category.as_str(),
            entry.project_name.as_str(),
            progress.as_str(),
            "",
            "",
            "",
            "",
        ])?;

        for rollup in &entry.contributors {
            let labels = format!("{}/{}", rollup.labels, entry.progress.total_items);
            let percentage = format!("{:.2}%", rollup.percentage);
            let time = format!("{:.2}", rollup.time_minutes);
            writer.write_record([
                entry.category.as_str(),
                entry.project_name.as_str(),
                "",
                rollup.email.as_str(),
                labels.as_str(),
                percentage.as_str(),
                time.as_str(),
            ])?;
        }
    }

    writer.flush()?;
    Ok(())
}

pub fn render_narrative(model: &ReportModel) -> String {
    let mut out = String::new();

    for entry in &model.entries {
        out.push_str(&format!("Category: {}\n", entry.category));
        out.push_str(&format!("Project Name: {}\n", entry.project_name));
        out.push_str(&format!("Progress: {}\n", entry.progress.summary()));

        for rollup in &entry.contributors {
            out.push_str(&format!("  Labeler: {}\n", rollup.email));
            out.push_str(&format!(
                "    Labels: {}/{}\n",
                rollup.labels, entry.progress.total_items
            ));
            out.push_str(&format!("    Labels Percentage: {:.2}%\n", rollup.percentage));
            out.push_str(&format!("    Time Spent: {:.2} minutes\n", rollup.time_minutes));
        }

        out.push('\n');
    }

    out
}

pub fn report_paths(reports_dir: &Path, date: NaiveDate) -> (PathBuf, PathBuf) {
    let stamp = date.format("%Y-%m-%d").to_string();
    (
        reports_dir.join(format!("tracking_report_{}.csv", stamp)),
        reports_dir.join(format!("tracking_report_{}.txt", stamp)),
    )
}

pub fn write_reports(
    model: &ReportModel,
    reports_dir: &Path,
    date: NaiveDate,
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(reports_dir)?;
    let (csv_path, txt_path) = report_paths(reports_dir, date);

    let mut file = File::create(&csv_path)?;
    file.write_all(UTF8_BOM)?;
    render_table(model, file)?;

    fs::write(&txt_path, render_narrative(model))?;

    Ok((csv_path, txt_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::{ContributorRollup, ProjectProgress, TrackingReportEntry};

    fn sample_model() -> ReportModel {
        ReportModel {
            entries: vec![TrackingReportEntry {
                category: "Readers".to_string(),
                project_name: "4th Grade Reading".to_string(),
                grade_level: Some(4),
                progress: ProjectProgress {
                    total_items: 5,
                    fully_labeled: 3,
                },
                contributors: vec![ContributorRollup {
                    email: "a@x.com".to_string(),
                    labels: 4,
                    percentage: 80.0,
                    time_minutes: 8.0,
                }],
            }],
        }
    }

    #[test]
    fn test_table_rows_split_progress_and_contributor_fields() {
        let mut out = Vec::new();
        render_table(&sample_model(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Category,Project Name,Progress,Labeller Email,Labels,Labels Percentage,Time Spent (minutes)"
        );
        assert_eq!(
            lines[1],
            "Readers,4th Grade Reading,3/5 items fully labeled,,,,"
        );
        assert_eq!(
            lines[2],
            "Readers,4th Grade Reading,,a@x.com,4/5,80.00%,8.00"
        );
    }

    #[test]
    fn test_narrative_block_layout() {
        let text = render_narrative(&sample_model());
        let expected = concat!(
            "Category: Readers\n",
            "Project Name: 4th Grade Reading\n",
            "Progress: 3/5 items fully labeled\n",
            "  Labeler: a@x.com\n",
            "    Labels: 4/5\n",
            "    Labels Percentage: 80.00%\n",
            "    Time Spent: 8.00 minutes\n",
            "\n",
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_report_paths_carry_date_stamp() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 8).unwrap();
        let (csv_path, txt_path) = report_paths(Path::new("tracking_data"), date);
        assert!(csv_path.ends_with("tracking_report_2026-08-08.csv"));
        assert!(txt_path.ends_with("tracking_report_2026-08-08.txt"));
    }

    #[test]
    fn test_written_table_carries_bom() {
        let tmp = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 8).unwrap();
        let (csv_path, txt_path) = write_reports(&sample_model(), tmp.path(), date).unwrap();

        let raw = fs::read(&csv_path).unwrap();
        assert!(raw.starts_with(UTF8_BOM));
        assert!(fs::read_to_string(&txt_path)
            .unwrap()
            .starts_with("Category: Readers"));
    }
}
