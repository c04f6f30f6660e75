use std::collections::HashMap;

// Records with more distinct contributors drop the overflow.
pub const CONTRIBUTOR_SLOTS: usize = 10;

const BASE_HEADERS: [&str; 26] = [
    "dataset_name",
    "row_data",
    "created_at",
    "dataset_id",
    "Sentence_Count_schema_ID",
    "Sentence_Count_schema_kind",
    "Sentence_Count_value",
    "Word_Count_schema_ID",
    "Word_Count_value",
    "Word_Count_schema_kind",
    "Dale_Chall_Grade_schema_kind",
    "Dale_Chall_Grade_schema_ID",
    "Dale_Chall_Grade_value",
    "Flesch_Kincaid_Grade_schema_ID",
    "Flesch_Kincaid_Grade_schema_kind",
    "Flesch_Kincaid_Grade_value",
    "Spache_Grade_value",
    "Spache_Grade_schema_kind",
    "Spache_Grade_schema_ID",
    "Final_Score_schema_kind",
    "Final_Score_value",
    "Final_Score_schema_ID",
    "UUID_schema_ID",
    "UUID_value",
    "UUID_schema_kind",
    "embeddings",
];

pub fn headers() -> Vec<String> {
    let mut headers: Vec<String> = BASE_HEADERS.iter().map(|h| h.to_string()).collect();
    for i in 1..=CONTRIBUTOR_SLOTS {
        headers.push(format!("labeller_{}_email", i));
        headers.push(format!("labeller_{}_items_labeled", i));
        headers.push(format!("labeller_{}_time_minutes", i));
    }
    headers
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContributorSlot {
    pub email: String,
    pub items_labeled: u64,
    pub time_minutes: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FlatRow {
    values: HashMap<String, String>,
    contributors: Vec<ContributorSlot>,
}

impl FlatRow {
    pub fn set(&mut self, column: &str, value: String) {
        self.values.insert(column.to_string(), value);
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(|v| v.as_str())
    }

    pub fn contributors(&self) -> &[ContributorSlot] {
        &self.contributors
    }

    // Returns false when all slots are taken and the contributor was dropped.
    pub fn push_contributor(&mut self, slot: ContributorSlot) -> bool {
        if self.contributors.len() >= CONTRIBUTOR_SLOTS {
            return false;
        }
        self.contributors.push(slot);
        true
    }

    // Projects onto the fixed header order; values outside it are dropped.
    pub fn to_record(&self) -> Vec<String> {
        let mut record: Vec<String> = BASE_HEADERS
            .iter()
            .map(|h| self.values.get(*h).cloned().unwrap_or_default())
            .collect();

        for i in 0..CONTRIBUTOR_SLOTS {
            match self.contributors.get(i) {
                Some(slot) => {
                    record.push(slot.email.clone());
                    record.push(slot.items_labeled.to_string());
                    record.push(format!("{:.2}", slot.time_minutes));
                }
                None => {
                    record.push(String::new());
                    record.push(String::new());
                    record.push(String::new());
                }
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_cover_all_slots() {
        let headers = headers();
        assert_eq!(headers.len(), 26 + 3 * CONTRIBUTOR_SLOTS);
        assert_eq!(headers[0], "dataset_name");
        assert_eq!(headers[26], "labeller_1_email");
        assert_eq!(headers[headers.len() - 1], "labeller_10_time_minutes");
    }

    #[test]
    fn test_record_aligns_with_headers() {
        let mut row = FlatRow::default();
        row.set("dataset_name", "3rd Grade Reading".to_string());
        row.set("not_a_column", "dropped".to_string());
        row.push_contributor(ContributorSlot {
            email: "a@example.com".to_string(),
            items_labeled: 2,
            time_minutes: 1.0,
        });

        let headers = headers();
        let record = row.to_record();
        assert_eq!(record.len(), headers.len());
        assert_eq!(record[0], "3rd Grade Reading");
        assert!(!record.contains(&"dropped".to_string()));

        let email_idx = headers.iter().position(|h| h == "labeller_1_email").unwrap();
        assert_eq!(record[email_idx], "a@example.com");
        assert_eq!(record[email_idx + 1], "2");
        assert_eq!(record[email_idx + 2], "1.00");
    }

    #[test]
    fn test_slot_capacity_enforced() {
        let mut row = FlatRow::default();
        for i in 0..CONTRIBUTOR_SLOTS {
            assert!(row.push_contributor(ContributorSlot {
                email: format!("rater{}@example.com", i),
                items_labeled: 1,
                time_minutes: 0.5,
            }));
        }
        assert!(!row.push_contributor(ContributorSlot {
            email: "overflow@example.com".to_string(),
            items_labeled: 1,
            time_minutes: 0.5,
        }));
        assert_eq!(row.contributors().len(), CONTRIBUTOR_SLOTS);
    }
}
