//! The save/load file format: every task plus the week lookup, as JSON.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lookup::Lookups;
use crate::task::Task;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub finished_tasks: Vec<Task>,
    #[serde(default)]
    pub open_tasks: Vec<Task>,
    #[serde(default)]
    pub lookup: Lookups,
}

impl Snapshot {
    pub fn parse(text: &str) -> Result<Snapshot> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exported_shape() {
        let text = r#"{
            "finishedTasks": [
                { "id": 1, "content": "a", "start": "2021-05-22T10:00:00Z", "end": "2021-05-25T12:00:00Z" }
            ],
            "openTasks": [
                { "id": 1, "content": "b", "start": "2021-05-24T10:00:00Z" }
            ],
            "lookup": { "2021-5-17": [1], "2021-5-24": [1] }
        }"#;

        let snapshot = Snapshot::parse(text).unwrap();
        assert_eq!(snapshot.finished_tasks.len(), 1);
        assert_eq!(snapshot.open_tasks[0].end, None);
        assert_eq!(
            snapshot.lookup.keys().map(|k| k.to_string()).collect::<Vec<_>>(),
            vec!["2021-5-17", "2021-5-24"]
        );
    }

    #[test]
    fn missing_sections_default_to_empty() {
        assert_eq!(Snapshot::parse("{}").unwrap(), Snapshot::default());
    }

    #[test]
    fn rejects_bad_week_keys() {
        assert!(Snapshot::parse(r#"{ "lookup": { "next week": [1] } }"#).is_err());
    }
}
