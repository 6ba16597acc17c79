use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use super::document::DocumentId;

/// Store key of the session snapshot
pub const SESSION_KEY: &str = "session";

/// Current version of the snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Largest id a snapshot may carry (the largest integer JSON readers agree on)
pub const MAX_SNAPSHOT_ID: u64 = (1 << 53) - 1;

#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("Malformed session snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Session snapshot id {0} is out of range")]
    IdOutOfRange(u64),
}

/// One persisted tab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TabEntry {
    pub id: Option<DocumentId>,
    pub source_path: Option<PathBuf>,
    pub title: Option<String>,
}

/// Durable session state, saved as `session.json`.
///
/// Rendered content is never persisted; it is re-derived by reloading each
/// `source_path` on restore. Every field is optional so snapshots written by
/// other versions still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSnapshot {
    pub version: u32,
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "deserialize_tabs")]
    pub tabs: Vec<TabEntry>,
    pub active_id: Option<DocumentId>,
    pub next_id: u64,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: None,
            tabs: Vec::new(),
            active_id: None,
            next_id: 0,
        }
    }
}

impl SessionSnapshot {
    pub fn parse(content: &str) -> Result<Self, RestoreError> {
        let snapshot: Self = serde_json::from_str(content)?;
        let ids = snapshot.tabs.iter().filter_map(|tab| tab.id).map(DocumentId::get);
        match ids.chain([snapshot.next_id]).find(|id| *id > MAX_SNAPSHOT_ID) {
            Some(id) => Err(RestoreError::IdOutOfRange(id)),
            None => Ok(snapshot),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Skip tab entries that do not parse instead of rejecting the whole snapshot
fn deserialize_tabs<'de, D>(deserializer: D) -> Result<Vec<TabEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(%e, "Skipping malformed tab entry in session snapshot");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_snapshot_serialization_roundtrip() {
        let snapshot = SessionSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: None,
            tabs: vec![
                TabEntry {
                    id: Some(DocumentId(2)),
                    source_path: Some(PathBuf::from("/docs/a.md")),
                    title: Some("a.md".to_string()),
                },
                TabEntry {
                    id: Some(DocumentId(5)),
                    source_path: None,
                    title: Some("New Tab".to_string()),
                },
            ],
            active_id: Some(DocumentId(5)),
            next_id: 6,
        };

        let json = snapshot.to_json().unwrap();
        let parsed = SessionSnapshot::parse(&json).unwrap();

        assert_eq!(parsed, snapshot);
        assert!(json.contains("\"activeId\": 5"));
        assert!(json.contains("\"sourcePath\": \"/docs/a.md\""));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let parsed = SessionSnapshot::parse(r#"{ "tabs": [ { "sourcePath": "/x.md" } ] }"#).unwrap();

        assert_eq!(parsed.version, SNAPSHOT_VERSION);
        assert_eq!(parsed.next_id, 0);
        assert_eq!(parsed.active_id, None);
        assert_eq!(
            parsed.tabs,
            vec![TabEntry {
                id: None,
                source_path: Some(PathBuf::from("/x.md")),
                title: None,
            }]
        );
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let parsed = SessionSnapshot::parse(r#"{ "nextId": 3, "windowSize": [1, 2] }"#).unwrap();
        assert_eq!(parsed.next_id, 3);
    }

    #[test]
    fn test_malformed_tab_entry_is_skipped() {
        let content = indoc! {r#"
            {
              "tabs": [
                { "id": 1, "sourcePath": "/a.md" },
                { "id": "not-a-number" },
                { "id": 3 }
              ],
              "activeId": 3,
              "nextId": 4
            }
        "#};

        let parsed = SessionSnapshot::parse(content).unwrap();

        let ids: Vec<_> = parsed.tabs.iter().map(|tab| tab.id).collect();
        assert_eq!(ids, vec![Some(DocumentId(1)), Some(DocumentId(3))]);
    }

    #[test]
    fn test_malformed_snapshot_is_an_error() {
        assert!(matches!(
            SessionSnapshot::parse("{ not json"),
            Err(RestoreError::Malformed(_))
        ));
        assert!(SessionSnapshot::parse(r#"{ "tabs": 5 }"#).is_err());
    }

    #[test]
    fn test_out_of_range_ids_are_an_error() {
        assert!(matches!(
            SessionSnapshot::parse(r#"{ "tabs": [ { "id": 18446744073709551615 } ], "nextId": 1 }"#),
            Err(RestoreError::IdOutOfRange(u64::MAX))
        ));
        assert!(matches!(
            SessionSnapshot::parse(r#"{ "nextId": 18446744073709551615 }"#),
            Err(RestoreError::IdOutOfRange(u64::MAX))
        ));

        let at_limit = format!(r#"{{ "tabs": [ {{ "id": {MAX_SNAPSHOT_ID} }} ] }}"#);
        assert!(SessionSnapshot::parse(&at_limit).is_ok());
    }
}
