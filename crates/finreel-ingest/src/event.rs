//! Storage object events.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use finreel_models::JobId;

/// A finalized storage object, as delivered by the event infrastructure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObjectEvent {
    #[serde(default)]
    pub bucket: String,

    /// Object name within the bucket
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub content_type: Option<String>,

    /// Object generation; sent as a string, tolerated as a number
    #[serde(default, deserialize_with = "string_or_number")]
    pub generation: Option<String>,

    /// Custom metadata attached at upload
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl StorageObjectEvent {
    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or("")
    }

    pub fn metadata(&self) -> HashMap<String, String> {
        self.metadata.clone().unwrap_or_default()
    }

    /// Deterministic id of the job this upload produces.
    pub fn job_id(&self) -> JobId {
        JobId::for_object(&self.bucket, &self.name, self.generation.as_deref())
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_storage_object() {
        let event: StorageObjectEvent = serde_json::from_value(json!({
            "bucket": "uploads",
            "name": "statements/acme/original.pdf",
            "contentType": "application/pdf",
            "generation": "1712000000000000",
            "size": "1024",
            "metadata": {"clientName": "Acme"}
        }))
        .unwrap();

        assert_eq!(event.bucket, "uploads");
        assert_eq!(event.content_type(), "application/pdf");
        assert_eq!(event.generation.as_deref(), Some("1712000000000000"));
        assert_eq!(event.metadata().get("clientName").map(String::as_str), Some("Acme"));
    }

    #[test]
    fn test_numeric_generation() {
        let event: StorageObjectEvent =
            serde_json::from_value(json!({"bucket": "b", "name": "n", "generation": 42})).unwrap();
        assert_eq!(event.generation.as_deref(), Some("42"));
    }

    #[test]
    fn test_job_id_tracks_generation() {
        let mut event = StorageObjectEvent {
            bucket: "uploads".to_string(),
            name: "statements/acme/original.pdf".to_string(),
            generation: Some("1".to_string()),
            ..Default::default()
        };
        let first = event.job_id();
        assert_eq!(first, event.job_id());

        event.generation = Some("2".to_string());
        assert_ne!(first, event.job_id());
    }

    #[test]
    fn test_missing_fields_default() {
        let event: StorageObjectEvent = serde_json::from_value(json!({})).unwrap();
        assert!(event.name.is_empty());
        assert_eq!(event.content_type(), "");
        assert!(event.metadata().is_empty());
    }
}
