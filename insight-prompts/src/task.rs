//! Task selectors and their prompt templates.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value, json};

use crate::error::PromptResult;
use crate::template::PromptTemplate;

const FIELD_IDENTIFICATION: &str = r#"Analyze the following JSON event and identify key fields **only if they exist**.

**Identification Rules:**
- **Timestamp Fields:** Identify fields that contain date-time values.
- **De-duplication Key:** Identify a unique identifier.
- **PII Fields:** Identify PII fields like email, phone, or name.

**Strict Constraints:** Omit fields if not applicable.

**Return JSON Format:**
{
    "timestamp_fields": ["field1", "field2"],
    "de_duplication_key": "field_name",
    "pii_fields": ["field1", "field2"]
}

**Event Data:**
{{event}}
"#;

const DATASET_NAMING: &str = r#"You are an expert in data modeling and domain analysis. Based on the given event schema, analyze the data to identify its domain (e.g., user activity, IoT telemetry, financial transactions, product catalog, etc.). Generate 5 unique and user-friendly dataset names that reflect the data's purpose and domain.

**Rules:**
- Do not concatenate all field names into long names. Instead, focus on understanding the schema and the broader context.
- Suggest names that are concise, descriptive, and easy to remember.
- Ensure the names are relevant to common data categories such as logs, events, metrics, profiles, transactions, etc.
- Analyze the structure and key properties to understand what the dataset might represent (e.g., user interactions, system metrics, content usage).
- Identify key patterns, themes, and relationships in the data **without relying on specific field names**, as the event structure may vary.
- Focus on clarity, simplicity, and real-world relevance based on the data's potential purpose.
- Aim for thoughtful, human-like naming that reflects what the data is used for.

**Return JSON in this format:**
{
    "dataset_names": ["name1", "name2", "name3", "name4", "name5"]
}

**Event Schema:**
{{event}}
"#;

const ROLLUP_SUGGESTION: &str = r#"Analyze the following JSON event schema and suggest appropriate rollups for Druid.
Also, generate a valid Druid ingestion spec template.

**Your tasks:**
1. Suggest rollups for common aggregations (e.g., hourly, daily).
2. Identify numeric fields for metrics aggregation.
3. Identify non-numeric fields as dimensions.
4. Detect timestamp fields and use them in the `timestampSpec`.

**Event Schema:**
{{event}}

**Expected JSON Response:**
{
    "rollup_suggestions": ["hourly_rollup", "daily_rollup", "custom_rollup"],
    "druid_ingestion_spec": {
        "type": "index",
        "spec": {
            "dataSchema": {
                "dataSource": "dynamic_data_source",
                "timestampSpec": {
                    "column": "timestamp_field",
                    "format": "auto"
                },
                "dimensionsSpec": {
                    "dimensions": ["dim1", "dim2"]
                },
                "metricsSpec": [
                    {"type": "doubleSum", "name": "metric1", "fieldName": "metric1"}
                ],
                "granularitySpec": {
                    "type": "uniform",
                    "segmentGranularity": "hour",
                    "queryGranularity": "none"
                }
            },
            "ioConfig": {
                "type": "index",
                "inputSource": {
                    "type": "inline",
                    "data": [{{event_compact}}]
                },
                "inputFormat": {
                    "type": "json"
                }
            },
            "tuningConfig": {
                "type": "index",
                "maxRowsInMemory": 100000,
                "maxRowsPerSegment": 5000000
            }
        }
    }
}
"#;

/// Dataset name returned when the model offers nothing usable.
pub const DEFAULT_DATASET_NAME: &str = "Default_Dataset";

/// Analysis performed on a caller-supplied event or schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Timestamp fields, de-duplication key and PII fields.
    FieldIdentification,
    /// Five candidate dataset names.
    DatasetNaming,
    /// Rollup windows plus a Druid ingestion spec.
    RollupSuggestion,
}

impl TaskKind {
    /// Every task, in route registration order.
    pub const ALL: [Self; 3] = [
        Self::FieldIdentification,
        Self::DatasetNaming,
        Self::RollupSuggestion,
    ];

    /// Returns the HTTP route serving this task.
    #[must_use]
    pub const fn route(self) -> &'static str {
        match self {
            Self::FieldIdentification => "/api/analyze-event/",
            Self::DatasetNaming => "/api/suggest-dataset-name/",
            Self::RollupSuggestion => "/api/suggest-druid-rollups/",
        }
    }

    /// Returns a stable label for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FieldIdentification => "field_identification",
            Self::DatasetNaming => "dataset_naming",
            Self::RollupSuggestion => "rollup_suggestion",
        }
    }

    /// Whether the payload must be a JSON object for this task.
    #[must_use]
    pub const fn requires_object(self) -> bool {
        matches!(self, Self::FieldIdentification)
    }

    /// Body substituted when extraction yields an empty object.
    #[must_use]
    pub fn fallback(self) -> Option<Map<String, Value>> {
        match self {
            Self::DatasetNaming => {
                let mut body = Map::new();
                body.insert("dataset_names".to_owned(), json!([DEFAULT_DATASET_NAME]));
                Some(body)
            }
            Self::FieldIdentification | Self::RollupSuggestion => None,
        }
    }

    /// Returns the prompt template for this task.
    #[must_use]
    pub fn template(self) -> PromptTemplate {
        let text = match self {
            Self::FieldIdentification => FIELD_IDENTIFICATION,
            Self::DatasetNaming => DATASET_NAMING,
            Self::RollupSuggestion => ROLLUP_SUGGESTION,
        };
        PromptTemplate::new(text)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Renders the prompt for `task` with `payload` embedded.
///
/// The payload is embedded pretty-printed with two-space indentation; the
/// rollup template additionally inlines a compact copy as sample input data.
/// Output depends only on the arguments.
///
/// # Errors
///
/// Returns [`PromptError::Serialization`](crate::PromptError::Serialization)
/// when the payload cannot be serialized.
pub fn build_prompt(task: TaskKind, payload: &Value) -> PromptResult<String> {
    let vars = HashMap::from([
        ("event", serde_json::to_string_pretty(payload)?),
        ("event_compact", serde_json::to_string(payload)?),
    ]);

    Ok(task.template().render_with(&vars)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Value {
        json!({
            "event_id": "evt-1",
            "email": "a@example.com",
            "ts": "2024-05-01T10:00:00Z",
            "amount": 12.5
        })
    }

    #[test]
    fn prompts_are_deterministic() {
        let payload = sample_event();
        for task in TaskKind::ALL {
            let first = build_prompt(task, &payload).unwrap();
            let second = build_prompt(task, &payload.clone()).unwrap();
            assert_eq!(first, second, "{task} prompt changed between calls");
        }
    }

    #[test]
    fn field_identification_embeds_pretty_event() {
        let prompt = build_prompt(TaskKind::FieldIdentification, &sample_event()).unwrap();

        assert!(prompt.contains("Omit fields if not applicable"));
        assert!(prompt.contains("\"de_duplication_key\": \"field_name\""));
        assert!(prompt.contains("{\n  \"event_id\": \"evt-1\",\n  \"email\""));
    }

    #[test]
    fn payload_key_order_is_preserved() {
        let payload: Value = serde_json::from_str(r#"{"zeta": 1, "alpha": 2}"#).unwrap();
        let prompt = build_prompt(TaskKind::DatasetNaming, &payload).unwrap();

        let zeta = prompt.find("\"zeta\"").unwrap();
        let alpha = prompt.find("\"alpha\"").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn empty_object_renders_empty_schema() {
        let prompt = build_prompt(TaskKind::FieldIdentification, &json!({})).unwrap();
        assert!(prompt.ends_with("**Event Data:**\n{}\n"));
    }

    #[test]
    fn dataset_naming_asks_for_five_names() {
        let prompt = build_prompt(TaskKind::DatasetNaming, &json!(["any", "value"])).unwrap();
        assert!(prompt.contains("Generate 5 unique"));
        assert!(prompt.contains("\"dataset_names\": [\"name1\", \"name2\", \"name3\", \"name4\", \"name5\"]"));
        assert!(prompt.contains("[\n  \"any\",\n  \"value\"\n]"));
    }

    #[test]
    fn rollup_prompt_inlines_compact_sample() {
        let prompt = build_prompt(TaskKind::RollupSuggestion, &json!({"a": {"b": 1}})).unwrap();

        assert!(prompt.contains("\"data\": [{\"a\":{\"b\":1}}]"));
        for key in [
            "dataSource",
            "timestampSpec",
            "dimensionsSpec",
            "metricsSpec",
            "granularitySpec",
            "ioConfig",
            "tuningConfig",
        ] {
            assert!(prompt.contains(key), "missing {key}");
        }
    }

    #[test]
    fn wide_integers_are_embedded_verbatim() {
        let payload: Value =
            serde_json::from_str(r#"{"order_id": 98765432109876543210, "ratio": 1e400}"#).unwrap();

        let prompt = build_prompt(TaskKind::FieldIdentification, &payload).unwrap();
        assert!(prompt.contains("\"order_id\": 98765432109876543210,"));
        assert!(prompt.contains("\"ratio\": 1e400"));

        let prompt = build_prompt(TaskKind::RollupSuggestion, &payload).unwrap();
        assert!(prompt.contains(r#""data": [{"order_id":98765432109876543210,"ratio":1e400}]"#));
    }

    #[test]
    fn payload_braces_do_not_act_as_placeholders() {
        let payload = json!({"note": "{{event_compact}}"});
        let prompt = build_prompt(TaskKind::FieldIdentification, &payload).unwrap();
        assert!(prompt.contains("\"note\": \"{{event_compact}}\""));
    }

    #[test]
    fn only_dataset_naming_has_fallback() {
        assert_eq!(
            Value::Object(TaskKind::DatasetNaming.fallback().unwrap()),
            json!({"dataset_names": ["Default_Dataset"]})
        );
        assert!(TaskKind::FieldIdentification.fallback().is_none());
        assert!(TaskKind::RollupSuggestion.fallback().is_none());
    }

    #[test]
    fn only_field_identification_requires_object() {
        assert!(TaskKind::FieldIdentification.requires_object());
        assert!(!TaskKind::DatasetNaming.requires_object());
        assert!(!TaskKind::RollupSuggestion.requires_object());
    }
}
