//! Seed data resolution and config/data partitioning.

use crate::error::SynthesisError;
use serde_json::{Map, Value};

/// Configuration defaults plus remaining interaction data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedPartition {
    pub config: Map<String, Value>,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigField {
    pub key: String,
    pub default: Option<Value>,
}

/// Keys the configuration schema declares, with their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSchema {
    fields: Vec<ConfigField>,
}

impl ConfigSchema {
    /// Parse schema text. Blank text is an empty schema.
    pub fn parse(text: Option<&str>) -> Result<Self, SynthesisError> {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return Ok(Self::default());
        };
        let value: Value =
            serde_json::from_str(text).map_err(|e| SynthesisError::ConfigSchema(e.to_string()))?;
        Ok(Self::from_value(&value))
    }

    /// Accepts `{"properties": {k: {"default": v}}}`, `{"fields": [{"key": k,
    /// "default": v}]}` or a bare list of such fields. Anything else declares
    /// no keys.
    pub fn from_value(value: &Value) -> Self {
        let fields = if let Some(props) = value.get("properties").and_then(Value::as_object) {
            props
                .iter()
                .map(|(key, spec)| ConfigField {
                    key: key.clone(),
                    default: spec.get("default").cloned(),
                })
                .collect()
        } else if let Some(list) = value.get("fields").and_then(Value::as_array) {
            fields_from_list(list)
        } else if let Some(list) = value.as_array() {
            fields_from_list(list)
        } else {
            Vec::new()
        };
        Self { fields }
    }

    pub fn fields(&self) -> &[ConfigField] {
        &self.fields
    }

    pub fn declares(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn fields_from_list(list: &[Value]) -> Vec<ConfigField> {
    list.iter()
        .filter_map(|field| {
            let key = field
                .get("key")
                .or_else(|| field.get("name"))
                .and_then(Value::as_str)?;
            Some(ConfigField {
                key: key.to_string(),
                default: field.get("default").cloned(),
            })
        })
        .collect()
}

/// Pick the seed payload. Live content always supersedes sample text; blank
/// sample text is an empty object.
pub fn resolve_seed(sample: Option<&str>, live: Option<&Value>) -> Result<Value, SynthesisError> {
    if let Some(live) = live {
        return Ok(live.clone());
    }
    match sample.filter(|s| !s.trim().is_empty()) {
        Some(text) => {
            serde_json::from_str(text).map_err(|e| SynthesisError::SeedData(e.to_string()))
        }
        None => Ok(Value::Object(Map::new())),
    }
}

/// Split seed data by the schema's declared keys.
///
/// Non-object seeds carry no config keys: arrays land under `items`, other
/// scalars under `value`, `null` yields empty data.
pub fn partition_seed(seed: &Value, schema: &ConfigSchema) -> SeedPartition {
    let mut config = Map::new();
    for field in schema.fields() {
        if let Some(default) = &field.default {
            config.insert(field.key.clone(), default.clone());
        }
    }

    let mut data = Map::new();
    match seed {
        Value::Object(map) => {
            for (key, value) in map {
                if schema.declares(key) {
                    config.insert(key.clone(), value.clone());
                } else {
                    data.insert(key.clone(), value.clone());
                }
            }
        }
        Value::Null => {}
        Value::Array(_) => {
            data.insert("items".to_string(), seed.clone());
        }
        other => {
            data.insert("value".to_string(), other.clone());
        }
    }
    SeedPartition { config, data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_live_supersedes_sample() {
        let live = json!({"source": "live"});
        let seed = resolve_seed(Some(r#"{"source":"sample"}"#), Some(&live)).unwrap();
        assert_eq!(seed, live);
        let sample = resolve_seed(Some(r#"{"source":"sample"}"#), None).unwrap();
        assert_eq!(sample["source"], "sample");
        assert_eq!(resolve_seed(Some("  "), None).unwrap(), json!({}));
    }

    #[test]
    fn test_invalid_sample_is_seed_error() {
        let err = resolve_seed(Some("{fragments:"), None).unwrap_err();
        assert!(matches!(err, SynthesisError::SeedData(_)));
    }

    #[test]
    fn test_json_schema_form() {
        let schema = ConfigSchema::parse(Some(
            r#"{"properties": {"timeLimit": {"default": 60}, "shuffle": {"type": "boolean"}}}"#,
        ))
        .unwrap();
        let seed = json!({"shuffle": true, "questions": [1, 2]});
        let part = partition_seed(&seed, &schema);
        assert_eq!(part.config, json!({"timeLimit": 60, "shuffle": true}).as_object().unwrap().clone());
        assert_eq!(part.data, json!({"questions": [1, 2]}).as_object().unwrap().clone());
    }

    #[test]
    fn test_field_list_forms() {
        let wrapped = ConfigSchema::parse(Some(r#"{"fields": [{"key": "theme", "default": "dark"}]}"#))
            .unwrap();
        let bare = ConfigSchema::parse(Some(r#"[{"key": "theme", "default": "dark"}]"#)).unwrap();
        assert_eq!(wrapped, bare);

        let part = partition_seed(&json!({"theme": "light", "title": "T"}), &bare);
        assert_eq!(part.config["theme"], "light");
        assert_eq!(part.data["title"], "T");
    }

    #[test]
    fn test_seed_overrides_default_without_schema_default() {
        let schema = ConfigSchema::parse(Some(r#"[{"key": "lives"}]"#)).unwrap();
        assert!(partition_seed(&json!({}), &schema).config.is_empty());
        assert_eq!(partition_seed(&json!({"lives": 3}), &schema).config["lives"], 3);
    }

    #[test]
    fn test_non_object_seed_wrapped_as_data() {
        let schema = ConfigSchema::default();
        assert_eq!(partition_seed(&json!([1, 2]), &schema).data["items"], json!([1, 2]));
        assert_eq!(partition_seed(&json!("x"), &schema).data["value"], "x");
        assert!(partition_seed(&Value::Null, &schema).data.is_empty());
    }

    #[test]
    fn test_invalid_schema_is_error() {
        assert!(matches!(
            ConfigSchema::parse(Some("{not json")),
            Err(SynthesisError::ConfigSchema(_))
        ));
        assert!(ConfigSchema::parse(None).unwrap().is_empty());
    }
}
