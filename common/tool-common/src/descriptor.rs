//! Capability descriptors
//!
//! A [`CapabilityDescriptor`] is the self-description shared by tools and
//! agents: a stable name, a human-readable description and a JSON parameter
//! schema. Validation against the schema is deliberately shallow and only
//! checks that every name listed under `required` is present.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::{json, Value};

/// Immutable (name, description, parameter-schema) triple
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityDescriptor {
    name: String,
    description: String,
    schema: Value,
}

impl CapabilityDescriptor {
    /// Create a descriptor from an explicit schema value
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }

    /// Create a descriptor whose schema is generated from a parameter type
    ///
    /// Non-optional fields without a serde default end up in the schema's
    /// `required` list.
    pub fn for_params<T: JsonSchema>(
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let schema = serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default();
        Self::new(name, description, schema)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Names listed in the schema's `required` array
    pub fn required(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Check that every required parameter is present
    ///
    /// Returns the error message for the first missing parameter, or `None`
    /// when the parameters are acceptable. A non-object parameter value is
    /// treated as empty.
    pub fn validate(&self, params: &Value) -> Option<String> {
        let present = params.as_object();
        self.required()
            .into_iter()
            .find(|name| !present.is_some_and(|map| map.contains_key(*name)))
            .map(|name| format!("Missing required parameter: {}", name))
    }

    /// Discovery representation: `{name, description, schema}`
    pub fn to_definition(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "schema": self.schema,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(rename_all = "PascalCase")]
    #[allow(dead_code)]
    struct SampleParams {
        /// Target path
        target_file: String,
        /// Whether to create an empty file
        empty_file: bool,
        #[serde(default)]
        note: Option<String>,
    }

    #[test]
    fn test_required_from_params_type() {
        let descriptor = CapabilityDescriptor::for_params::<SampleParams>("sample", "Sample tool");
        let required = descriptor.required();

        assert!(required.contains(&"TargetFile"));
        assert!(required.contains(&"EmptyFile"));
        assert!(!required.contains(&"Note"));
    }

    #[test]
    fn test_validate_reports_first_missing() {
        let descriptor = CapabilityDescriptor::new(
            "sample",
            "Sample tool",
            json!({"type": "object", "required": ["Url", "Name"]}),
        );

        assert_eq!(
            descriptor.validate(&json!({"Url": "http://localhost:3000"})),
            Some("Missing required parameter: Name".to_string())
        );
        assert_eq!(descriptor.validate(&json!({"Url": "x", "Name": "y"})), None);
    }

    #[test]
    fn test_validate_without_required_accepts_anything() {
        let descriptor = CapabilityDescriptor::new("free", "No requirements", json!({}));
        assert_eq!(descriptor.validate(&json!({})), None);
        assert_eq!(descriptor.validate(&Value::Null), None);
    }

    #[test]
    fn test_validate_non_object_params() {
        let descriptor =
            CapabilityDescriptor::new("sample", "", json!({"required": ["Url"]}));
        assert_eq!(
            descriptor.validate(&json!([1, 2])),
            Some("Missing required parameter: Url".to_string())
        );
    }

    #[test]
    fn test_definition_shape() {
        let descriptor = CapabilityDescriptor::new("echo", "Echo text", json!({"type": "object"}));
        let definition = descriptor.to_definition();

        assert_eq!(definition["name"], "echo");
        assert_eq!(definition["description"], "Echo text");
        assert_eq!(definition["schema"]["type"], "object");
    }
}
