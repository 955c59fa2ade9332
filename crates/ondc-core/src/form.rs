// ONDC Core - Input form model
//
// A step that cannot be auto-derived carries a form configuration: an ordered
// list of field descriptors rendered by the external form layer. The engine
// passes the configuration through untouched. What comes back is a
// FormSubmission with two parallel views of the same answers:
//
//   json_path: "$.message.intent.item.descriptor.name" -> "shoes"
//   raw:       "item_name"                              -> "shoes"
//
// The backend applies whichever view fits the action being sent.

use crate::error::{OndcError, OndcResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One field of an input form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    /// Field name, the key used in the raw submission
    pub name: String,

    /// Human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Input kind (text, select, checkbox, date, ...), interpreted by the renderer
    #[serde(rename = "type", default = "default_field_kind")]
    pub kind: String,

    /// Choices for select-like kinds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<serde_json::Value>,

    /// Pre-filled value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    /// Visibility flag; hidden fields are still submitted
    #[serde(default = "default_display")]
    pub display: bool,

    /// JSONPath of the protocol payload field this value patches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
}

fn default_field_kind() -> String {
    "text".to_string()
}

fn default_display() -> bool {
    true
}

impl FormField {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            kind: kind.into(),
            options: Vec::new(),
            default: None,
            display: true,
            json_path: None,
        }
    }

    pub fn with_json_path(mut self, path: impl Into<String>) -> Self {
        self.json_path = Some(path.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.display = false;
        self
    }
}

/// Ordered list of field descriptors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormConfig(pub Vec<FormField>);

impl FormConfig {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &[FormField] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// A zero-field form has nothing for a human to fill
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.0.iter().find(|f| f.name == name)
    }

    pub fn visible_fields(&self) -> impl Iterator<Item = &FormField> {
        self.0.iter().filter(|f| f.display)
    }
}

/// Value of one submitted field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
}

impl FieldValue {
    /// Convert a loose JSON value, rejecting anything outside the known kinds
    pub fn from_json(field: &str, value: &serde_json::Value) -> OndcResult<Self> {
        use serde_json::Value;

        match value {
            Value::String(s) => Ok(Self::Text(s.clone())),
            Value::Number(n) => n.as_f64().map(Self::Number).ok_or_else(|| {
                OndcError::invalid_payload(format!("field '{}': number {} out of range", field, n))
            }),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(OndcError::invalid_payload(format!(
                        "field '{}': list items must be strings, got {}",
                        field,
                        json_kind(other)
                    ))),
                })
                .collect::<OndcResult<Vec<_>>>()
                .map(Self::List),
            other => Err(OndcError::invalid_payload(format!(
                "field '{}': unsupported value of kind {}",
                field,
                json_kind(other)
            ))),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;

    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Answers to an input form, in both representations the backend accepts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    /// JSONPath-keyed patches for the outgoing protocol request
    #[serde(default)]
    pub json_path: BTreeMap<String, FieldValue>,

    /// Field-name-keyed raw form input
    #[serde(default)]
    pub raw: BTreeMap<String, FieldValue>,
}

impl FormSubmission {
    /// Submission used to acknowledge a step with nothing to fill
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(
        json_path: BTreeMap<String, FieldValue>,
        raw: BTreeMap<String, FieldValue>,
    ) -> Self {
        Self { json_path, raw }
    }

    pub fn is_empty(&self) -> bool {
        self.json_path.is_empty() && self.raw.is_empty()
    }

    /// Build both views from raw form answers, mapping every field that
    /// declares a `jsonPath` into the JSONPath view
    pub fn from_form(raw: BTreeMap<String, FieldValue>, config: &FormConfig) -> Self {
        let json_path = raw
            .iter()
            .filter_map(|(name, value)| {
                config
                    .field(name)
                    .and_then(|f| f.json_path.as_ref())
                    .map(|path| (path.clone(), value.clone()))
            })
            .collect();

        Self { json_path, raw }
    }

    /// Validate loose JSON objects into a typed submission
    ///
    /// `null` stands for an empty map; any other non-object is rejected.
    pub fn from_json(
        json_path: &serde_json::Value,
        raw: &serde_json::Value,
    ) -> OndcResult<Self> {
        Ok(Self {
            json_path: typed_map("jsonPath", json_path)?,
            raw: typed_map("raw", raw)?,
        })
    }

    /// Reject raw answers for fields the form does not declare
    pub fn validate_against(&self, config: &FormConfig) -> OndcResult<()> {
        let unknown: Vec<&str> = self
            .raw
            .keys()
            .filter(|name| config.field(name).is_none())
            .map(String::as_str)
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(OndcError::invalid_payload(format!(
                "fields not declared by the form: {}",
                unknown.join(", ")
            )))
        }
    }
}

fn typed_map(
    section: &str,
    value: &serde_json::Value,
) -> OndcResult<BTreeMap<String, FieldValue>> {
    match value {
        serde_json::Value::Null => Ok(BTreeMap::new()),
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), FieldValue::from_json(k, v)?)))
            .collect(),
        other => Err(OndcError::invalid_payload(format!(
            "{} payload must be an object, got {}",
            section,
            json_kind(other)
        ))),
    }
}
