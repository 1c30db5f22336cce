//! WPM: the JSON object template format.
//!
//! ```json
//! {
//!   "meta": { "name": "Student Card", "fields": { "name": "text!", "studentNo": "text" } },
//!   "vc": { "credentialSubject": { "name": "{{name}}" } }
//! }
//! ```
//!
//! Field types are compact strings; a trailing `!` marks the field required.

use super::{field_type, required_keys, FieldSpec, Skeleton, TemplateDefinition, TemplateLoader};
use crate::error::{CredgenError, Result};
use serde_json::Value;

const DEFAULT_NAME: &str = "Untitled";

/// Adapter for the WPM object format.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectFormat;

impl TemplateLoader for ObjectFormat {
    type Input = Value;

    fn load(&self, input: &Value) -> Result<TemplateDefinition> {
        normalize(input)
    }
}

/// Coerces a WPM object into a template definition.
///
/// Only a missing or non-object `vc` is fatal. A missing name falls back to
/// `"Untitled"`, a missing key to the name.
pub fn normalize(raw: &Value) -> Result<TemplateDefinition> {
    let vc = match raw.get("vc") {
        Some(vc @ Value::Object(_)) => vc.clone(),
        _ => {
            return Err(CredgenError::TemplateInvalid(
                "missing 'vc' object".to_string(),
            ))
        }
    };

    let meta = raw.get("meta");
    let name = non_empty_str(meta.and_then(|m| m.get("name")))
        .unwrap_or(DEFAULT_NAME)
        .to_string();
    let key = non_empty_str(meta.and_then(|m| m.get("key")))
        .map(str::to_string)
        .unwrap_or_else(|| name.clone());
    let context = non_empty_str(meta.and_then(|m| m.get("context"))).map(str::to_string);

    let specs: Vec<(String, String)> = match meta.and_then(|m| m.get("fields")) {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(id, spec)| (id.clone(), compact_spec(spec)))
            .collect(),
        _ => Vec::new(),
    };
    let required = required_keys(specs.iter().map(|(id, spec)| (id.as_str(), spec.as_str())));

    let fields = specs
        .iter()
        .map(|(id, spec)| {
            FieldSpec::new(id.as_str(), field_type(spec), id.as_str()).required(required.contains(id))
        })
        .collect();

    TemplateDefinition::new(key, name, context, fields, Skeleton::Object(vc))
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
    v.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

fn compact_spec(spec: &Value) -> String {
    match spec {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::FieldType;
    use serde_json::json;

    #[test]
    fn test_normalize_student_card() {
        let raw = json!({
            "meta": {
                "name": "Student Card",
                "fields": { "subjectDid": "did!", "name": "text!", "studentNo": "text" }
            },
            "vc": { "type": ["VerifiableCredential"], "credentialSubject": { "id": "{{subjectDid}}" } }
        });
        let t = normalize(&raw).unwrap();
        assert_eq!(t.name(), "Student Card");
        assert_eq!(t.key(), "Student Card");

        let ids: Vec<&str> = t.fields().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["subjectDid", "name", "studentNo"]);
        assert_eq!(t.field("subjectDid").unwrap().field_type, FieldType::Did);
        assert!(t.field("name").unwrap().required);
        assert!(!t.field("studentNo").unwrap().required);
        assert_eq!(t.field("name").unwrap().label, "name");
    }

    #[test]
    fn test_missing_name_defaults_to_untitled() {
        let t = normalize(&json!({ "vc": {} })).unwrap();
        assert_eq!(t.name(), "Untitled");
        assert!(t.fields().is_empty());
    }

    #[test]
    fn test_explicit_key_and_context() {
        let raw = json!({
            "meta": { "key": "card", "name": "Card", "context": "urn:ctx" },
            "vc": {}
        });
        let t = normalize(&raw).unwrap();
        assert_eq!(t.key(), "card");
        assert_eq!(t.context(), Some("urn:ctx"));
    }

    #[test]
    fn test_missing_or_non_object_vc_is_invalid() {
        for raw in [json!({}), json!({ "vc": "x" }), json!({ "vc": [] }), json!(null)] {
            assert!(matches!(
                normalize(&raw),
                Err(CredgenError::TemplateInvalid(_))
            ));
        }
    }
}
