//! Template definitions and the source formats that produce them.
//!
//! - `text`: the line-oriented WPML format (`@meta`, `[fields]`, `[body]`).
//! - `object`: the WPM JSON object format (`{"meta": …, "vc": …}`).
//! - `wpt`: the directive format (`@field`, `@default`, `---` body).
//!
//! Each is an adapter behind [`TemplateLoader`] and yields the same
//! [`TemplateDefinition`], which is then handed to the renderer.

pub mod catalog;
pub mod field;
pub mod object;
pub mod text;
pub mod wpt;

use crate::error::{CredgenError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use catalog::Catalog;
pub use field::{field_type, required_keys, FieldSpec, FieldType};
pub use object::ObjectFormat;
pub use text::TextFormat;
pub use wpt::WptFormat;

/// A source format that can be turned into a [`TemplateDefinition`].
pub trait TemplateLoader {
    type Input: ?Sized;

    fn load(&self, input: &Self::Input) -> Result<TemplateDefinition>;
}

/// Body skeleton of a template, tagged by the format it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Skeleton {
    /// Raw text; placeholders are substituted before the text is parsed as JSON.
    Text(String),
    /// A live JSON value; placeholders sit inside its string leaves.
    Object(Value),
}

/// Which kind of skeleton a template renders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Object,
}

/// The part of a template a form UI needs for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMeta {
    pub key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub defaults: Map<String, Value>,
}

/// A parsed credential template. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDefinition {
    key: String,
    name: String,
    context: Option<String>,
    fields: Vec<FieldSpec>,
    defaults: Map<String, Value>,
    skeleton: Skeleton,
}

impl TemplateDefinition {
    /// Builds a definition, rejecting a blank key or name, an empty body
    /// and repeated field ids.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        context: Option<String>,
        fields: Vec<FieldSpec>,
        skeleton: Skeleton,
    ) -> Result<Self> {
        let key = key.into();
        let name = name.into();

        if key.trim().is_empty() {
            return Err(CredgenError::TemplateInvalid("missing key".to_string()));
        }
        if name.trim().is_empty() {
            return Err(CredgenError::TemplateInvalid("missing name".to_string()));
        }
        match &skeleton {
            Skeleton::Text(s) if s.trim().is_empty() => {
                return Err(CredgenError::TemplateInvalid("empty body".to_string()));
            }
            Skeleton::Object(v) if !v.is_object() => {
                return Err(CredgenError::TemplateInvalid(
                    "body must be a JSON object".to_string(),
                ));
            }
            _ => {}
        }
        for (i, f) in fields.iter().enumerate() {
            if fields[..i].iter().any(|g| g.id == f.id) {
                return Err(CredgenError::TemplateInvalid(format!(
                    "duplicate field id '{}'",
                    f.id
                )));
            }
        }

        Ok(Self {
            key,
            name,
            context: context.filter(|c| !c.trim().is_empty()),
            fields,
            defaults: Map::new(),
            skeleton,
        })
    }

    /// Parses the WPML text format.
    pub fn from_text(text: &str) -> Result<Self> {
        TextFormat.load(text)
    }

    /// Values used for fields the form leaves out.
    pub fn with_defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Parses the WPT directive format.
    pub fn from_wpt(text: &str) -> Result<Self> {
        WptFormat.load(text)
    }

    /// Normalizes an already-parsed WPM object.
    pub fn from_object(raw: &Value) -> Result<Self> {
        ObjectFormat.load(raw)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn defaults(&self) -> &Map<String, Value> {
        &self.defaults
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn format(&self) -> Format {
        match self.skeleton {
            Skeleton::Text(_) => Format::Text,
            Skeleton::Object(_) => Format::Object,
        }
    }

    pub fn meta(&self) -> TemplateMeta {
        TemplateMeta {
            key: self.key.clone(),
            name: self.name.clone(),
            context: self.context.clone(),
            fields: self.fields.clone(),
            defaults: self.defaults.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> Skeleton {
        Skeleton::Text(r#"{"a":"{{x}}"}"#.to_string())
    }

    #[test]
    fn test_rejects_blank_key_and_name() {
        assert!(matches!(
            TemplateDefinition::new(" ", "Name", None, vec![], body()),
            Err(CredgenError::TemplateInvalid(_))
        ));
        assert!(matches!(
            TemplateDefinition::new("key", "", None, vec![], body()),
            Err(CredgenError::TemplateInvalid(_))
        ));
    }

    #[test]
    fn test_rejects_empty_text_body() {
        let r = TemplateDefinition::new("k", "n", None, vec![], Skeleton::Text("  \n".into()));
        assert!(matches!(r, Err(CredgenError::TemplateInvalid(_))));
    }

    #[test]
    fn test_rejects_non_object_skeleton() {
        let r = TemplateDefinition::new("k", "n", None, vec![], Skeleton::Object(json!([1])));
        assert!(matches!(r, Err(CredgenError::TemplateInvalid(_))));
    }

    #[test]
    fn test_rejects_duplicate_field_ids() {
        let fields = vec![
            FieldSpec::new("name", FieldType::Text, "Name"),
            FieldSpec::new("name", FieldType::Text, "Other"),
        ];
        let r = TemplateDefinition::new("k", "n", None, fields, body());
        assert!(matches!(r, Err(CredgenError::TemplateInvalid(_))));
    }

    #[test]
    fn test_blank_context_is_dropped() {
        let t = TemplateDefinition::new("k", "n", Some(" ".into()), vec![], body()).unwrap();
        assert_eq!(t.context(), None);
        assert_eq!(t.format(), Format::Text);
    }
}
