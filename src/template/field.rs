use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic hint for a field. Informational only; rendering never enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    Did,
    Number,
    Date,
    Select,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Did => "did",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Select => "select",
            FieldType::Other(s) => s,
        }
    }
}

impl From<&str> for FieldType {
    fn from(s: &str) -> Self {
        match s {
            "text" => FieldType::Text,
            "did" => FieldType::Did,
            "number" => FieldType::Number,
            "date" => FieldType::Date,
            "select" => FieldType::Select,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        FieldType::from(s.as_str())
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed input of a credential template.
///
/// `id` doubles as the form key and the placeholder name (`{{id}}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub id: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    pub label: String,

    #[serde(default)]
    pub required: bool,

    /// Allowed choices, in declaration order. Never empty when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl FieldSpec {
    pub fn new(id: impl Into<String>, field_type: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type,
            label: label.into(),
            required: false,
            values: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the allowed choices: trimmed, blanks and repeats dropped.
    /// An input that leaves nothing behind clears the set.
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: Vec<String> = Vec::new();
        for v in values {
            let v = v.as_ref().trim();
            if !v.is_empty() && !set.iter().any(|s| s == v) {
                set.push(v.to_string());
            }
        }
        self.values = if set.is_empty() { None } else { Some(set) };
        self
    }
}

/// Field ids marked required by a trailing `!` in a compact type string
/// (`"name!"`), in the order given.
pub fn required_keys<'a, I>(fields: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    fields
        .into_iter()
        .filter(|(_, spec)| spec.ends_with('!'))
        .map(|(id, _)| id.to_string())
        .collect()
}

/// Type of a compact type string with the trailing `!` stripped.
/// A blank spec means `text`.
pub fn field_type(spec: &str) -> FieldType {
    let s = spec.trim();
    let s = s.strip_suffix('!').unwrap_or(s).trim();
    if s.is_empty() {
        FieldType::Text
    } else {
        FieldType::from(s)
    }
}
