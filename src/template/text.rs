//! WPML: the line-oriented template format.
//!
//! ```text
//! @key: studentCard
//! @name: Student Card
//! @context: https://www.w3.org/2018/credentials/v1
//!
//! [fields]
//! subjectDid:did:Subject DID:required
//! status:select:Status:required,values=active|inactive
//!
//! [body]
//! { "credentialSubject": { "id": "{{subjectDid}}" } }
//! ```
//!
//! Ingestion is best-effort for field lines: a malformed or repeated field
//! line is dropped, never an error. Template identity and body are strict.

use super::{FieldSpec, FieldType, Skeleton, TemplateDefinition, TemplateLoader};
use crate::error::{CredgenError, Result};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static META_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@([^:]+):(.*\S.*)$").unwrap());

const FIELDS_MARKER: &str = "[fields]";
const BODY_MARKER: &str = "[body]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Meta,
    Fields,
    Body,
}

/// Adapter for the WPML text format.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextFormat;

impl TemplateLoader for TextFormat {
    type Input = str;

    fn load(&self, input: &str) -> Result<TemplateDefinition> {
        parse(input)
    }
}

/// Parses WPML text into a template definition.
pub fn parse(text: &str) -> Result<TemplateDefinition> {
    let mut section = Section::Meta;
    let mut meta: HashMap<String, String> = HashMap::new();
    let mut fields: Vec<FieldSpec> = Vec::new();
    let mut body_lines: Vec<&str> = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with(FIELDS_MARKER) {
            section = Section::Fields;
            continue;
        }
        if line.starts_with(BODY_MARKER) {
            section = Section::Body;
            continue;
        }

        match section {
            Section::Meta => {
                if let Some((key, value)) = parse_meta_line(line) {
                    meta.insert(key, value);
                } else if line.starts_with('@') {
                    debug!("Skipping malformed meta line {}: {}", idx + 1, line);
                }
            }
            Section::Fields => match parse_field_line(line) {
                Some(field) if fields.iter().any(|f| f.id == field.id) => {
                    debug!("Skipping repeated field '{}' on line {}", field.id, idx + 1);
                }
                Some(field) => fields.push(field),
                None => debug!("Skipping malformed field line {}: {}", idx + 1, line),
            },
            Section::Body => body_lines.push(line),
        }
    }

    let key = meta.remove("key").unwrap_or_default();
    let name = meta.remove("name").unwrap_or_default();
    if key.is_empty() || name.is_empty() {
        return Err(CredgenError::TemplateInvalid(
            "WPML: @key and @name are required".to_string(),
        ));
    }

    let body = body_lines.join("\n").trim().to_string();
    if body.is_empty() {
        return Err(CredgenError::TemplateInvalid(
            "WPML: [body] must not be empty".to_string(),
        ));
    }

    let context = meta
        .remove("context")
        .filter(|c| !c.is_empty())
        .or_else(|| meta.remove("@context").filter(|c| !c.is_empty()));

    TemplateDefinition::new(key, name, context, fields, Skeleton::Text(body))
}

/// `@key: value`, both sides trimmed. Later keys overwrite earlier ones.
fn parse_meta_line(line: &str) -> Option<(String, String)> {
    let caps = META_LINE.captures(line)?;
    let key = caps[1].trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), caps[2].trim().to_string()))
}

/// `id:type:Label[:required][,values=a|b|c]`. Unknown modifiers are ignored.
fn parse_field_line(line: &str) -> Option<FieldSpec> {
    let mut segments = line.split(',');
    let primary: Vec<&str> = segments.next()?.split(':').collect();
    if primary.len() < 3 {
        return None;
    }

    let id = primary[0].trim();
    if id.is_empty() {
        return None;
    }
    let required = primary
        .get(3)
        .map(|s| s.trim().eq_ignore_ascii_case("required"))
        .unwrap_or(false);

    let mut field = FieldSpec::new(id, FieldType::from(primary[1].trim()), primary[2].trim())
        .required(required);

    for modifier in segments {
        let kv: Vec<&str> = modifier.split('=').collect();
        if kv.len() == 2 && kv[0].trim() == "values" {
            field = field.with_values(kv[1].split('|'));
        }
    }

    Some(field)
}
