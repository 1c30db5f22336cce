//! WPT: the directive template format.
//!
//! ```text
//! # comments and blank lines are skipped in the header
//! @key: studentCard
//! @name: Student Card
//! @type+: StudentCard
//! @field subjectDid: did required label="Subject DID"
//! @field dept: select values=CS|EE
//! @default dept: CS
//! ---
//! { "credentialSubject": { "id": "{{subjectDid}}", "dept": "{{dept}}" } }
//! ```
//!
//! Unlike WPML, every header line must be a known directive. `@type+` only
//! shapes the generated skeleton used when the body after `---` is empty.

use super::{FieldSpec, FieldType, Skeleton, TemplateDefinition, TemplateLoader};
use crate::error::{CredgenError, Result};
use crate::render::VC_CONTEXT_V1;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

static KEY_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@([a-zA-Z+]+)\s*:\s*(.+)$").unwrap());
static DEFAULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@default\s+([a-zA-Z0-9._\-]+)\s*:\s*(.+)$").unwrap());
static REQUIRED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\brequired\b").unwrap());
static LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"label="([^"]*)""#).unwrap());
static VALUES: Lazy<Regex> = Lazy::new(|| Regex::new(r"values=(\S+)").unwrap());

const FIELD_PREFIX: &str = "@field ";
const BODY_SEPARATOR: &str = "---";

/// Adapter for the WPT directive format.
#[derive(Debug, Default, Clone, Copy)]
pub struct WptFormat;

impl TemplateLoader for WptFormat {
    type Input = str;

    fn load(&self, input: &str) -> Result<TemplateDefinition> {
        parse(input)
    }
}

enum Directive {
    Meta(String, String),
    TypePlus(String),
    Field(FieldSpec),
    Default(String, String),
}

fn invalid(msg: String) -> CredgenError {
    CredgenError::TemplateInvalid(format!("WPT: {}", msg))
}

/// Parses WPT text. `@key` is required; the name falls back to the key and
/// the context to the W3C v1 context.
pub fn parse(text: &str) -> Result<TemplateDefinition> {
    let mut header = Vec::new();
    let mut body = String::new();
    let mut in_body = false;

    for raw in text.lines() {
        if in_body {
            body.push_str(raw);
            body.push('\n');
            continue;
        }
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == BODY_SEPARATOR {
            in_body = true;
            continue;
        }
        header.push(line);
    }

    let mut key = String::new();
    let mut name = String::new();
    let mut context = VC_CONTEXT_V1.to_string();
    let mut types = Vec::new();
    let mut fields = Vec::new();
    let mut defaults = Map::new();

    for line in header {
        match parse_directive(line)? {
            Directive::Meta(k, v) => match k.as_str() {
                "key" => key = v,
                "name" => name = v,
                "context" => context = v,
                other => return Err(invalid(format!("unknown @ key: {}", other))),
            },
            Directive::TypePlus(t) => types.push(t),
            Directive::Field(f) => fields.push(f),
            Directive::Default(id, v) => {
                defaults.insert(id, Value::String(v));
            }
        }
    }

    if key.is_empty() {
        return Err(invalid("@key missing".to_string()));
    }
    if name.is_empty() {
        name = key.clone();
    }

    let body = body.trim();
    let skeleton = if body.is_empty() {
        Skeleton::Object(generated_skeleton(&context, &types, &fields))
    } else {
        Skeleton::Text(body.to_string())
    };

    Ok(TemplateDefinition::new(key, name, Some(context), fields, skeleton)?.with_defaults(defaults))
}

fn parse_directive(line: &str) -> Result<Directive> {
    if let Some(rest) = line.strip_prefix(FIELD_PREFIX) {
        return parse_field(rest.trim()).map(Directive::Field);
    }

    if let Some(caps) = KEY_VALUE.captures(line) {
        let k = caps[1].trim().to_string();
        let v = caps[2].trim().to_string();
        if k == "type+" {
            return Ok(Directive::TypePlus(v));
        }
        return Ok(Directive::Meta(k, v));
    }

    if let Some(caps) = DEFAULT.captures(line) {
        return Ok(Directive::Default(
            caps[1].trim().to_string(),
            caps[2].trim().to_string(),
        ));
    }

    Err(invalid(format!("unknown directive: {}", line)))
}

/// `id: kind [required] [label="…"] [values=a|b]`
fn parse_field(rest: &str) -> Result<FieldSpec> {
    let malformed = || invalid(format!("malformed @field line: {}", rest));

    let (id, rhs) = rest.split_once(':').ok_or_else(malformed)?;
    let id = id.trim();
    let rhs = rhs.trim();
    if id.is_empty() || rhs.is_empty() {
        return Err(malformed());
    }

    let kind = rhs.split_whitespace().next().ok_or_else(malformed)?;
    let tail = rhs[kind.len()..].trim();

    let label = LABEL
        .captures(tail)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| id.to_string());

    let mut field = FieldSpec::new(id, FieldType::from(kind), label).required(REQUIRED.is_match(tail));
    if let Some(caps) = VALUES.captures(tail) {
        field = field.with_values(caps[1].split('|'));
    }
    Ok(field)
}

/// Skeleton for a template without a body: every field goes into
/// `credentialSubject`, keyed by id, with `id` bound to `subjectDid`.
fn generated_skeleton(context: &str, types: &[String], fields: &[FieldSpec]) -> Value {
    let mut subject = Map::new();
    subject.insert("id".to_string(), Value::String("{{subjectDid}}".to_string()));
    for f in fields {
        subject.insert(f.id.clone(), Value::String(format!("{{{{{}}}}}", f.id)));
    }
    if !subject.contains_key("subjectDid") {
        subject.insert("subjectDid".to_string(), Value::String("{{subjectDid}}".to_string()));
    }

    let mut vc_types = vec!["VerifiableCredential".to_string()];
    vc_types.extend(types.iter().cloned());

    json!({
        "@context": [context],
        "type": vc_types,
        "issuer": "{{org.did}}",
        "credentialSubject": subject,
        "issuanceDate": "{{now}}",
        "jti": "{{uuid}}"
    })
}
