//! Turns a [`TemplateDefinition`] plus user input into a credential body.
//!
//! Order of operations:
//! 1. template defaults are laid under the form, then every required field
//!    must have a non-blank value,
//! 2. the scope is built from the form, then `org`, then (text format) `$context`,
//! 3. placeholders are substituted in the serialized skeleton,
//! 4. the result is parsed as a JSON object,
//! 5. `issuer` is forced to `org.did`; `@context`, `issuanceDate` and `jti`
//!    are filled in only when the body leaves them empty.

pub mod builtins;
pub mod replacer;

use crate::error::{CredgenError, Result};
use crate::template::{Skeleton, TemplateDefinition, TemplateMeta};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use builtins::{format_timestamp, Clock, FixedClock, IdGenerator, SequentialIds, SystemClock, UuidGenerator};
pub use replacer::{Builtins, Escaping, PlaceholderReplacer};

pub const VC_CONTEXT_V1: &str = "https://www.w3.org/2018/credentials/v1";

const CONTEXT_KEY: &str = "$context";
const CONTEXT_LITERAL: &str = "\"$context\"";

/// The issuing organization. Only `did` is interpreted; everything else is
/// available to placeholders as `{{org.<key>}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub did: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Organization {
    pub fn new(did: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            extra: Map::new(),
        }
    }
}

/// Per-render input: issuer identity and submitted form values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderContext {
    pub org: Organization,
    #[serde(default)]
    pub form: Map<String, Value>,
}

impl RenderContext {
    pub fn new(org: Organization) -> Self {
        Self {
            org,
            form: Map::new(),
        }
    }

    pub fn with_field(mut self, id: impl Into<String>, value: impl Into<Value>) -> Self {
        self.form.insert(id.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedCredential {
    pub meta: TemplateMeta,
    pub body: Map<String, Value>,
}

pub struct Renderer {
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    escaping: Escaping,
}

impl Renderer {
    /// System clock, random UUIDs, no escaping.
    pub fn new() -> Self {
        Self {
            clock: Box::new(SystemClock),
            ids: Box::new(UuidGenerator),
            escaping: Escaping::Verbatim,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_ids(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Escaping of substituted values. [`Escaping::JsonString`] changes the
    /// output for values containing quotes, backslashes or control characters.
    pub fn escaping(mut self, escaping: Escaping) -> Self {
        self.escaping = escaping;
        self
    }

    pub fn render(&self, template: &TemplateDefinition, ctx: &RenderContext) -> Result<RenderedCredential> {
        info!("Rendering template '{}'", template.key());

        let mut scope = template.defaults().clone();
        scope.extend(ctx.form.iter().map(|(k, v)| (k.clone(), v.clone())));

        validate(template, &scope)?;

        let instant = self.clock.now();
        let now = format_timestamp(instant);
        let builtins = Builtins {
            now: now.clone(),
            uuid: self.ids.generate(),
        };

        scope.insert("org".to_string(), serde_json::to_value(&ctx.org)?);

        let rendered = match template.skeleton() {
            Skeleton::Text(text) => {
                let mut text = text.clone();
                if let Some(context) = template.context() {
                    scope.insert(CONTEXT_KEY.to_string(), Value::String(context.to_string()));
                    let literal = Value::String(context.to_string()).to_string();
                    text = text.replace(CONTEXT_LITERAL, &literal);
                }
                PlaceholderReplacer::with_escaping(self.escaping)
                    .context_placeholder(true)
                    .replace_all(&text, &builtins, &scope)
            }
            Skeleton::Object(value) => {
                let text = serde_json::to_string(value)?;
                PlaceholderReplacer::with_escaping(self.escaping).replace_all(&text, &builtins, &scope)
            }
        };

        let mut body = match serde_json::from_str::<Value>(&rendered).map_err(CredgenError::render_failure)? {
            Value::Object(map) => map,
            other => return Err(CredgenError::BodyNotObject(kind(&other))),
        };

        self.backfill(&mut body, &ctx.org, instant);

        info!("Rendered template '{}'", template.key());
        Ok(RenderedCredential {
            meta: template.meta(),
            body,
        })
    }

    fn backfill(&self, body: &mut Map<String, Value>, org: &Organization, now: DateTime<Utc>) {
        body.insert("issuer".to_string(), Value::String(org.did.clone()));

        if is_unset(body.get("@context")) {
            body.insert(
                "@context".to_string(),
                Value::Array(vec![Value::String(VC_CONTEXT_V1.to_string())]),
            );
        }
        if is_unset(body.get("issuanceDate")) {
            body.insert("issuanceDate".to_string(), Value::String(format_timestamp(now)));
        }
        if is_unset(body.get("jti")) {
            body.insert("jti".to_string(), Value::String(self.token_id(now)));
        }
    }

    /// `vc-<unix seconds>-<5 chars>`.
    fn token_id(&self, now: DateTime<Utc>) -> String {
        let suffix: String = self
            .ids
            .generate()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(5)
            .collect();
        format!("vc-{}-{}", now.timestamp(), suffix)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders with the system clock and random ids.
pub fn render(template: &TemplateDefinition, ctx: &RenderContext) -> Result<RenderedCredential> {
    Renderer::new().render(template, ctx)
}

/// Fails on the first required field whose value is absent, null or blank.
pub fn validate(template: &TemplateDefinition, form: &Map<String, Value>) -> Result<()> {
    for field in template.fields().iter().filter(|f| f.required) {
        let missing = match form.get(&field.id) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        };
        if missing {
            return Err(CredgenError::MissingRequiredField(field.id.clone()));
        }
    }
    Ok(())
}

fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
