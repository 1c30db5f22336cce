use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([A-Za-z0-9_.\-]+)\}\}").unwrap());
static PLACEHOLDER_WITH_CONTEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{(\$?[A-Za-z0-9_.\-]+)\}\}").unwrap());

const NOW: &str = "{{now}}";
const UUID: &str = "{{uuid}}";

/// How looked-up values are written into the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Escaping {
    /// Values go in as-is. A quote in user input can break the JSON body.
    #[default]
    Verbatim,
    /// Values are escaped for use inside a JSON string literal.
    JsonString,
}

/// Values of the `{{now}}` and `{{uuid}}` built-ins for one render.
#[derive(Debug, Clone)]
pub struct Builtins {
    pub now: String,
    pub uuid: String,
}

/// Substitutes `{{path}}` placeholders in text.
pub struct PlaceholderReplacer {
    escaping: Escaping,
    context_placeholder: bool,
}

impl PlaceholderReplacer {
    pub fn new() -> Self {
        Self {
            escaping: Escaping::Verbatim,
            context_placeholder: false,
        }
    }

    pub fn with_escaping(escaping: Escaping) -> Self {
        Self {
            escaping,
            context_placeholder: false,
        }
    }

    /// Also treat `{{$context}}` as a placeholder. Off by default, where it
    /// stays literal text.
    pub fn context_placeholder(mut self, enabled: bool) -> Self {
        self.context_placeholder = enabled;
        self
    }

    fn escape_json(text: &str) -> String {
        let quoted = Value::String(text.to_string()).to_string();
        quoted[1..quoted.len() - 1].to_string()
    }

    /// Replaces the built-ins first, then every other placeholder by walking
    /// its dotted path through `scope`. Unknown paths become `""`.
    pub fn replace_all(&self, content: &str, builtins: &Builtins, scope: &Map<String, Value>) -> String {
        let result = content
            .replace(NOW, &builtins.now)
            .replace(UUID, &builtins.uuid);

        let pattern = if self.context_placeholder {
            &PLACEHOLDER_WITH_CONTEXT
        } else {
            &PLACEHOLDER
        };

        pattern
            .replace_all(&result, |caps: &Captures| {
                let path = &caps[1];
                match lookup(scope, path) {
                    Some(value) => match self.escaping {
                        Escaping::Verbatim => value,
                        Escaping::JsonString => Self::escape_json(&value),
                    },
                    None => {
                        debug!("Placeholder '{{{{{}}}}}' has no value, using empty string", path);
                        String::new()
                    }
                }
            })
            .into_owned()
    }
}

impl Default for PlaceholderReplacer {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves `a.b.c` against nested objects. Null resolves to `""`.
pub fn lookup(scope: &Map<String, Value>, path: &str) -> Option<String> {
    let mut segments = path.split('.');
    let mut current = scope.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(match current {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
