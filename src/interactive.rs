use crate::error::Result;
use crate::template::{FieldSpec, TemplateDefinition};
use serde_json::{Map, Value};
use std::io::{self, BufRead, Write};

/// Liest eine Zeile; `None` bei Eingabeende
fn read_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<Option<String>> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt_for(field: &FieldSpec) -> String {
    let mut prompt = format!("{} ({}, {})", field.label, field.id, field.field_type);
    if let Some(values) = &field.values {
        prompt.push_str(&format!(" [{}]", values.join("|")));
    }
    if field.required {
        prompt.push_str(" *");
    }
    prompt.push_str(": ");
    prompt
}

/// Fragt alle Felder eines Templates ab.
///
/// Pflichtfelder werden wiederholt abgefragt, solange sie leer sind; bei
/// Auswahlfeldern nur erlaubte Werte. Leere optionale Felder bleiben weg.
pub fn prompt_fields<R: BufRead, W: Write>(
    template: &TemplateDefinition,
    input: &mut R,
    output: &mut W,
) -> Result<Map<String, Value>> {
    writeln!(output, "📝 {} ({})", template.name(), template.key())?;
    writeln!(output, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;

    let mut form = Map::new();

    for field in template.fields() {
        let prompt = prompt_for(field);
        loop {
            let Some(value) = read_line(input, output, &prompt)? else {
                // Eingabe zu Ende: Pflichtprüfung übernimmt der Renderer
                return Ok(form);
            };

            if value.is_empty() {
                if field.required {
                    writeln!(output, "❌ {} darf nicht leer sein!", field.label)?;
                    continue;
                }
                break;
            }

            if let Some(values) = &field.values {
                if !values.contains(&value) {
                    writeln!(output, "⚠️  Erlaubt: {}", values.join(", "))?;
                    continue;
                }
            }

            form.insert(field.id.clone(), Value::String(value));
            break;
        }
    }

    Ok(form)
}

/// Interaktives Ausfüllen über stdin/stdout
pub fn fill_interactive(template: &TemplateDefinition) -> Result<Map<String, Value>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    prompt_fields(template, &mut input, &mut output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> TemplateDefinition {
        TemplateDefinition::from_text(
            "@key: k\n@name: N\n[fields]\nname:text:Name:required\ndept:text:Dept\npep:select:PEP,values=no|yes\n[body]\n{}",
        )
        .unwrap()
    }

    #[test]
    fn test_required_field_is_reprompted() {
        let mut input = io::Cursor::new("\nAda\n\nno\n");
        let mut output = Vec::new();
        let form = prompt_fields(&template(), &mut input, &mut output).unwrap();

        assert_eq!(form.get("name"), Some(&Value::String("Ada".to_string())));
        assert!(form.get("dept").is_none());
        assert_eq!(form.get("pep"), Some(&Value::String("no".to_string())));

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Name darf nicht leer sein"));
    }

    #[test]
    fn test_select_rejects_unknown_value() {
        let mut input = io::Cursor::new("Ada\nIT\nmaybe\nyes\n");
        let mut output = Vec::new();
        let form = prompt_fields(&template(), &mut input, &mut output).unwrap();

        assert_eq!(form.get("pep"), Some(&Value::String("yes".to_string())));
        assert!(String::from_utf8(output).unwrap().contains("Erlaubt: no, yes"));
    }

    #[test]
    fn test_end_of_input_stops() {
        let mut input = io::Cursor::new("");
        let mut output = Vec::new();
        let form = prompt_fields(&template(), &mut input, &mut output).unwrap();
        assert!(form.is_empty());
    }
}
