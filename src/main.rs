use clap::Parser;
use credgen::cli::TemplateArgs;
use credgen::render::Escaping;
use credgen::template::catalog::BUILTIN_PRESETS;
use credgen::{
    Catalog, Cli, Commands, CredgenError, Organization, RenderContext, Renderer, Result,
    TemplateDefinition,
};
use log::{error, info};
use serde_json::{Map, Value};
use std::path::Path;

fn main() {
    if let Err(e) = run() {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logging initialisieren
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Render {
            source,
            org_did,
            fields,
            form,
            output,
            escape,
        } => {
            let template = load_template(&source)?;
            let form = build_form(form.as_deref(), fields)?;
            let escaping = if escape {
                Escaping::JsonString
            } else {
                Escaping::Verbatim
            };
            render_to(&template, &org_did, form, output.as_deref(), escaping)?;
        }

        Commands::Fill {
            source,
            org_did,
            output,
        } => {
            let template = load_template(&source)?;
            let form = credgen::interactive::fill_interactive(&template)?;
            render_to(&template, &org_did, form, output.as_deref(), Escaping::Verbatim)?;
        }

        Commands::Fields { source } => {
            let template = load_template(&source)?;
            info!(
                "Template '{}' renders from a {:?} body with {} fields",
                template.key(),
                template.format(),
                template.fields().len()
            );
            println!("{}", serde_json::to_string_pretty(&template.meta())?);
        }

        Commands::Presets => {
            for template in Catalog::builtin()?.iter() {
                println!("{:<24} {}", template.key(), template.name());
            }
        }

        Commands::Example { output, object } => {
            info!("Generating example template");
            generate_example(&output, object)?;
            println!("✓ Example template created: {}", output);
        }
    }

    Ok(())
}

/// Lädt ein Template aus Datei oder Preset
fn load_template(source: &TemplateArgs) -> Result<TemplateDefinition> {
    if let Some(key) = &source.preset {
        info!("Using preset: {}", key);
        return Ok(Catalog::builtin()?.get(key)?.clone());
    }

    let path = source
        .template
        .as_deref()
        .ok_or_else(|| CredgenError::TemplateNotFound(String::new()))?;
    if !Path::new(path).exists() {
        return Err(CredgenError::TemplateNotFound(path.to_string()));
    }

    info!("Loading template: {}", path);
    let content = std::fs::read_to_string(path)?;
    match SourceFormat::from_path(path) {
        SourceFormat::Object => {
            let raw: Value = serde_json::from_str(&content)?;
            TemplateDefinition::from_object(&raw)
        }
        SourceFormat::Wpt => TemplateDefinition::from_wpt(&content),
        SourceFormat::Wpml => TemplateDefinition::from_text(&content),
    }
}

/// Template dialect, chosen by file extension
#[derive(Debug, PartialEq, Eq)]
enum SourceFormat {
    Wpml,
    Wpt,
    Object,
}

impl SourceFormat {
    fn from_path(path: &str) -> Self {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => SourceFormat::Object,
            Some("wpt") => SourceFormat::Wpt,
            _ => SourceFormat::Wpml,
        }
    }
}

/// Formularwerte: erst die JSON-Datei, dann KEY=VALUE-Argumente darüber
fn build_form(form_path: Option<&str>, fields: Vec<(String, String)>) -> Result<Map<String, Value>> {
    let mut form = match form_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => map,
                _ => {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "Expected top-level JSON object in form file",
                    )
                    .into())
                }
            }
        }
        None => Map::new(),
    };

    for (key, value) in fields {
        info!("Adding field: {} = {}", key, value);
        form.insert(key, Value::String(value));
    }

    Ok(form)
}

fn render_to(
    template: &TemplateDefinition,
    org_did: &str,
    form: Map<String, Value>,
    output: Option<&str>,
    escaping: Escaping,
) -> Result<()> {
    let ctx = RenderContext {
        org: Organization::new(org_did),
        form,
    };
    let rendered = Renderer::new().escaping(escaping).render(template, &ctx)?;
    let json = serde_json::to_string_pretty(&rendered.body)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("✓ Credential created: {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn generate_example(output: &str, object: bool) -> Result<()> {
    let content = if object {
        let example = serde_json::json!({
            "meta": {
                "key": "studentCard",
                "name": "Student Card",
                "fields": {
                    "subjectDid": "did!",
                    "name": "text!",
                    "dept": "text",
                    "studentNo": "text!"
                }
            },
            "vc": {
                "@context": ["https://www.w3.org/2018/credentials/v1"],
                "type": ["VerifiableCredential", "StudentCard"],
                "credentialSubject": {
                    "id": "{{subjectDid}}",
                    "name": "{{name}}",
                    "dept": "{{dept}}",
                    "studentNo": "{{studentNo}}"
                },
                "issuanceDate": "{{now}}"
            }
        });
        serde_json::to_string_pretty(&example)?
    } else {
        BUILTIN_PRESETS[0].to_string()
    };

    std::fs::write(output, content)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_format_from_path() {
        assert_eq!(SourceFormat::from_path("card.json"), SourceFormat::Object);
        assert_eq!(SourceFormat::from_path("dir/CARD.JSON"), SourceFormat::Object);
        assert_eq!(SourceFormat::from_path("card.wpt"), SourceFormat::Wpt);
        assert_eq!(SourceFormat::from_path("card.wpml"), SourceFormat::Wpml);
        assert_eq!(SourceFormat::from_path("card"), SourceFormat::Wpml);
    }

    #[test]
    fn test_wpt_file_loads() {
        let dir = std::env::temp_dir().join(format!("credgen-wpt-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("card.wpt");
        std::fs::write(&path, "@key: card\n@field subjectDid: did required\n@default dept: CS\n---\n").unwrap();

        let source = TemplateArgs {
            template: Some(path.to_str().unwrap().to_string()),
            preset: None,
        };
        let t = load_template(&source).unwrap();
        assert_eq!(t.key(), "card");
        assert_eq!(t.format(), credgen::template::Format::Object);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_build_form_without_file() {
        let form = build_form(None, vec![("name".to_string(), "Ada".to_string())]).unwrap();
        assert_eq!(form.get("name"), Some(&Value::String("Ada".to_string())));
    }

    #[test]
    fn test_example_templates_load() {
        let dir = std::env::temp_dir().join(format!("credgen-example-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let text = dir.join("card.wpml");
        let object = dir.join("card.json");
        generate_example(text.to_str().unwrap(), false).unwrap();
        generate_example(object.to_str().unwrap(), true).unwrap();

        for path in [&text, &object] {
            let source = TemplateArgs {
                template: Some(path.to_str().unwrap().to_string()),
                preset: None,
            };
            let t = load_template(&source).unwrap();
            assert_eq!(t.key(), "studentCard");
            assert_eq!(t.fields().len(), 4);
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_template_file() {
        let source = TemplateArgs {
            template: Some("/nonexistent/card.wpml".to_string()),
            preset: None,
        };
        assert!(matches!(
            load_template(&source),
            Err(CredgenError::TemplateNotFound(_))
        ));
    }
}
