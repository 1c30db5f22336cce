use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "credgen")]
#[command(author, version, about, long_about = None)]
#[command(about = "Render verifiable-credential templates into credential JSON")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Where the template comes from: a file or a built-in preset.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct TemplateArgs {
    /// Template file (.json = WPM object, .wpt = WPT directives, anything else = WPML text)
    #[arg(short, long)]
    pub template: Option<String>,

    /// Built-in preset key (see `credgen presets`)
    #[arg(short, long)]
    pub preset: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a credential from a template and field values
    Render {
        #[command(flatten)]
        source: TemplateArgs,

        /// Issuer DID
        #[arg(long, env = "CREDGEN_ORG_DID")]
        org_did: String,

        /// Field values in format KEY=VALUE (can be used multiple times)
        #[arg(short = 'f', long = "field", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,

        /// JSON file with an object of field values (KEY=VALUE arguments win)
        #[arg(long)]
        form: Option<String>,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Escape field values for JSON strings before substitution
        #[arg(long)]
        escape: bool,
    },

    /// Interactively fill a template's fields and render the credential
    Fill {
        #[command(flatten)]
        source: TemplateArgs,

        /// Issuer DID
        #[arg(long, env = "CREDGEN_ORG_DID")]
        org_did: String,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print a template's field schema as JSON
    Fields {
        #[command(flatten)]
        source: TemplateArgs,
    },

    /// List built-in presets
    Presets,

    /// Generate an example template file
    Example {
        /// Output path for the example template
        #[arg(short, long, default_value = "student_card.wpml")]
        output: String,

        /// Write the JSON object format instead of WPML text
        #[arg(long)]
        object: bool,
    },
}

/// Parse a single key-value pair
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("name=Ada=Lovelace"),
            Ok(("name".to_string(), "Ada=Lovelace".to_string()))
        );
        assert!(parse_key_val("name").is_err());
    }

    #[test]
    fn test_render_args() {
        let cli = Cli::try_parse_from([
            "credgen", "render", "--preset", "studentCard", "--org-did", "did:x:org",
            "-f", "name=Ada", "-f", "studentNo=42",
        ])
        .unwrap();
        match cli.command {
            Commands::Render { source, org_did, fields, escape, .. } => {
                assert_eq!(source.preset.as_deref(), Some("studentCard"));
                assert!(source.template.is_none());
                assert_eq!(org_did, "did:x:org");
                assert_eq!(fields.len(), 2);
                assert!(!escape);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_template_and_preset_conflict() {
        let r = Cli::try_parse_from([
            "credgen", "fields", "--preset", "studentCard", "--template", "x.wpml",
        ]);
        assert!(r.is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
