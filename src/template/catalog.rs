use super::TemplateDefinition;
use crate::error::{CredgenError, Result};

/// WPML sources of the templates that ship with the crate.
pub const BUILTIN_PRESETS: [&str; 3] = [STUDENT_CARD, EMPLOYMENT_ATTESTATION, KYC_BASIC];

const STUDENT_CARD: &str = r#"@key: studentCard
@name: Student Card
@context: https://www.w3.org/2018/credentials/v1

[fields]
subjectDid:did:Subject DID:required
name:text:Full Name:required
dept:text:Department
studentNo:text:Student No:required

[body]
{
  "@context": ["$context"],
  "type": ["VerifiableCredential", "StudentCard"],
  "issuer": "{{org.did}}",
  "credentialSubject": {
    "id": "{{subjectDid}}",
    "name": "{{name}}",
    "dept": "{{dept}}",
    "studentNo": "{{studentNo}}"
  }
}
"#;

const EMPLOYMENT_ATTESTATION: &str = r#"@key: employmentAttestation
@name: Employment Attestation
@context: https://www.w3.org/2018/credentials/v1

[fields]
subjectDid:did:Subject DID:required
name:text:Full Name:required
role:text:Role/Title:required
startDate:date:Start Date:required
status:select:Employment Status:required,values=active|contractor|terminated

[body]
{
  "@context": ["$context"],
  "type": ["VerifiableCredential","EmploymentAttestation"],
  "issuer": "{{org.did}}",
  "credentialSubject": {
    "id": "{{subjectDid}}",
    "name": "{{name}}",
    "role": "{{role}}",
    "status": "{{status}}",
    "startDate": "{{startDate}}"
  },
  "evidence": [{
    "type": "HRSystemRecord",
    "verifier": "{{org.did}}",
    "referenceId": "{{uuid}}"
  }]
}
"#;

const KYC_BASIC: &str = r#"@key: kycBasic
@name: KYC Basic
@context: https://www.w3.org/2018/credentials/v1

[fields]
subjectDid:did:Subject DID:required
name:text:Full Name:required
nationality:text:Nationality
birthDate:date:Birth Date
idNumber:text:Gov ID / Passport
pep:select:PEP,values=no|yes

[body]
{
  "@context": ["$context"],
  "type": ["VerifiableCredential","KYCBasic"],
  "issuer":"{{org.did}}",
  "credentialSubject":{
    "id":"{{subjectDid}}",
    "name":"{{name}}",
    "nationality":"{{nationality}}",
    "birthDate":"{{birthDate}}",
    "idNumber":"{{idNumber}}",
    "pep":"{{pep}}"
  }
}
"#;

/// Templates indexed by key, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: Vec<TemplateDefinition>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled presets.
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::new();
        for src in BUILTIN_PRESETS {
            catalog.insert(TemplateDefinition::from_text(src)?)?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, template: TemplateDefinition) -> Result<()> {
        if self.templates.iter().any(|t| t.key() == template.key()) {
            return Err(CredgenError::DuplicateTemplateKey(template.key().to_string()));
        }
        self.templates.push(template);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&TemplateDefinition> {
        self.templates
            .iter()
            .find(|t| t.key() == key)
            .ok_or_else(|| CredgenError::PresetNotFound(key.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateDefinition> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::FieldType;

    #[test]
    fn test_builtin_presets_parse() {
        let catalog = Catalog::builtin().unwrap();
        let keys: Vec<&str> = catalog.iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["studentCard", "employmentAttestation", "kycBasic"]);
    }

    #[test]
    fn test_employment_status_values() {
        let catalog = Catalog::builtin().unwrap();
        let status = catalog
            .get("employmentAttestation")
            .unwrap()
            .field("status")
            .unwrap()
            .clone();
        assert_eq!(status.field_type, FieldType::Select);
        assert!(status.required);
        assert_eq!(
            status.values,
            Some(vec![
                "active".to_string(),
                "contractor".to_string(),
                "terminated".to_string()
            ])
        );
    }

    #[test]
    fn test_unknown_preset() {
        let catalog = Catalog::builtin().unwrap();
        assert!(matches!(
            catalog.get("passport"),
            Err(CredgenError::PresetNotFound(k)) if k == "passport"
        ));
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let mut catalog = Catalog::builtin().unwrap();
        let again = TemplateDefinition::from_text(STUDENT_CARD).unwrap();
        assert!(matches!(
            catalog.insert(again),
            Err(CredgenError::DuplicateTemplateKey(_))
        ));
        assert_eq!(catalog.len(), 3);
    }
}
