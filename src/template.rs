//! Code snippets rendered from user templates.
//!
//! Placeholders use the `{{.Field}}` form; whitespace inside the braces is
//! ignored. Supported fields are `SecretName` (last path segment),
//! `FullSecretName` and `ProjectID`.

use crate::tree::segments;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("unclosed placeholder at byte {0}")]
    Unclosed(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
    pub secret_name: String,
    pub full_secret_name: String,
    pub project_id: String,
}

impl TemplateContext {
    pub fn new(full_name: &str, separator: &str, project_id: &str) -> Self {
        let short = segments(full_name, separator)
            .last()
            .copied()
            .unwrap_or(full_name)
            .to_string();
        Self {
            secret_name: short,
            full_secret_name: full_name.to_string(),
            project_id: project_id.to_string(),
        }
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "SecretName" => Some(&self.secret_name),
            "FullSecretName" => Some(&self.full_secret_name),
            "ProjectID" => Some(&self.project_id),
            _ => None,
        }
    }
}

pub fn render(code: &str, ctx: &TemplateContext) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(code.len());
    let mut rest = code;
    let mut offset = 0;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or(TemplateError::Unclosed(offset + start))?;
        let inner = after[..end].trim();
        let name = inner.strip_prefix('.').unwrap_or(inner).trim();
        let value = ctx
            .field(name)
            .ok_or_else(|| TemplateError::UnknownField(name.to_string()))?;
        out.push_str(value);
        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Ok(out)
}
