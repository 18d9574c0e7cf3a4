//! Secret store collaborator.
//!
//! Every call names the project explicitly so a store carries no UI state and
//! can be shared by worker threads.

use std::io;

use zeroize::Zeroizing;

pub mod local;

pub use crate::models::{Secret, SecretVersion, VersionState};
pub use local::LocalStore;

/// Version alias resolving to the newest enabled version.
pub const LATEST: &str = "latest";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("secret '{0}' not found")]
    NotFound(String),
    #[error("secret '{0}' already exists")]
    AlreadyExists(String),
    #[error("version '{version}' of '{secret}' not found")]
    VersionNotFound { secret: String, version: String },
    #[error("version '{version}' of '{secret}' is {state}")]
    VersionUnavailable {
        secret: String,
        version: String,
        state: &'static str,
    },
    #[error("unable to decrypt project '{0}': wrong passphrase or corrupted file")]
    Decrypt(String),
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("unsupported project file: {0}")]
    Format(String),
    #[error("crypto error: {0}")]
    Crypto(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

pub trait SecretStore: Send + Sync {
    /// Opens `project` and returns the identity actions are attributed to.
    fn connect(&self, project: &str) -> Result<String, StoreError>;
    fn list_secrets(&self, project: &str) -> Result<Vec<Secret>, StoreError>;
    /// Newest first.
    fn list_versions(&self, project: &str, secret: &str) -> Result<Vec<SecretVersion>, StoreError>;
    fn access_version(
        &self,
        project: &str,
        secret: &str,
        version: &str,
    ) -> Result<Zeroizing<Vec<u8>>, StoreError>;
    /// `location` of `None` means automatic replication.
    fn create_secret(&self, project: &str, name: &str, location: Option<&str>) -> Result<(), StoreError>;
    fn add_version(&self, project: &str, secret: &str, payload: &[u8]) -> Result<SecretVersion, StoreError>;
    fn delete_secret(&self, project: &str, secret: &str) -> Result<(), StoreError>;
}

const MAX_PROJECT_LEN: usize = 64;
const MAX_SECRET_LEN: usize = 255;

pub fn validate_project(project: &str) -> Result<(), StoreError> {
    if project.is_empty() || project.len() > MAX_PROJECT_LEN {
        return Err(StoreError::InvalidName(format!(
            "project id must be 1..={MAX_PROJECT_LEN} characters"
        )));
    }
    if project.starts_with('.') {
        return Err(StoreError::InvalidName("project id must not start with '.'".into()));
    }
    if !project
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(StoreError::InvalidName(
            "project id may only use A-Za-z0-9._-".into(),
        ));
    }
    Ok(())
}

pub fn validate_secret_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() || name.len() > MAX_SECRET_LEN {
        return Err(StoreError::InvalidName(format!(
            "secret name must be 1..={MAX_SECRET_LEN} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(StoreError::InvalidName(
            "secret name must not contain control characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_ids() {
        assert!(validate_project("my-proj_1.prod").is_ok());
        assert!(validate_project("").is_err());
        assert!(validate_project("../escape").is_err());
        assert!(validate_project(".hidden").is_err());
        assert!(validate_project("a/b").is_err());
    }

    #[test]
    fn secret_names() {
        assert!(validate_secret_name("team/api/token").is_ok());
        assert!(validate_secret_name("   ").is_err());
        assert!(validate_secret_name("bad\nname").is_err());
    }
}
