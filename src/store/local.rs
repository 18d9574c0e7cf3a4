//! Encrypted on-disk secret store, one file per project.
//!
//! Each project file holds a random data key wrapped under an Argon2id key
//! derived from the session passphrase, and the project document encrypted
//! under that data key. Every write re-wraps with a fresh salt and data key.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use base64::Engine;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use super::{
    validate_project, validate_secret_name, Secret, SecretStore, SecretVersion, StoreError,
    VersionState, LATEST,
};
use crate::crypto::{
    decrypt_with_key, derive_key_with_params, encrypt_with_key, random_bytes, KdfParams, KEY_LEN,
};
use crate::models::{EncryptedBlob, ProjectDocument, StoredSecret, StoredVersion};
use crate::storage::atomic_write;

const PROJECT_FORMAT_VERSION: u8 = 1;
const KDF_SALT_LEN: usize = 16;
const PROJECT_EXT: &str = "vault";

#[derive(Serialize, Deserialize)]
struct KdfHeader {
    m_cost: u32,
    t_cost: u32,
    p_cost: u32,
}

#[derive(Serialize, Deserialize)]
struct ProjectFile {
    version: u8,
    kdf: KdfHeader,
    kdf_salt: String,
    wrapped_key: EncryptedBlob,
    document: EncryptedBlob,
}

pub struct LocalStore {
    dir: PathBuf,
    passphrase: Zeroizing<String>,
    params: KdfParams,
    actor: String,
    lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(dir: PathBuf, passphrase: Zeroizing<String>) -> Self {
        Self {
            dir,
            passphrase,
            params: KdfParams::default(),
            actor: default_actor(),
            lock: Mutex::new(()),
        }
    }

    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_actor(mut self, actor: &str) -> Self {
        self.actor = actor.to_string();
        self
    }

    fn project_path(&self, project: &str) -> Result<PathBuf, StoreError> {
        validate_project(project)?;
        Ok(self.dir.join(format!("{project}.{PROJECT_EXT}")))
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded value is `()`, so a poisoned lock carries no broken state.
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load(&self, project: &str) -> Result<ProjectDocument, StoreError> {
        let path = self.project_path(project)?;
        if !path.exists() {
            return Ok(ProjectDocument::default());
        }
        let raw = fs::read_to_string(&path)?;
        let file: ProjectFile = serde_json::from_str(&raw)?;
        if file.version != PROJECT_FORMAT_VERSION {
            return Err(StoreError::Format(format!(
                "version {} is not supported",
                file.version
            )));
        }
        let salt = base64::engine::general_purpose::STANDARD
            .decode(&file.kdf_salt)
            .map_err(|e| StoreError::Format(format!("invalid salt encoding: {e}")))?;
        let params = KdfParams {
            m_cost: file.kdf.m_cost,
            t_cost: file.kdf.t_cost,
            p_cost: file.kdf.p_cost,
        };
        let kek = derive_key_with_params(self.passphrase.as_bytes(), &salt, params)
            .map_err(|e| StoreError::Crypto(e.to_string()))?;
        let dek = decrypt_with_key(&kek, &file.wrapped_key)
            .map_err(|_| StoreError::Decrypt(project.to_string()))?;
        let dek: Zeroizing<[u8; KEY_LEN]> = Zeroizing::new(
            dek.as_slice()
                .try_into()
                .map_err(|_| StoreError::Format("invalid wrapped key length".into()))?,
        );
        let plaintext = decrypt_with_key(&dek, &file.document)
            .map_err(|_| StoreError::Decrypt(project.to_string()))?;
        Ok(serde_json::from_slice(&plaintext)?)
    }

    fn save(&self, project: &str, doc: &ProjectDocument) -> Result<(), StoreError> {
        let path = self.project_path(project)?;
        let salt = random_bytes::<KDF_SALT_LEN>();
        let kek = derive_key_with_params(self.passphrase.as_bytes(), &salt, self.params)
            .map_err(|e| StoreError::Crypto(e.to_string()))?;
        let dek = Zeroizing::new(random_bytes::<KEY_LEN>());

        let wrapped_key =
            encrypt_with_key(&kek, &dek[..]).map_err(|e| StoreError::Crypto(e.to_string()))?;
        let plaintext = Zeroizing::new(serde_json::to_vec(doc)?);
        let document =
            encrypt_with_key(&dek, &plaintext).map_err(|e| StoreError::Crypto(e.to_string()))?;
        let file = ProjectFile {
            version: PROJECT_FORMAT_VERSION,
            kdf: KdfHeader {
                m_cost: self.params.m_cost,
                t_cost: self.params.t_cost,
                p_cost: self.params.p_cost,
            },
            kdf_salt: base64::engine::general_purpose::STANDARD.encode(salt),
            wrapped_key,
            document,
        };
        let serialized = serde_json::to_string_pretty(&file)?;
        atomic_write(&path, serialized.as_bytes())?;
        debug!(project, revision = doc.revision, "project file written");
        Ok(())
    }

    fn update<T>(
        &self,
        project: &str,
        apply: impl FnOnce(&mut ProjectDocument) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _held = self.guard();
        let mut doc = self.load(project)?;
        let out = apply(&mut doc)?;
        doc.revision += 1;
        self.save(project, &doc)?;
        Ok(out)
    }
}

fn default_actor() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "user".to_string());
    format!("{user}@local")
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn find<'a>(doc: &'a ProjectDocument, name: &str) -> Result<&'a StoredSecret, StoreError> {
    doc.secrets
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| StoreError::NotFound(name.to_string()))
}

fn resolve<'a>(secret: &'a StoredSecret, version: &str) -> Result<&'a StoredVersion, StoreError> {
    let not_found = || StoreError::VersionNotFound {
        secret: secret.name.clone(),
        version: version.to_string(),
    };
    if version == LATEST {
        return secret
            .versions
            .iter()
            .filter(|v| v.state == VersionState::Enabled)
            .max_by_key(|v| v.id)
            .ok_or_else(not_found);
    }
    let id: u32 = version.parse().map_err(|_| not_found())?;
    let found = secret.versions.iter().find(|v| v.id == id).ok_or_else(not_found)?;
    if found.state != VersionState::Enabled {
        return Err(StoreError::VersionUnavailable {
            secret: secret.name.clone(),
            version: version.to_string(),
            state: found.state.label(),
        });
    }
    Ok(found)
}

impl SecretStore for LocalStore {
    fn connect(&self, project: &str) -> Result<String, StoreError> {
        let _held = self.guard();
        self.load(project)?;
        Ok(self.actor.clone())
    }

    fn list_secrets(&self, project: &str) -> Result<Vec<Secret>, StoreError> {
        let _held = self.guard();
        let doc = self.load(project)?;
        let mut secrets: Vec<Secret> = doc.secrets.iter().map(StoredSecret::summary).collect();
        secrets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(secrets)
    }

    fn list_versions(&self, project: &str, secret: &str) -> Result<Vec<SecretVersion>, StoreError> {
        let _held = self.guard();
        let doc = self.load(project)?;
        let stored = find(&doc, secret)?;
        let mut versions: Vec<&StoredVersion> = stored.versions.iter().collect();
        versions.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(versions.into_iter().map(StoredVersion::summary).collect())
    }

    fn access_version(
        &self,
        project: &str,
        secret: &str,
        version: &str,
    ) -> Result<Zeroizing<Vec<u8>>, StoreError> {
        let _held = self.guard();
        let doc = self.load(project)?;
        let stored = resolve(find(&doc, secret)?, version)?;
        base64::engine::general_purpose::STANDARD
            .decode(&stored.payload)
            .map(Zeroizing::new)
            .map_err(|e| StoreError::Format(format!("invalid payload encoding: {e}")))
    }

    fn create_secret(&self, project: &str, name: &str, location: Option<&str>) -> Result<(), StoreError> {
        validate_secret_name(name)?;
        let replication = match location.map(str::trim).filter(|l| !l.is_empty()) {
            Some(region) => format!("user-managed ({region})"),
            None => "automatic".to_string(),
        };
        self.update(project, |doc| {
            if doc.secrets.iter().any(|s| s.name == name) {
                return Err(StoreError::AlreadyExists(name.to_string()));
            }
            doc.secrets.push(StoredSecret {
                name: name.to_string(),
                create_time: now_rfc3339(),
                replication,
                labels: Default::default(),
                versions: Vec::new(),
            });
            Ok(())
        })
    }

    fn add_version(&self, project: &str, secret: &str, payload: &[u8]) -> Result<SecretVersion, StoreError> {
        self.update(project, |doc| {
            let stored = doc
                .secrets
                .iter_mut()
                .find(|s| s.name == secret)
                .ok_or_else(|| StoreError::NotFound(secret.to_string()))?;
            let id = stored.versions.iter().map(|v| v.id).max().unwrap_or(0) + 1;
            let version = StoredVersion {
                id,
                state: VersionState::Enabled,
                create_time: now_rfc3339(),
                payload: base64::engine::general_purpose::STANDARD.encode(payload),
            };
            let summary = version.summary();
            stored.versions.push(version);
            Ok(summary)
        })
    }

    fn delete_secret(&self, project: &str, secret: &str) -> Result<(), StoreError> {
        self.update(project, |doc| {
            let before = doc.secrets.len();
            doc.secrets.retain(|s| s.name != secret);
            if doc.secrets.len() == before {
                return Err(StoreError::NotFound(secret.to_string()));
            }
            Ok(())
        })
    }
}
