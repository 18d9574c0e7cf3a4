use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// A secret as listed by a store. Carries no payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub name: String,
    #[serde(default)]
    pub create_time: String,
    #[serde(default)]
    pub replication: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionState {
    Enabled,
    Disabled,
    Destroyed,
}

impl VersionState {
    pub fn label(self) -> &'static str {
        match self {
            VersionState::Enabled => "ENABLED",
            VersionState::Disabled => "DISABLED",
            VersionState::Destroyed => "DESTROYED",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SecretVersion {
    pub name: String,
    pub state: VersionState,
    pub create_time: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct EncryptedBlob {
    pub nonce: String,
    pub data: String,
}

/// Plaintext body of one project file, only ever held decrypted inside the store lock.
#[derive(Serialize, Deserialize, Default)]
pub struct ProjectDocument {
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub secrets: Vec<StoredSecret>,
}

#[derive(Serialize, Deserialize)]
pub struct StoredSecret {
    pub name: String,
    pub create_time: String,
    pub replication: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub versions: Vec<StoredVersion>,
}

#[derive(Serialize, Deserialize)]
pub struct StoredVersion {
    pub id: u32,
    pub state: VersionState,
    pub create_time: String,
    /// Base64 payload.
    pub payload: String,
}

impl Drop for StoredVersion {
    fn drop(&mut self) {
        self.payload.zeroize();
    }
}

impl StoredSecret {
    pub fn summary(&self) -> Secret {
        Secret {
            name: self.name.clone(),
            create_time: self.create_time.clone(),
            replication: self.replication.clone(),
            labels: self.labels.clone(),
        }
    }
}

impl StoredVersion {
    pub fn summary(&self) -> SecretVersion {
        SecretVersion {
            name: self.id.to_string(),
            state: self.state,
            create_time: self.create_time.clone(),
        }
    }
}
