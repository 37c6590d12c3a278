//! The parameter store engine.
//!
//! [`ParameterStore`] owns every persisted byte. Each public operation runs
//! inside exactly one backend transaction, and `SecureString` values are
//! sealed inside the same write transaction that persists them.
//!
//! Key material lives in [`Namespace::Keys`], which no parameter operation
//! can address. It is loaded once by [`ParameterStore::open`] and kept in
//! memory for the life of the store, since keys are never rotated.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use homessm_core::KeyConfig;
use homessm_ssm_model::types::{DataType, ParameterTier, ParameterType, Tag};

use crate::crypto::{self, CryptoError, EncryptionKey};
use crate::storage::{KvStore, Namespace, StorageError};

/// Alias of the generated key when no keys are configured.
pub const DEFAULT_KEY_ALIAS: &str = "homessm";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by the parameter store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No parameter with this name.
    #[error("parameter not found: {0}")]
    NotFound(String),

    /// Put without overwrite on an existing name.
    #[error("parameter already exists: {0}")]
    AlreadyExists(String),

    /// A key reference matched no stored key.
    #[error("unknown encryption key: {0}")]
    UnknownKey(String),

    /// Sealing or opening a value failed.
    #[error("crypto failure: {0}")]
    Crypto(#[from] CryptoError),

    /// A configured key is unusable.
    #[error("invalid key configuration: {0}")]
    KeyConfig(String),

    /// The backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A stored record does not deserialize.
    #[error("corrupt record '{key}': {source}")]
    Corrupt {
        /// Storage key of the record.
        key: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },

    /// A record could not be serialized.
    #[error("failed to encode record: {0}")]
    Encode(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A persisted parameter. `value` holds base64 ciphertext for `SecureString`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRecord {
    /// Normalized name, always starting with `/`.
    pub name: String,
    /// Plaintext, or base64 ciphertext for `SecureString`.
    pub value: String,
    /// Parameter type.
    #[serde(rename = "type")]
    pub parameter_type: ParameterType,
    /// Data type, `text` unless requested otherwise.
    #[serde(default)]
    pub data_type: DataType,
    /// Storage tier.
    #[serde(default)]
    pub tier: ParameterTier,
    /// Key reference the value was sealed with. `SecureString` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
    /// Starts at 1 and grows by one on each overwrite.
    pub version: i64,
    /// Epoch seconds.
    pub last_modified_date: f64,
    /// IAM user ARN of the last writer.
    pub last_modified_user: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Regex the value had to match when written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_pattern: Option<String>,
    /// Policies JSON, stored verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policies: Option<String>,
    /// Resource tags.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl ParameterRecord {
    /// Whether the stored value is ciphertext.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.parameter_type == ParameterType::SecureString
    }
}

/// A persisted encryption key.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct KeyRecord {
    id: String,
    alias: String,
    /// Base64 material.
    key: String,
}

/// An encryption key loaded in memory.
struct KeyEntry {
    id: String,
    alias: String,
    material: EncryptionKey,
}

impl fmt::Debug for KeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEntry")
            .field("id", &self.id)
            .field("alias", &self.alias)
            .field("material", &"[REDACTED]")
            .finish()
    }
}

/// A parsed `KeyId` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyRef<'a> {
    Alias(&'a str),
    Id(&'a str),
}

impl<'a> KeyRef<'a> {
    /// Accepts `alias/<a>`, a bare key id, or a KMS ARN ending in
    /// `:alias/<a>` or `:key/<id>`.
    fn parse(reference: &'a str) -> Option<Self> {
        if reference.starts_with("arn:") {
            let resource = reference.rsplit(':').next()?;
            if let Some(alias) = resource.strip_prefix("alias/") {
                return Some(Self::Alias(alias));
            }
            return resource.strip_prefix("key/").map(Self::Id);
        }
        match reference.strip_prefix("alias/") {
            Some(alias) => Some(Self::Alias(alias)),
            None => Some(Self::Id(reference)),
        }
    }
}

// ---------------------------------------------------------------------------
// Key filters
// ---------------------------------------------------------------------------

/// How a [`KeyFilter`] path is compared with a parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// The name equals the path.
    Exact,
    /// The name is the path or an immediate child of it.
    PrefixOneLevel,
    /// The name is a descendant of the path, at any depth.
    PrefixRecursive,
}

/// A name predicate evaluated during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFilter {
    /// Normalized name or path.
    pub path: String,
    /// How `path` is compared.
    pub mode: MatchMode,
}

impl KeyFilter {
    /// Create a filter.
    #[must_use]
    pub fn new(path: impl Into<String>, mode: MatchMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    /// Prefix that every descendant of the path carries.
    fn child_prefix(&self) -> String {
        format!("{}/", self.path.trim_end_matches('/'))
    }

    /// Whether `name` satisfies this filter.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self.mode {
            MatchMode::Exact => name == self.path,
            MatchMode::PrefixOneLevel => {
                name == self.path
                    || name
                        .strip_prefix(self.child_prefix().as_str())
                        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
            }
            MatchMode::PrefixRecursive => {
                let prefix = self.child_prefix();
                name.len() > prefix.len() && name.starts_with(&prefix)
            }
        }
    }

    /// The longest prefix every match starts with.
    fn scan_prefix(&self) -> &str {
        self.path.trim_end_matches('/')
    }
}

/// Longest common prefix of all filters, used to bound the range scan.
fn common_prefix(filters: &[KeyFilter]) -> String {
    let mut iter = filters.iter().map(KeyFilter::scan_prefix);
    let Some(first) = iter.next() else {
        return String::new();
    };
    let mut prefix = first;
    for next in iter {
        let shared = prefix
            .char_indices()
            .zip(next.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, c), _)| i + c.len_utf8());
        prefix = &prefix[..shared];
    }
    prefix.to_owned()
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Transactional, encrypted, versioned parameter storage.
pub struct ParameterStore {
    backend: Arc<dyn KvStore>,
    keys: Vec<KeyEntry>,
    default_alias: String,
}

impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("backend", &self.backend)
            .field("keys", &self.keys)
            .field("default_alias", &self.default_alias)
            .finish()
    }
}

fn decode_record<T: serde::de::DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|source| StoreError::Corrupt {
        key: key.to_owned(),
        source,
    })
}

fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(record).map_err(StoreError::Encode)
}

impl ParameterStore {
    /// Initialize the store over `backend`.
    ///
    /// In one write transaction: every configured key whose alias is not yet
    /// stored is persisted, and a key is generated for the default alias if
    /// none exists. The default alias is the first configured key's alias, or
    /// [`DEFAULT_KEY_ALIAS`] when no keys are configured.
    pub fn open(backend: Arc<dyn KvStore>, configured: &[KeyConfig]) -> Result<Self, StoreError> {
        let default_alias = configured
            .first()
            .map_or_else(|| DEFAULT_KEY_ALIAS.to_owned(), |k| k.alias.clone());

        let mut txn = backend.begin_write()?;
        let mut stored: Vec<KeyRecord> = txn
            .scan_prefix(Namespace::Keys, "")?
            .iter()
            .map(|(k, v)| decode_record(k, v))
            .collect::<Result<_, _>>()?;

        for cfg in configured {
            let material = EncryptionKey::from_base64(&cfg.key)
                .map_err(|e| StoreError::KeyConfig(format!("key '{}': {e}", cfg.alias)))?;

            if let Some(existing) = stored.iter().find(|k| k.alias == cfg.alias) {
                let existing_material = EncryptionKey::from_base64(&existing.key)?;
                if !existing_material.same_material(&material) {
                    warn!(
                        alias = %cfg.alias,
                        key_id = %existing.id,
                        "configured key material differs from the stored key, keeping the stored key"
                    );
                }
                continue;
            }

            let id = cfg
                .id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            if stored.iter().any(|k| k.id == id) {
                return Err(StoreError::KeyConfig(format!(
                    "key id '{id}' is already stored under another alias"
                )));
            }
            let record = KeyRecord {
                id,
                alias: cfg.alias.clone(),
                key: material.to_base64(),
            };
            txn.set(Namespace::Keys, &record.id, &encode_record(&record)?)?;
            info!(alias = %record.alias, key_id = %record.id, "stored configured encryption key");
            stored.push(record);
        }

        if !stored.iter().any(|k| k.alias == default_alias) {
            let record = KeyRecord {
                id: uuid::Uuid::new_v4().to_string(),
                alias: default_alias.clone(),
                key: EncryptionKey::generate().to_base64(),
            };
            txn.set(Namespace::Keys, &record.id, &encode_record(&record)?)?;
            info!(alias = %record.alias, key_id = %record.id, "generated default encryption key");
            stored.push(record);
        }

        txn.commit()?;

        let keys = stored
            .iter()
            .map(|record| {
                Ok(KeyEntry {
                    id: record.id.clone(),
                    alias: record.alias.clone(),
                    material: EncryptionKey::from_base64(&record.key)?,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        debug!(keys = keys.len(), default_alias = %default_alias, "parameter store ready");
        Ok(Self {
            backend,
            keys,
            default_alias,
        })
    }

    /// Alias used when a `SecureString` names no key.
    #[must_use]
    pub fn default_alias(&self) -> &str {
        &self.default_alias
    }

    /// `alias/<default>`, the reference recorded for parameters that name no key.
    #[must_use]
    pub fn default_key_ref(&self) -> String {
        format!("alias/{}", self.default_alias)
    }

    /// Aliases of every loaded key.
    pub fn key_aliases(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.alias.as_str())
    }

    fn resolve_key(&self, reference: &str) -> Result<&EncryptionKey, StoreError> {
        let reference = reference.trim();
        let parsed = if reference.is_empty() {
            Some(KeyRef::Alias(self.default_alias.as_str()))
        } else {
            KeyRef::parse(reference)
        };

        parsed
            .and_then(|parsed| {
                self.keys.iter().find(|k| match parsed {
                    KeyRef::Alias(alias) => k.alias == alias,
                    KeyRef::Id(id) => k.id == id,
                })
            })
            .map(|k| &k.material)
            .ok_or_else(|| StoreError::UnknownKey(reference.to_owned()))
    }

    /// Seal `plaintext` with the referenced key. Returns base64 ciphertext.
    pub fn encrypt(&self, plaintext: &str, key_ref: &str) -> Result<String, StoreError> {
        let key = self.resolve_key(key_ref)?;
        Ok(crypto::seal_string(key, plaintext)?)
    }

    /// Open base64 ciphertext with the referenced key.
    pub fn decrypt(&self, sealed: &str, key_ref: &str) -> Result<String, StoreError> {
        let key = self.resolve_key(key_ref)?;
        Ok(crypto::open_string(key, sealed)?)
    }

    /// Fetch a parameter by normalized name.
    pub fn get(&self, name: &str) -> Result<ParameterRecord, StoreError> {
        let txn = self.backend.begin_read()?;
        let bytes = txn
            .get(Namespace::Parameters, name)?
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))?;
        decode_record(name, &bytes)
    }

    /// Create or replace a parameter and return its new version.
    ///
    /// The version is 1 for a new name and the previous version plus one on
    /// overwrite. An overwrite keeps the existing tags when the new record
    /// carries none. `SecureString` values are sealed before they are written.
    pub fn put(&self, mut record: ParameterRecord, overwrite: bool) -> Result<i64, StoreError> {
        let mut txn = self.backend.begin_write()?;

        let current: Option<ParameterRecord> = txn
            .get(Namespace::Parameters, &record.name)?
            .map(|bytes| decode_record(&record.name, &bytes))
            .transpose()?;

        match current {
            Some(_) if !overwrite => return Err(StoreError::AlreadyExists(record.name)),
            Some(current) => {
                record.version = current.version + 1;
                if record.tags.is_empty() {
                    record.tags = current.tags;
                }
            }
            None => record.version = 1,
        }

        if record.is_secure() {
            let key_ref = record.key_id.clone().unwrap_or_default();
            record.value = self.encrypt(&record.value, &key_ref)?;
        }

        txn.set(Namespace::Parameters, &record.name, &encode_record(&record)?)?;
        txn.commit()?;

        debug!(name = %record.name, version = record.version, "stored parameter");
        Ok(record.version)
    }

    /// Remove a parameter.
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        let mut txn = self.backend.begin_write()?;
        if !txn.delete(Namespace::Parameters, name)? {
            return Err(StoreError::NotFound(name.to_owned()));
        }
        txn.commit()?;
        debug!(name, "deleted parameter");
        Ok(())
    }

    /// Every parameter matching any filter, in name order. An empty filter
    /// list matches every parameter.
    pub fn find_by_filters(&self, filters: &[KeyFilter]) -> Result<Vec<ParameterRecord>, StoreError> {
        let prefix = common_prefix(filters);
        let txn = self.backend.begin_read()?;
        txn.scan_prefix(Namespace::Parameters, &prefix)?
            .into_iter()
            .filter(|(name, _)| filters.is_empty() || filters.iter().any(|f| f.matches(name)))
            .map(|(name, bytes)| decode_record(&name, &bytes))
            .collect()
    }

    /// Read-modify-write of one parameter in a single transaction.
    ///
    /// The closure sees the stored record, ciphertext included. Version and
    /// value are restored afterwards so only metadata can change.
    pub fn update<F>(&self, name: &str, f: F) -> Result<ParameterRecord, StoreError>
    where
        F: FnOnce(&mut ParameterRecord),
    {
        let mut txn = self.backend.begin_write()?;
        let bytes = txn
            .get(Namespace::Parameters, name)?
            .ok_or_else(|| StoreError::NotFound(name.to_owned()))?;
        let mut record: ParameterRecord = decode_record(name, &bytes)?;

        let version = record.version;
        let value = record.value.clone();
        f(&mut record);
        record.version = version;
        record.value = value;
        record.name = name.to_owned();

        txn.set(Namespace::Parameters, name, &encode_record(&record)?)?;
        txn.commit()?;
        Ok(record)
    }
}
