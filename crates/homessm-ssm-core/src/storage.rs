//! Key/value storage backends for the parameter store.
//!
//! The store talks to storage through [`KvStore`], which hands out read and
//! write transactions over two fixed namespaces. [`RedbStore`] persists to a
//! single redb file; [`MemoryStore`] keeps everything in memory for tests.
//!
//! ```text
//! parameters:  "/app/db/password" -> JSON ParameterRecord
//! keys:        "5f0c…"            -> JSON KeyRecord
//! ```
//!
//! Keys within a namespace are kept in lexicographic order, and prefix scans
//! return entries in that order.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use redb::{Database, ReadableTable, TableDefinition};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The redb engine failed (I/O, corruption, transaction conflict).
    #[error("storage backend error: {0}")]
    Backend(#[from] redb::Error),
}

fn backend(e: impl Into<redb::Error>) -> StorageError {
    StorageError::Backend(e.into())
}

// ---------------------------------------------------------------------------
// Namespaces
// ---------------------------------------------------------------------------

/// The two disjoint key spaces of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Parameter records, keyed by normalized name.
    Parameters,
    /// Encryption key records, keyed by key id.
    Keys,
}

impl Namespace {
    /// Table name used by the redb backend.
    #[must_use]
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Parameters => "parameters",
            Self::Keys => "keys",
        }
    }
}

fn table_def(ns: Namespace) -> TableDefinition<'static, &'static str, &'static [u8]> {
    TableDefinition::new(ns.table_name())
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Read access inside a transaction.
pub trait ReadTxn {
    /// Fetch the value stored under `key`.
    fn get(&self, ns: Namespace, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// All entries whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, ns: Namespace, prefix: &str)
    -> Result<Vec<(String, Vec<u8>)>, StorageError>;
}

/// Write access inside a transaction. Dropping without [`WriteTxn::commit`]
/// discards every change.
pub trait WriteTxn: ReadTxn {
    /// Insert or replace the value under `key`.
    fn set(&mut self, ns: Namespace, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Remove `key`. Returns whether it existed.
    fn delete(&mut self, ns: Namespace, key: &str) -> Result<bool, StorageError>;

    /// Make the changes durable and visible.
    fn commit(self: Box<Self>) -> Result<(), StorageError>;
}

/// A transactional key/value backend.
pub trait KvStore: Send + Sync + fmt::Debug {
    /// Begin a read-only snapshot.
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, StorageError>;

    /// Begin a write transaction. Writers are serialized.
    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, StorageError>;
}

// ---------------------------------------------------------------------------
// redb backend
// ---------------------------------------------------------------------------

/// Durable backend over a single redb database file.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open (or create) the database at `path` and make sure both tables exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path).map_err(backend)?;

        let txn = db.begin_write().map_err(backend)?;
        {
            txn.open_table(table_def(Namespace::Parameters)).map_err(backend)?;
            txn.open_table(table_def(Namespace::Keys)).map_err(backend)?;
        }
        txn.commit().map_err(backend)?;

        tracing::debug!(path = %path.display(), "opened redb database");
        Ok(Self { db, path })
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_value<T>(table: &T, key: &str) -> Result<Option<Vec<u8>>, StorageError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let value = table.get(key).map_err(backend)?;
    Ok(value.map(|v| v.value().to_vec()))
}

fn scan_table<T>(table: &T, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut out = Vec::new();
    for entry in table.range(prefix..).map_err(backend)? {
        let (key, value) = entry.map_err(backend)?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        out.push((key.to_owned(), value.value().to_vec()));
    }
    Ok(out)
}

struct RedbReadTxn {
    txn: redb::ReadTransaction,
}

impl ReadTxn for RedbReadTxn {
    fn get(&self, ns: Namespace, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let table = self.txn.open_table(table_def(ns)).map_err(backend)?;
        read_value(&table, key)
    }

    fn scan_prefix(
        &self,
        ns: Namespace,
        prefix: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        let table = self.txn.open_table(table_def(ns)).map_err(backend)?;
        scan_table(&table, prefix)
    }
}

struct RedbWriteTxn {
    txn: redb::WriteTransaction,
}

impl ReadTxn for RedbWriteTxn {
    fn get(&self, ns: Namespace, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let table = self.txn.open_table(table_def(ns)).map_err(backend)?;
        read_value(&table, key)
    }

    fn scan_prefix(
        &self,
        ns: Namespace,
        prefix: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        let table = self.txn.open_table(table_def(ns)).map_err(backend)?;
        scan_table(&table, prefix)
    }
}

impl WriteTxn for RedbWriteTxn {
    fn set(&mut self, ns: Namespace, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut table = self.txn.open_table(table_def(ns)).map_err(backend)?;
        table.insert(key, value).map_err(backend)?;
        Ok(())
    }

    fn delete(&mut self, ns: Namespace, key: &str) -> Result<bool, StorageError> {
        let mut table = self.txn.open_table(table_def(ns)).map_err(backend)?;
        let removed = table.remove(key).map_err(backend)?.is_some();
        Ok(removed)
    }

    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let this = *self;
        this.txn.commit().map_err(backend)
    }
}

impl KvStore for RedbStore {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, StorageError> {
        let txn = self.db.begin_read().map_err(backend)?;
        Ok(Box::new(RedbReadTxn { txn }))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, StorageError> {
        let txn = self.db.begin_write().map_err(backend)?;
        Ok(Box::new(RedbWriteTxn { txn }))
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryTables {
    parameters: BTreeMap<String, Vec<u8>>,
    keys: BTreeMap<String, Vec<u8>>,
}

impl MemoryTables {
    fn table(&self, ns: Namespace) -> &BTreeMap<String, Vec<u8>> {
        match ns {
            Namespace::Parameters => &self.parameters,
            Namespace::Keys => &self.keys,
        }
    }

    fn table_mut(&mut self, ns: Namespace) -> &mut BTreeMap<String, Vec<u8>> {
        match ns {
            Namespace::Parameters => &mut self.parameters,
            Namespace::Keys => &mut self.keys,
        }
    }

    fn scan(&self, ns: Namespace, prefix: &str) -> Vec<(String, Vec<u8>)> {
        self.table(ns)
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Volatile backend. The lock is held for the whole life of a transaction.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<MemoryTables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

struct MemoryReadTxn<'a> {
    tables: RwLockReadGuard<'a, MemoryTables>,
}

impl ReadTxn for MemoryReadTxn<'_> {
    fn get(&self, ns: Namespace, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.tables.table(ns).get(key).cloned())
    }

    fn scan_prefix(
        &self,
        ns: Namespace,
        prefix: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        Ok(self.tables.scan(ns, prefix))
    }
}

/// Undo log entry: the key and what it held before the write.
type UndoEntry = (Namespace, String, Option<Vec<u8>>);

struct MemoryWriteTxn<'a> {
    tables: RwLockWriteGuard<'a, MemoryTables>,
    undo: Vec<UndoEntry>,
    committed: bool,
}

impl ReadTxn for MemoryWriteTxn<'_> {
    fn get(&self, ns: Namespace, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.tables.table(ns).get(key).cloned())
    }

    fn scan_prefix(
        &self,
        ns: Namespace,
        prefix: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        Ok(self.tables.scan(ns, prefix))
    }
}

impl WriteTxn for MemoryWriteTxn<'_> {
    fn set(&mut self, ns: Namespace, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let previous = self
            .tables
            .table_mut(ns)
            .insert(key.to_owned(), value.to_vec());
        self.undo.push((ns, key.to_owned(), previous));
        Ok(())
    }

    fn delete(&mut self, ns: Namespace, key: &str) -> Result<bool, StorageError> {
        let previous = self.tables.table_mut(ns).remove(key);
        let existed = previous.is_some();
        if existed {
            self.undo.push((ns, key.to_owned(), previous));
        }
        Ok(existed)
    }

    fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        self.committed = true;
        Ok(())
    }
}

impl Drop for MemoryWriteTxn<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        while let Some((ns, key, previous)) = self.undo.pop() {
            let table = self.tables.table_mut(ns);
            match previous {
                Some(value) => {
                    table.insert(key, value);
                }
                None => {
                    table.remove(&key);
                }
            }
        }
    }
}

impl KvStore for MemoryStore {
    fn begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, StorageError> {
        Ok(Box::new(MemoryReadTxn {
            tables: self.tables.read(),
        }))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, StorageError> {
        Ok(Box::new(MemoryWriteTxn {
            tables: self.tables.write(),
            undo: Vec::new(),
            committed: false,
        }))
    }
}
