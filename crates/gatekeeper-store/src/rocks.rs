//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use gatekeeper_core::UserId;
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::types::User;
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes read-check-write sequences that maintain the login index.
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Look up the user id that owns a login.
    fn login_owner(&self, login: &str) -> Result<Option<UserId>> {
        let cf = self.cf(cf::USERS_BY_LOGIN)?;
        self.db
            .get_cf(&cf, keys::login_key(login))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|bytes| {
                UserId::from_slice(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
            })
            .transpose()
    }

    /// Write a user record and its login index, dropping a stale index entry.
    fn write_user(&self, user: &User, previous_login: Option<&str>) -> Result<()> {
        let cf_users = self.cf(cf::USERS)?;
        let cf_by_login = self.cf(cf::USERS_BY_LOGIN)?;

        let user_key = keys::user_key(&user.user_id);
        let value = Self::serialize(user)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, &user_key, &value);
        if let Some(old) = previous_login {
            if old != user.login {
                batch.delete_cf(&cf_by_login, keys::login_key(old));
            }
        }
        batch.put_cf(&cf_by_login, keys::login_key(&user.login), &user_key);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

impl Store for RocksStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn insert_user(&self, user: &User) -> Result<()> {
        let _guard = self.write_lock.lock();

        if self.login_owner(&user.login)?.is_some() {
            return Err(StoreError::AlreadyExists(format!("login '{}'", user.login)));
        }
        if self.get_user(&user.user_id)?.is_some() {
            return Err(StoreError::AlreadyExists(format!("user {}", user.user_id)));
        }

        self.write_user(user, None)?;
        tracing::debug!(user_id = %user.user_id, login = %user.login, "User inserted");
        Ok(())
    }

    fn put_user(&self, user: &User) -> Result<()> {
        let _guard = self.write_lock.lock();

        if let Some(owner) = self.login_owner(&user.login)? {
            if owner != user.user_id {
                return Err(StoreError::AlreadyExists(format!("login '{}'", user.login)));
            }
        }
        let previous = self.get_user(&user.user_id)?.map(|u| u.login);

        self.write_user(user, previous.as_deref())
    }

    fn get_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let cf = self.cf(cf::USERS)?;
        let key = keys::user_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn get_user_by_login(&self, login: &str) -> Result<Option<User>> {
        match self.login_owner(login)? {
            Some(user_id) => self.get_user(&user_id),
            None => Ok(None),
        }
    }

    fn delete_user(&self, user_id: &UserId) -> Result<()> {
        let _guard = self.write_lock.lock();

        let cf_users = self.cf(cf::USERS)?;
        let cf_by_login = self.cf(cf::USERS_BY_LOGIN)?;

        let user = self.get_user(user_id)?.ok_or(StoreError::NotFound)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_users, keys::user_key(user_id));
        batch.delete_cf(&cf_by_login, keys::login_key(&user.login));

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let cf = self.cf(cf::USERS)?;

        let mut users = Vec::new();
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);

        for item in iter {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            let user: User = Self::deserialize(&value)?;
            users.push(user);
        }

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn create_test_user(login: &str) -> User {
        User {
            user_id: UserId::generate(),
            login: login.to_string(),
            password_hash: "$2b$04$not-a-real-hash".to_string(),
            properties: [("team".to_string(), "platform".to_string())].into(),
            scopes: vec!["orders.read".to_string()],
            created_at: chrono::Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn user_crud() {
        let (store, _dir) = create_test_store();
        let user = create_test_user("alice");

        // Create
        store.insert_user(&user).unwrap();

        // Read
        let retrieved = store.get_user(&user.user_id).unwrap().unwrap();
        assert_eq!(retrieved, user);
        let by_login = store.get_user_by_login("alice").unwrap().unwrap();
        assert_eq!(by_login.user_id, user.user_id);

        // Update
        let mut updated = user.clone();
        updated.scopes.push("billing.read".to_string());
        updated.updated_at = Some(chrono::Utc::now());
        store.put_user(&updated).unwrap();
        assert_eq!(
            store.get_user(&user.user_id).unwrap().unwrap().scopes.len(),
            2
        );

        // Delete
        store.delete_user(&user.user_id).unwrap();
        assert!(store.get_user(&user.user_id).unwrap().is_none());
        assert!(store.get_user_by_login("alice").unwrap().is_none());
    }

    #[test]
    fn insert_rejects_duplicate_login() {
        let (store, _dir) = create_test_store();
        store.insert_user(&create_test_user("alice")).unwrap();

        let result = store.insert_user(&create_test_user("alice"));
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
        assert_eq!(store.list_users().unwrap().len(), 1);
    }

    #[test]
    fn put_moves_login_index() {
        let (store, _dir) = create_test_store();
        let mut user = create_test_user("alice");
        store.insert_user(&user).unwrap();

        user.login = "alice2".to_string();
        store.put_user(&user).unwrap();

        assert!(store.get_user_by_login("alice").unwrap().is_none());
        assert_eq!(
            store.get_user_by_login("alice2").unwrap().unwrap().user_id,
            user.user_id
        );

        // The old login is free again.
        store.insert_user(&create_test_user("alice")).unwrap();
    }

    #[test]
    fn put_rejects_login_owned_by_another_user() {
        let (store, _dir) = create_test_store();
        store.insert_user(&create_test_user("alice")).unwrap();
        let mut bob = create_test_user("bob");
        store.insert_user(&bob).unwrap();

        bob.login = "alice".to_string();
        assert!(matches!(
            store.put_user(&bob),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn delete_missing_user() {
        let (store, _dir) = create_test_store();
        let result = store.delete_user(&UserId::generate());
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[test]
    fn list_users_returns_all() {
        let (store, _dir) = create_test_store();
        for login in ["a", "b", "c"] {
            store.insert_user(&create_test_user(login)).unwrap();
        }
        let mut logins: Vec<_> = store
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.login)
            .collect();
        logins.sort();
        assert_eq!(logins, vec!["a", "b", "c"]);
    }
}
