use std::collections::HashMap;
use std::sync::RwLock;

use crate::proto::User;
use crate::store::{Storage, StorageError};

#[derive(Default)]
struct Inner {
  users: HashMap<u64, User>,
  /// Last id handed out. Never decreases, ids are not reused after delete.
  last_id: u64,
}

/// In-memory user store
///
/// The map and the id counter share one lock, so create is a single atomic
/// "increment, insert" step.
pub struct MemoryStorage {
  inner: RwLock<Inner>,
}

fn poisoned<T>(_: T) -> StorageError {
  StorageError::Internal("lock poisoned".to_string())
}

impl MemoryStorage {
  /// Create a new empty store
  pub fn new() -> Self {
    Self {
      inner: RwLock::new(Inner::default()),
    }
  }

  /// Number of stored users
  pub fn len(&self) -> Result<usize, StorageError> {
    let inner = self.inner.read().map_err(poisoned)?;
    Ok(inner.users.len())
  }

  pub fn is_empty(&self) -> Result<bool, StorageError> {
    Ok(self.len()? == 0)
  }
}

impl Default for MemoryStorage {
  fn default() -> Self {
    Self::new()
  }
}

impl Storage for MemoryStorage {
  fn create(&self, user: Option<User>) -> Result<User, StorageError> {
    let mut user = user.ok_or(StorageError::InvalidArgument)?;
    if user.id != 0 {
      return Err(StorageError::AlreadyExists);
    }

    let mut inner = self.inner.write().map_err(poisoned)?;
    let id = inner
      .last_id
      .checked_add(1)
      .ok_or_else(|| StorageError::Internal("user id space exhausted".to_string()))?;
    inner.last_id = id;
    user.id = id;
    inner.users.insert(user.id, user.clone());
    Ok(user)
  }

  fn get(&self, id: u64) -> Result<User, StorageError> {
    let inner = self.inner.read().map_err(poisoned)?;
    inner.users.get(&id).cloned().ok_or(StorageError::NotFound)
  }

  fn update(&self, user: Option<User>) -> Result<User, StorageError> {
    let user = user.ok_or(StorageError::InvalidArgument)?;

    let mut inner = self.inner.write().map_err(poisoned)?;
    match inner.users.get_mut(&user.id) {
      Some(stored) => {
        *stored = user.clone();
        Ok(user)
      }
      None => Err(StorageError::NotFound),
    }
  }

  fn delete(&self, id: u64) -> Result<(), StorageError> {
    let mut inner = self.inner.write().map_err(poisoned)?;
    inner.users.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
  }
}
