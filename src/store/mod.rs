//! User storage
//!
//! [`Storage`] is the create/get/update/delete capability the gRPC handler
//! works against. [`memory::MemoryStorage`] is the in-process implementation.

pub mod memory;

use crate::proto::User;

pub use memory::MemoryStorage;

/// Storage failure kinds
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
  /// The caller passed no user, or one that fails a basic precondition
  #[error("invalid argument")]
  InvalidArgument,
  /// Create was called with a user that already carries an id
  #[error("already exists")]
  AlreadyExists,
  /// No user with the requested id
  #[error("not found")]
  NotFound,
  /// Anything else, e.g. a poisoned lock
  #[error("internal error: {0}")]
  Internal(String),
}

/// Create/get/update/delete over users keyed by id.
///
/// Implementations are shared between concurrently handled requests, and must
/// make each call atomic with respect to the others. Values passed in and
/// handed out are owned copies.
pub trait Storage: Send + Sync + 'static {
  /// Assign the next id to `user` and store it.
  ///
  /// `user` must be present and have id 0.
  fn create(&self, user: Option<User>) -> Result<User, StorageError>;

  /// Fetch the user with the given id
  fn get(&self, id: u64) -> Result<User, StorageError>;

  /// Replace the stored user addressed by `user.id`
  fn update(&self, user: Option<User>) -> Result<User, StorageError>;

  /// Remove the user with the given id
  fn delete(&self, id: u64) -> Result<(), StorageError>;
}
