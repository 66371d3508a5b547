//! gRPC handler for the `users.Users` service
//!
//! Every call has the same shape: take the user or id out of the request,
//! run it against [`Storage`], and either wrap the result in the response or
//! log the failure and answer with a mapped status code and a fixed message.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use tonic::{Code, Request, Response, Status};
use tracing::{Span, debug, error};

use crate::proto::users_server::Users;
use crate::proto::{
  CreateUserRequest, CreateUserResponse, DeleteUserRequest, DeleteUserResponse, GetUserRequest,
  GetUserResponse, UpdateUserRequest, UpdateUserResponse,
};
use crate::store::{Storage, StorageError};

/// Message sent to callers on any failure. Details only go to the log.
pub const REQUEST_FAILED: &str = "request failed";

/// Map a storage failure to the status code returned to the caller
pub fn status_code(err: &StorageError) -> Code {
  match err {
    StorageError::InvalidArgument => Code::InvalidArgument,
    StorageError::AlreadyExists => Code::AlreadyExists,
    StorageError::NotFound => Code::NotFound,
    StorageError::Internal(_) => Code::Internal,
  }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    format!("storage panicked: {}", s)
  } else if let Some(s) = payload.downcast_ref::<String>() {
    format!("storage panicked: {}", s)
  } else {
    "storage panicked".to_string()
  }
}

/// `users.Users` implementation backed by a [`Storage`]
#[derive(Clone)]
pub struct UsersService {
  span: Span,
  storage: Arc<dyn Storage>,
}

impl UsersService {
  /// Diagnostics are emitted as children of `span`.
  pub fn new(span: Span, storage: Arc<dyn Storage>) -> Self {
    Self { span, storage }
  }

  /// Run one storage operation, turning failures (and panics) into a status
  fn call<T>(
    &self,
    op: &'static str,
    f: impl FnOnce(&dyn Storage) -> Result<T, StorageError>,
  ) -> Result<T, Status> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| f(&*self.storage)))
      .unwrap_or_else(|payload| Err(StorageError::Internal(panic_message(payload))));

    match result {
      Ok(value) => {
        debug!(parent: &self.span, "storage.{}() succeeded", op);
        Ok(value)
      }
      Err(err) => {
        error!(parent: &self.span, "storage.{}() failed: {}", op, err);
        Err(Status::new(status_code(&err), REQUEST_FAILED))
      }
    }
  }
}

#[async_trait]
impl Users for UsersService {
  async fn create_user(
    &self,
    request: Request<CreateUserRequest>,
  ) -> Result<Response<CreateUserResponse>, Status> {
    let user = request.into_inner().user;
    let user = self.call("create", |storage| storage.create(user))?;
    Ok(Response::new(CreateUserResponse { user: Some(user) }))
  }

  async fn get_user(
    &self,
    request: Request<GetUserRequest>,
  ) -> Result<Response<GetUserResponse>, Status> {
    let id = request.into_inner().id;
    let user = self.call("get", |storage| storage.get(id))?;
    Ok(Response::new(GetUserResponse { user: Some(user) }))
  }

  async fn update_user(
    &self,
    request: Request<UpdateUserRequest>,
  ) -> Result<Response<UpdateUserResponse>, Status> {
    let user = request.into_inner().user;
    let user = self.call("update", |storage| storage.update(user))?;
    Ok(Response::new(UpdateUserResponse { user: Some(user) }))
  }

  async fn delete_user(
    &self,
    request: Request<DeleteUserRequest>,
  ) -> Result<Response<DeleteUserResponse>, Status> {
    let id = request.into_inner().id;
    // Look the user up first so a missing id reports NotFound from get
    self.call("delete", |storage| {
      storage.get(id)?;
      storage.delete(id)
    })?;
    Ok(Response::new(DeleteUserResponse {}))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::proto::User;
  use crate::store::MemoryStorage;
  use rand::Rng;
  use rand::distr::Alphanumeric;
  use std::io::Write;
  use std::sync::Mutex;
  use std::sync::atomic::{AtomicUsize, Ordering};

  fn service() -> UsersService {
    UsersService::new(Span::none(), Arc::new(MemoryStorage::new()))
  }

  async fn create(svc: &UsersService, user: Option<User>) -> Result<User, Status> {
    let resp = svc.create_user(Request::new(CreateUserRequest { user })).await?;
    Ok(resp.into_inner().user.unwrap())
  }

  async fn get(svc: &UsersService, id: u64) -> Result<User, Status> {
    let resp = svc.get_user(Request::new(GetUserRequest { id })).await?;
    Ok(resp.into_inner().user.unwrap())
  }

  async fn update(svc: &UsersService, user: Option<User>) -> Result<User, Status> {
    let resp = svc.update_user(Request::new(UpdateUserRequest { user })).await?;
    Ok(resp.into_inner().user.unwrap())
  }

  async fn delete(svc: &UsersService, id: u64) -> Result<(), Status> {
    svc.delete_user(Request::new(DeleteUserRequest { id })).await?;
    Ok(())
  }

  /// Storage whose every call fails with an internal error
  struct BrokenStorage;

  impl Storage for BrokenStorage {
    fn create(&self, _: Option<User>) -> Result<User, StorageError> {
      Err(StorageError::Internal("disk on fire".to_string()))
    }
    fn get(&self, _: u64) -> Result<User, StorageError> {
      Err(StorageError::Internal("disk on fire".to_string()))
    }
    fn update(&self, _: Option<User>) -> Result<User, StorageError> {
      Err(StorageError::Internal("disk on fire".to_string()))
    }
    fn delete(&self, _: u64) -> Result<(), StorageError> {
      Err(StorageError::Internal("disk on fire".to_string()))
    }
  }

  /// Storage that finds every user but panics on delete
  struct PanickingStorage;

  impl Storage for PanickingStorage {
    fn create(&self, _: Option<User>) -> Result<User, StorageError> {
      panic!("create exploded")
    }
    fn get(&self, id: u64) -> Result<User, StorageError> {
      Ok(User::new("a", "b").with_id(id))
    }
    fn update(&self, _: Option<User>) -> Result<User, StorageError> {
      panic!("update exploded")
    }
    fn delete(&self, _: u64) -> Result<(), StorageError> {
      panic!("delete exploded")
    }
  }

  /// Storage that knows no users and records whether delete was reached
  #[derive(Default)]
  struct EmptyStorage {
    deletes: AtomicUsize,
  }

  impl Storage for EmptyStorage {
    fn create(&self, _: Option<User>) -> Result<User, StorageError> {
      Err(StorageError::InvalidArgument)
    }
    fn get(&self, _: u64) -> Result<User, StorageError> {
      Err(StorageError::NotFound)
    }
    fn update(&self, _: Option<User>) -> Result<User, StorageError> {
      Err(StorageError::NotFound)
    }
    fn delete(&self, _: u64) -> Result<(), StorageError> {
      self.deletes.fetch_add(1, Ordering::SeqCst);
      Err(StorageError::Internal("delete reached".to_string()))
    }
  }

  #[derive(Clone, Default)]
  struct Captured(Arc<Mutex<Vec<u8>>>);

  impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
      self.0.lock().unwrap().extend_from_slice(buf);
      Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
      Ok(())
    }
  }

  impl Captured {
    fn contents(&self) -> String {
      String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
  }

  #[test]
  fn test_status_code_mapping() {
    assert_eq!(status_code(&StorageError::InvalidArgument), Code::InvalidArgument);
    assert_eq!(status_code(&StorageError::AlreadyExists), Code::AlreadyExists);
    assert_eq!(status_code(&StorageError::NotFound), Code::NotFound);
    assert_eq!(status_code(&StorageError::Internal("x".into())), Code::Internal);
  }

  #[tokio::test]
  async fn test_create_missing_user() {
    let svc = service();
    let status = create(&svc, None).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), REQUEST_FAILED);
  }

  #[tokio::test]
  async fn test_create_with_id() {
    let svc = service();
    let status = create(&svc, Some(User::default().with_id(100500))).await.unwrap_err();
    assert_eq!(status.code(), Code::AlreadyExists);
    assert_eq!(status.message(), REQUEST_FAILED);
  }

  #[tokio::test]
  async fn test_create_ids_increase() {
    let svc = service();
    let mut previous = 0;
    for _ in 0..5 {
      let user = create(&svc, Some(User::new("some name", "some last name"))).await.unwrap();
      assert!(user.id > previous);
      assert_eq!(user.first_name, "some name");
      assert_eq!(user.last_name, "some last name");
      previous = user.id;
    }
  }

  fn random_name(rng: &mut impl Rng) -> String {
    let len = rng.random_range(0..24);
    rng.sample_iter(&Alphanumeric).take(len).map(char::from).collect()
  }

  #[tokio::test]
  async fn test_create_then_get_random_names() {
    let svc = service();
    let mut rng = rand::rng();
    for _ in 0..50 {
      let first = random_name(&mut rng);
      let last = random_name(&mut rng);

      let created = create(&svc, Some(User::new(first.clone(), last.clone()))).await.unwrap();
      assert_eq!(created.first_name, first);
      assert_eq!(created.last_name, last);
      assert_eq!(get(&svc, created.id).await.unwrap(), created);
    }
  }

  #[tokio::test]
  async fn test_unknown_ids_not_found() {
    let svc = service();
    assert_eq!(get(&svc, 0).await.unwrap_err().code(), Code::NotFound);
    assert_eq!(get(&svc, 7).await.unwrap_err().code(), Code::NotFound);
    assert_eq!(update(&svc, Some(User::default())).await.unwrap_err().code(), Code::NotFound);
    assert_eq!(delete(&svc, 0).await.unwrap_err().code(), Code::NotFound);
  }

  #[tokio::test]
  async fn test_update_missing_user() {
    let svc = service();
    let status = update(&svc, None).await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
  }

  #[tokio::test]
  async fn test_full_lifecycle() {
    let svc = service();

    let created = create(&svc, Some(User::new("some name", "some last name"))).await.unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(get(&svc, 1).await.unwrap(), created);

    let replacement = User::new("x", "y").with_id(1);
    assert_eq!(update(&svc, Some(replacement.clone())).await.unwrap(), replacement);
    assert_eq!(get(&svc, 1).await.unwrap(), replacement);

    delete(&svc, 1).await.unwrap();
    assert_eq!(get(&svc, 1).await.unwrap_err().code(), Code::NotFound);
    assert_eq!(delete(&svc, 1).await.unwrap_err().code(), Code::NotFound);
  }

  #[tokio::test]
  async fn test_delete_checks_existence_first() {
    let storage = Arc::new(EmptyStorage::default());
    let svc = UsersService::new(Span::none(), storage.clone());

    let status = delete(&svc, 5).await.unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
    assert_eq!(status.message(), REQUEST_FAILED);
    assert_eq!(storage.deletes.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_unexpected_errors_are_internal() {
    let svc = UsersService::new(Span::none(), Arc::new(BrokenStorage));

    let status = create(&svc, Some(User::new("a", "b"))).await.unwrap_err();
    assert_eq!(status.code(), Code::Internal);
    assert_eq!(status.message(), REQUEST_FAILED);
    assert_eq!(get(&svc, 1).await.unwrap_err().code(), Code::Internal);
    assert_eq!(update(&svc, Some(User::default())).await.unwrap_err().code(), Code::Internal);
    // the existence check fails first, delete is never reached
    assert_eq!(delete(&svc, 1).await.unwrap_err().code(), Code::Internal);
  }

  #[tokio::test]
  async fn test_storage_panic_is_internal() {
    let svc = UsersService::new(Span::none(), Arc::new(PanickingStorage));

    assert_eq!(create(&svc, Some(User::new("a", "b"))).await.unwrap_err().code(), Code::Internal);
    assert_eq!(delete(&svc, 3).await.unwrap_err().code(), Code::Internal);
    // the service keeps working afterwards
    assert_eq!(get(&svc, 3).await.unwrap().id, 3);
  }

  #[tokio::test]
  async fn test_failure_detail_goes_to_log_only() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
      .with_writer(move || writer.clone())
      .with_ansi(false)
      .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let svc = UsersService::new(tracing::info_span!("users"), Arc::new(BrokenStorage));
    let status = get(&svc, 9).await.unwrap_err();

    assert!(!status.message().contains("disk on fire"));
    let logs = captured.contents();
    assert!(logs.contains("ERROR"));
    assert!(logs.contains("storage.get() failed: internal error: disk on fire"));
  }
}
