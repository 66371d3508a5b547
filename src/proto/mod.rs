//! Wire types for the `users.Users` gRPC service
//!
//! Field numbers follow the protobuf contract of the service:
//!
//! ```text
//! message User { uint64 id = 1; string first_name = 2; string last_name = 3; }
//! message CreateUserRequest  { User user = 1; }
//! message CreateUserResponse { User user = 1; }
//! message GetUserRequest     { uint64 id = 1; }
//! message GetUserResponse    { User user = 1; }
//! message UpdateUserRequest  { User user = 1; }
//! message UpdateUserResponse { User user = 1; }
//! message DeleteUserRequest  { uint64 id = 1; }
//! message DeleteUserResponse { }
//! ```

/// A user record. An `id` of 0 means "not assigned yet".
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct User {
  #[prost(uint64, tag = "1")]
  pub id: u64,
  #[prost(string, tag = "2")]
  pub first_name: String,
  #[prost(string, tag = "3")]
  pub last_name: String,
}

impl User {
  /// Create an unsaved user (id 0)
  pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
    Self {
      id: 0,
      first_name: first_name.into(),
      last_name: last_name.into(),
    }
  }

  /// Same user with the given id
  pub fn with_id(mut self, id: u64) -> Self {
    self.id = id;
    self
  }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateUserRequest {
  #[prost(message, optional, tag = "1")]
  pub user: Option<User>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateUserResponse {
  #[prost(message, optional, tag = "1")]
  pub user: Option<User>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetUserRequest {
  #[prost(uint64, tag = "1")]
  pub id: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetUserResponse {
  #[prost(message, optional, tag = "1")]
  pub user: Option<User>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateUserRequest {
  #[prost(message, optional, tag = "1")]
  pub user: Option<User>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateUserResponse {
  #[prost(message, optional, tag = "1")]
  pub user: Option<User>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteUserRequest {
  #[prost(uint64, tag = "1")]
  pub id: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteUserResponse {}

include!(concat!(env!("OUT_DIR"), "/users.Users.rs"));
