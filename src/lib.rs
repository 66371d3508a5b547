//! In-memory user CRUD service over gRPC
//!
//! [`store`] holds users, [`service`] maps `users.Users` calls onto a store,
//! and [`server`] exposes that service on a TCP or Unix socket.

pub mod config;
pub mod error;
pub mod logging;
pub mod proto;
pub mod server;
pub mod service;
pub mod store;

pub use error::{Error, Result};
