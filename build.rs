//! Generates the `users.Users` gRPC server and client stubs.
//!
//! The message types are declared by hand in `src/proto/mod.rs` with
//! `prost::Message`, so only the service glue is generated here and no
//! `protoc` binary is required.

use tonic_build::manual::{Builder, Method, Service};

fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
  Method::builder()
    .name(name)
    .route_name(route)
    .input_type(format!("crate::proto::{}", input))
    .output_type(format!("crate::proto::{}", output))
    .codec_path("tonic::codec::ProstCodec")
    .build()
}

fn main() {
  let service = Service::builder()
    .name("Users")
    .package("users")
    .method(unary("create_user", "CreateUser", "CreateUserRequest", "CreateUserResponse"))
    .method(unary("get_user", "GetUser", "GetUserRequest", "GetUserResponse"))
    .method(unary("update_user", "UpdateUser", "UpdateUserRequest", "UpdateUserResponse"))
    .method(unary("delete_user", "DeleteUser", "DeleteUserRequest", "DeleteUserResponse"))
    .build();

  Builder::new().compile(&[service]);

  println!("cargo:rerun-if-changed=build.rs");
}
